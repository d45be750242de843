//! oneM2M request and response primitives.
//!
//! A request goes through four stages, each failing fast before the network
//! is touched:
//!
//! ```text
//! ParameterSet ──► ParameterResolver ──► validate ──► headers/query ──► Transport
//!                  (defaults, rqi, to)   (per op)     (catalog)          │
//!                                                                        ▼
//!                                      OneM2MResponse ◄── control headers + body
//! ```
//!
//! # Example
//!
//! ```ignore
//! use onem2m::{HttpTransport, OneM2MRequest, ParameterSet};
//!
//! let request = OneM2MRequest::new(
//!     Some("http://localhost:8100/PN_CSE".into()),
//!     ParameterSet::new().with("fr", "C1234"),
//!     HttpTransport::with_default_timeout()?,
//! );
//! let response = request.retrieve(None, None)?;
//! assert!(response.is_ok());
//! ```

pub mod params;
mod request;
mod resolver;
mod response;

pub use params::{render_value, ParameterSet};
pub use request::{map_params_to_headers, validate_required_params, OneM2MRequest};
pub use resolver::{apply_query_string, generate_rqi, ParameterResolver, Resolved};
pub use response::OneM2MResponse;
