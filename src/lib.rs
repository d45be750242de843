//! # oneM2M Client - HTTP Binding
//!
//! Client-side oneM2M (TS-0001/TS-0004/TS-0009) over HTTP: build request
//! primitives, send them to a CSE, decode the response primitives, and
//! correlate the asynchronous notifications the CSE sends back.
//!
//! ## Features
//!
//! - **Parameter resolution**: per-call arguments layered over instance defaults, fresh `rqi` per request
//! - **Protocol catalog**: parameter ↔ header tables, query-string parameters, numeric enumerations
//! - **Response primitives**: control headers validated, JSON content decoded
//! - **Notification listener**: axum server on its own thread, handlers keyed by subscription reference
//! - **CSE facade**: AE registration, discovery, content instances, subscriptions
//!
//! ## Protocol Overview
//!
//! ### Architecture
//!
//! ```text
//!        AE (this crate)                                   CSE
//!           |                                               |
//!           |--- POST /PN_CSE  (X-M2M-Origin, X-M2M-RI) --->|   create
//!           |<-- 201 (X-M2M-RSC: 2001, m2m:ae) -------------|
//!           |                                               |
//!           |--- POST /PN_CSE/cnt (m2m:sub, nu=...) ------->|   subscribe
//!           |<-- 201 (X-M2M-RSC: 2001) ---------------------|
//!           |                                               |
//!   listener|<-- POST /notify {"m2m:sgn": {"sur": ...}} ----|   notification
//!           |--- 200 (X-M2M-RSC: 2000) -------------------->|
//! ```
//!
//! ### Operations
//!
//! | Operation | HTTP method | Required parameters |
//! |-----------|-------------|---------------------|
//! | Create    | POST        | `to`, `fr`, `rqi`   |
//! | Retrieve  | GET         |                     |
//! | Update    | PUT         |                     |
//! | Delete    | DELETE      |                     |
//! | Notify    | POST        |                     |
//!
//! ## Quick Start
//!
//! ### Raw Request Primitive
//!
//! ```rust,ignore
//! use onem2m::{HttpTransport, OneM2MRequest, ParameterSet};
//!
//! let request = OneM2MRequest::with_transport(HttpTransport::with_default_timeout()?);
//! let params = ParameterSet::new().with("fr", "C1234").with("rcn", 2).with("fu", 1);
//! let response = request.retrieve(Some("http://localhost:8100/PN_CSE"), Some(params))?;
//! println!("{} {:?}", response.rsc, response.pc);
//! ```
//!
//! ### CSE Facade
//!
//! ```rust,ignore
//! use onem2m::{AeBuilder, Cse, Config};
//!
//! let config = Config::load(None)?;
//! let mut cse = Cse::connect(config.cse, config.client.timeout())?;
//!
//! let ae = AeBuilder::new("N_SB_AE_1", "C1234")
//!     .app_name("N_SB_AE_1")
//!     .point_of_access("http://localhost:8080/notify")
//!     .build()?;
//! let response = cse.register_ae(&ae)?;
//! assert!(response.is_created());
//!
//! for uri in cse.discover_containers()? {
//!     println!("{uri}");
//! }
//! ```
//!
//! ### Notifications
//!
//! ```rust,ignore
//! use onem2m::{Callback, ListenerSupervisor, NotificationReply};
//!
//! let supervisor = ListenerSupervisor::new();
//! let listener = supervisor.get_or_init(&config.listener);
//! listener.register("/PN_CSE/cnt1/sub1", |cb| {
//!     if let Callback::Notification(n) = cb {
//!         println!("{:?}", n.representation());
//!     }
//!     Ok(NotificationReply::ok())
//! });
//! listener.start_and_wait()?;
//! ```
//!
//! ## Modules
//!
//! - [`primitive`]: Parameter sets, resolution, request and response primitives
//! - [`protocol`]: Operations, parameter/header catalog, enumerations
//! - [`resource`]: AE, container, content instance, subscription
//! - [`transport`]: Outbound `Transport` trait and inbound TCP serving
//! - [`listener`]: Notification correlation
//! - [`cse`]: CSE facade
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod config;
pub mod cse;
pub mod error;
pub mod listener;
pub mod primitive;
pub mod protocol;
pub mod resource;
pub mod transport;

// Re-exports for convenience
pub use config::{ClientConfig, Config, CseConfig, ListenerConfig};
pub use cse::Cse;
pub use error::{OneM2MError, Result};
pub use listener::{
    Callback, HandlerRegistry, ListenerState, ListenerSupervisor, Notification,
    NotificationListener, NotificationReply,
};
pub use primitive::{OneM2MRequest, OneM2MResponse, ParameterResolver, ParameterSet};
pub use protocol::{
    FilterUsage, NotificationEventType, Operation, ResourceType, ResponseStatusCode,
    ResultContent,
};
pub use resource::{AeBuilder, Resource, ResourceKind, SubscriptionBuilder};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// oneM2M release the catalog follows
pub const ONEM2M_RELEASE: &str = "2a";
