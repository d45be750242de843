//! oneM2M protocol vocabulary.
//!
//! Static knowledge about the oneM2M HTTP binding (TS-0009): operations,
//! parameter names, which parameters become headers or query-string
//! fragments, and the numeric enumerations exchanged on the wire.
//!
//! ## Parameter Routing
//!
//! | Parameter kind       | Wire location              | Example            |
//! |----------------------|----------------------------|--------------------|
//! | Target (`to`)        | Request URI                | `http://cse/PN_CSE`|
//! | Operation (`op`)     | HTTP method                | `POST`             |
//! | Header-mapped        | `X-M2M-*` header           | `fr` → `X-M2M-Origin` |
//! | Query-string         | `?key=value&...`           | `rcn=2&fu=1`       |
//! | Content              | JSON body                  | `{"m2m:ae": {...}}`|
//!
//! ## Operations
//!
//! | Operation | HTTP method | Required parameters |
//! |-----------|-------------|---------------------|
//! | Create    | POST        | `to`, `fr`, `rqi`   |
//! | Retrieve  | GET         | -                   |
//! | Update    | PUT         | -                   |
//! | Delete    | DELETE      | -                   |
//! | Notify    | POST        | -                   |

pub mod catalog;
mod operation;
mod types;

pub use catalog::{HeaderTarget, CONTENT_TYPE_JSON};
pub use operation::Operation;
pub use types::{
    FilterUsage, NotificationEventType, ResourceType, ResponseStatusCode, ResultContent,
};
