//! oneM2M operations and their HTTP method mapping.

use std::fmt;
use std::str::FromStr;

use http::Method;
use serde::{Deserialize, Serialize};

use super::catalog::{PARAM_FROM, PARAM_REQUEST_IDENTIFIER, PARAM_TO};

/// oneM2M request operation (TS-0004 Table 6.4.1-1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Create a resource
    Create,
    /// Retrieve a resource
    Retrieve,
    /// Update a resource
    Update,
    /// Delete a resource
    Delete,
    /// Deliver a notification
    Notify,
}

impl Operation {
    /// Every operation, in protocol order.
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::Retrieve,
        Operation::Update,
        Operation::Delete,
        Operation::Notify,
    ];

    /// HTTP method carrying this operation (TS-0009 6.2.1)
    pub fn http_method(&self) -> Method {
        match self {
            Operation::Create | Operation::Notify => Method::POST,
            Operation::Retrieve => Method::GET,
            Operation::Update => Method::PUT,
            Operation::Delete => Method::DELETE,
        }
    }

    /// Parameters that must be present, after resolution, for this operation.
    ///
    /// Only the HTTP-mapped parameters are enforced here. `op` is implied by
    /// the method being called and is never required.
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Operation::Create => &[PARAM_TO, PARAM_FROM, PARAM_REQUEST_IDENTIFIER],
            Operation::Retrieve | Operation::Update | Operation::Delete | Operation::Notify => &[],
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create => "Create",
            Operation::Retrieve => "Retrieve",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
            Operation::Notify => "Notify",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Operation::Create),
            "retrieve" => Ok(Operation::Retrieve),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            "notify" => Ok(Operation::Notify),
            _ => Err(format!("Unknown oneM2M operation: {s}")),
        }
    }
}
