//! Application Entity (`m2m:ae`).

use serde_json::{Map, Value};

use super::{Resource, ResourceKind, ATTR_LABELS};
use crate::error::Result;

/// App-ID attribute
pub const ATTR_APP_ID: &str = "api";
/// AE-ID attribute
pub const ATTR_AE_ID: &str = "aei";
/// App name attribute
pub const ATTR_APP_NAME: &str = "apn";
/// Point-of-access attribute
pub const ATTR_POINT_OF_ACCESS: &str = "poa";
/// Request reachability attribute
pub const ATTR_REQUEST_REACHABILITY: &str = "rr";

/// Builder for AE registration content.
#[derive(Debug, Clone, Default)]
pub struct AeBuilder {
    attributes: Map<String, Value>,
}

impl AeBuilder {
    /// Start an AE with its App-ID and AE-ID
    pub fn new(app_id: impl Into<String>, ae_id: impl Into<String>) -> Self {
        let mut attributes = Map::new();
        attributes.insert(ATTR_APP_ID.to_string(), Value::String(app_id.into()));
        attributes.insert(ATTR_AE_ID.to_string(), Value::String(ae_id.into()));
        Self { attributes }
    }

    /// App name (`apn`)
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.attributes
            .insert(ATTR_APP_NAME.to_string(), Value::String(name.into()));
        self
    }

    /// Add a point of access URI (`poa`)
    pub fn point_of_access(mut self, uri: impl Into<String>) -> Self {
        let poa = self
            .attributes
            .entry(ATTR_POINT_OF_ACCESS)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = poa {
            list.push(Value::String(uri.into()));
        }
        self
    }

    /// Request reachability (`rr`)
    pub fn request_reachability(mut self, reachable: bool) -> Self {
        self.attributes
            .insert(ATTR_REQUEST_REACHABILITY.to_string(), Value::Bool(reachable));
        self
    }

    /// Add a label (`lbl`)
    pub fn label(mut self, label: impl Into<String>) -> Self {
        let labels = self
            .attributes
            .entry(ATTR_LABELS)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = labels {
            list.push(Value::String(label.into()));
        }
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<Resource> {
        Resource::new(ResourceKind::Ae, self.attributes)
    }
}

impl Resource {
    /// AE-ID (`aei`) of an AE resource
    pub fn ae_id(&self) -> Option<&str> {
        self.get_str(ATTR_AE_ID)
    }

    /// App-ID (`api`)
    pub fn app_id(&self) -> Option<&str> {
        self.get_str(ATTR_APP_ID)
    }
}
