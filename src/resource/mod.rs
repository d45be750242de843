//! oneM2M resource representations.
//!
//! A [`Resource`] keeps protocol metadata (its [`ResourceKind`]: short name,
//! resource type, required attributes) apart from the wire attributes, which
//! live in an ordered JSON map. On the wire a resource is always wrapped in
//! its short name:
//!
//! ```text
//! {"m2m:ae": {"api": "N_SB_AE_1", "apn": "N_SB_AE_1", "poa": ["http://localhost:7000"]}}
//! ```
//!
//! Construction validates that every required attribute of the kind is
//! present; nothing else about the attribute schema is checked.

mod ae;
mod content_instance;
mod subscription;

pub use ae::{AeBuilder, ATTR_AE_ID, ATTR_APP_ID, ATTR_APP_NAME, ATTR_POINT_OF_ACCESS};
pub use content_instance::{ATTR_CONTENT, ATTR_CONTENT_INFO, ATTR_MAX_INSTANCES};
pub use subscription::{
    SubscriptionBuilder, ATTR_EVENT_NOTIFICATION_CRITERIA, ATTR_NOTIFICATION_CONTENT_TYPE,
    ATTR_NOTIFICATION_URI,
};

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{OneM2MError, Result};
use crate::primitive::params::json_type_name;
use crate::protocol::ResourceType;

/// Resource identifier attribute
pub const ATTR_RESOURCE_ID: &str = "ri";
/// Resource name attribute
pub const ATTR_RESOURCE_NAME: &str = "rn";
/// Parent identifier attribute
pub const ATTR_PARENT_ID: &str = "pi";
/// Labels attribute
pub const ATTR_LABELS: &str = "lbl";

/// The resource kinds this client builds and parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Application Entity
    Ae,
    /// Container
    Container,
    /// Content instance
    ContentInstance,
    /// Subscription
    Subscription,
}

impl ResourceKind {
    /// Wire-level wrapper key
    pub fn short_name(&self) -> &'static str {
        match self {
            ResourceKind::Ae => "m2m:ae",
            ResourceKind::Container => "m2m:cnt",
            ResourceKind::ContentInstance => "m2m:cin",
            ResourceKind::Subscription => "m2m:sub",
        }
    }

    /// Numeric resource type (`ty`)
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceKind::Ae => ResourceType::Ae,
            ResourceKind::Container => ResourceType::Container,
            ResourceKind::ContentInstance => ResourceType::ContentInstance,
            ResourceKind::Subscription => ResourceType::Subscription,
        }
    }

    /// Attributes that must be present at construction
    pub fn required_attributes(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Ae => &[ATTR_APP_ID, ATTR_AE_ID, ATTR_POINT_OF_ACCESS],
            ResourceKind::ContentInstance => &[ATTR_CONTENT],
            ResourceKind::Container | ResourceKind::Subscription => &[],
        }
    }

    /// Short name without the `m2m:` namespace, as some CSEs emit it
    pub fn bare_name(&self) -> &'static str {
        let name = self.short_name();
        name.strip_prefix("m2m:").unwrap_or(name)
    }

    /// Kind for a wire short name, namespaced or bare
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name.strip_prefix("m2m:").unwrap_or(name) {
            "ae" => Some(ResourceKind::Ae),
            "cnt" => Some(ResourceKind::Container),
            "cin" => Some(ResourceKind::ContentInstance),
            "sub" => Some(ResourceKind::Subscription),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A single resource instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    kind: ResourceKind,
    attributes: Map<String, Value>,
}

impl Resource {
    /// Create a resource, validating required attributes.
    pub fn new(kind: ResourceKind, attributes: Map<String, Value>) -> Result<Self> {
        for attr in kind.required_attributes() {
            if !attributes.contains_key(*attr) {
                return Err(OneM2MError::MissingRequiredAttribute {
                    resource: kind.short_name(),
                    attribute: (*attr).to_string(),
                });
            }
        }
        Ok(Self { kind, attributes })
    }

    /// Create from a JSON object, either bare attributes or wrapped in the short name.
    pub fn from_value(kind: ResourceKind, value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(OneM2MError::InvalidArgument(format!(
                "{} expects a JSON object, {} received",
                kind.short_name(),
                json_type_name(&value)
            )));
        };

        let wrapper = [kind.short_name(), kind.bare_name()]
            .into_iter()
            .find(|key| map.len() == 1 && map.get(*key).is_some_and(Value::is_object));
        let attributes = match wrapper.and_then(|key| map.shift_remove(key)) {
            Some(Value::Object(inner)) => inner,
            _ => map,
        };
        Self::new(kind, attributes)
    }

    /// Parse from JSON text, wrapped or bare.
    pub fn from_json(kind: ResourceKind, json: &str) -> Result<Self> {
        Self::from_value(kind, serde_json::from_str(json)?)
    }

    /// Resource kind
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Wire short name
    pub fn short_name(&self) -> &'static str {
        self.kind.short_name()
    }

    /// Numeric resource type
    pub fn resource_type(&self) -> ResourceType {
        self.kind.resource_type()
    }

    /// Wire attributes
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Attribute value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Attribute value as a string
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Set an attribute
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Copy of this resource without `name`
    pub fn without(&self, name: &str) -> Self {
        let mut copy = self.clone();
        copy.attributes.shift_remove(name);
        copy
    }

    /// Resource identifier (`ri`)
    pub fn resource_id(&self) -> Option<&str> {
        self.get_str(ATTR_RESOURCE_ID)
    }

    /// Resource name (`rn`)
    pub fn resource_name(&self) -> Option<&str> {
        self.get_str(ATTR_RESOURCE_NAME)
    }

    /// Set the resource name (`rn`)
    pub fn set_name(&mut self, name: &str) {
        self.set(ATTR_RESOURCE_NAME, name);
    }

    /// Request body: `{short_name: attributes}`
    pub fn to_body(&self) -> Value {
        let mut wrapper = Map::new();
        wrapper.insert(
            self.short_name().to_string(),
            Value::Object(self.attributes.clone()),
        );
        Value::Object(wrapper)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_body())
    }
}
