//! Container (`m2m:cnt`) and content instance (`m2m:cin`) helpers.

use serde_json::{Map, Value};

use super::{Resource, ResourceKind, ATTR_RESOURCE_NAME};
use crate::error::Result;

/// Content attribute of a content instance
pub const ATTR_CONTENT: &str = "con";
/// Content info (media type) attribute
pub const ATTR_CONTENT_INFO: &str = "cnf";
/// Maximum number of instances attribute of a container
pub const ATTR_MAX_INSTANCES: &str = "mni";

impl Resource {
    /// A content instance carrying `content`
    pub fn content_instance(content: impl Into<Value>) -> Result<Self> {
        let mut attributes = Map::new();
        attributes.insert(ATTR_CONTENT.to_string(), content.into());
        Resource::new(ResourceKind::ContentInstance, attributes)
    }

    /// A container, optionally named
    pub fn container(name: Option<&str>) -> Self {
        let mut attributes = Map::new();
        if let Some(name) = name {
            attributes.insert(ATTR_RESOURCE_NAME.to_string(), Value::String(name.to_string()));
        }
        // Containers have no required attributes.
        Self {
            kind: ResourceKind::Container,
            attributes,
        }
    }

    /// Content (`con`) of a content instance
    pub fn content(&self) -> Option<&Value> {
        self.get(ATTR_CONTENT)
    }

    /// Content info (`cnf`), e.g. `application/json:0`
    pub fn content_info(&self) -> Option<&str> {
        self.get_str(ATTR_CONTENT_INFO)
    }

    /// Instance cap (`mni`) of a container
    pub fn max_instances(&self) -> Option<u64> {
        self.get(ATTR_MAX_INSTANCES).and_then(Value::as_u64)
    }
}
