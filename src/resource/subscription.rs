//! Subscription (`m2m:sub`).
//!
//! ```text
//! {"m2m:sub": {"enc": {"net": [3], "ty": 4}, "nct": 1, "nu": ["http://host:8080"]}}
//! ```

use serde_json::{json, Map, Value};

use super::{Resource, ResourceKind, ATTR_RESOURCE_NAME};
use crate::protocol::{NotificationEventType, ResourceType};

/// Event notification criteria attribute
pub const ATTR_EVENT_NOTIFICATION_CRITERIA: &str = "enc";
/// Notification URI attribute
pub const ATTR_NOTIFICATION_URI: &str = "nu";
/// Notification content type attribute
pub const ATTR_NOTIFICATION_CONTENT_TYPE: &str = "nct";

/// Builder for subscription content.
///
/// Defaults: event type `CreateOfDirectChildResource`, filtered to content instances,
/// notification content type 1 (all attributes).
#[derive(Debug, Clone)]
pub struct SubscriptionBuilder {
    name: Option<String>,
    event_types: Vec<NotificationEventType>,
    filter_type: ResourceType,
    notification_uris: Vec<String>,
    content_type: i64,
}

impl Default for SubscriptionBuilder {
    fn default() -> Self {
        Self {
            name: None,
            event_types: vec![NotificationEventType::CreateOfDirectChildResource],
            filter_type: ResourceType::ContentInstance,
            notification_uris: Vec::new(),
            content_type: 1,
        }
    }
}

impl SubscriptionBuilder {
    /// Builder for child-creation notifications on content instances
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource name (`rn`)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the notification event types (`enc.net`). An empty list keeps the default.
    pub fn event_types(mut self, types: impl IntoIterator<Item = NotificationEventType>) -> Self {
        let types: Vec<_> = types.into_iter().collect();
        if !types.is_empty() {
            self.event_types = types;
        }
        self
    }

    /// Resource type the criteria filter on (`enc.ty`)
    pub fn filter_type(mut self, ty: ResourceType) -> Self {
        self.filter_type = ty;
        self
    }

    /// Add a notification URI (`nu`)
    pub fn notification_uri(mut self, uri: impl Into<String>) -> Self {
        self.notification_uris.push(uri.into());
        self
    }

    /// Notification content type (`nct`)
    pub fn content_type(mut self, nct: i64) -> Self {
        self.content_type = nct;
        self
    }

    /// Assemble the `m2m:sub` resource
    pub fn build(self) -> Resource {
        let mut attributes = Map::new();
        if let Some(name) = self.name {
            attributes.insert(ATTR_RESOURCE_NAME.to_string(), Value::String(name));
        }
        let net: Vec<Value> = self.event_types.into_iter().map(Value::from).collect();
        attributes.insert(
            ATTR_EVENT_NOTIFICATION_CRITERIA.to_string(),
            json!({"net": net, "ty": self.filter_type.value()}),
        );
        attributes.insert(
            ATTR_NOTIFICATION_CONTENT_TYPE.to_string(),
            Value::from(self.content_type),
        );
        if !self.notification_uris.is_empty() {
            attributes.insert(
                ATTR_NOTIFICATION_URI.to_string(),
                Value::from(self.notification_uris),
            );
        }
        Resource {
            kind: ResourceKind::Subscription,
            attributes,
        }
    }
}
