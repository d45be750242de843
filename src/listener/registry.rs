//! Correlation-id → handler registry.

use std::fmt::Display;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OneM2MError, Result};
use crate::primitive::OneM2MResponse;
use crate::protocol::{NotificationEventType, ResponseStatusCode};

/// Wrapper key of a signal notification body
pub const NOTIFICATION_SHORT_NAME: &str = "m2m:sgn";

/// Signal notification (`m2m:sgn`) sent by a CSE to a notification URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Subscription reference; the correlation id handlers are registered under
    pub sur: String,
    /// Notification event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nev: Option<NotificationEvent>,
    /// Verification request flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrq: Option<bool>,
    /// Creator of the subscription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cr: Option<String>,
    /// Anything else the CSE sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Notification event (`nev`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Representation of the resource that triggered the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep: Option<Value>,
    /// Raw event type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net: Option<i64>,
}

impl Notification {
    /// Notification for `sur` carrying `rep`
    pub fn new(sur: impl Into<String>, rep: Value, net: NotificationEventType) -> Self {
        Self {
            sur: sur.into(),
            nev: Some(NotificationEvent {
                rep: Some(rep),
                net: Some(net.value()),
            }),
            vrq: None,
            cr: None,
            extra: Map::new(),
        }
    }

    /// Parse a `{"m2m:sgn": {...}}` body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let mut value: Value = serde_json::from_slice(body)?;
        let sgn = value
            .get_mut(NOTIFICATION_SHORT_NAME)
            .map(Value::take)
            .ok_or_else(|| {
                OneM2MError::InvalidArgument(format!(
                    "Notification body has no {NOTIFICATION_SHORT_NAME} member"
                ))
            })?;
        Ok(serde_json::from_value(sgn)?)
    }

    /// Wire body: `{"m2m:sgn": {...}}`
    pub fn to_body(&self) -> Value {
        let mut wrapper = Map::new();
        wrapper.insert(
            NOTIFICATION_SHORT_NAME.to_string(),
            serde_json::to_value(self).unwrap_or(Value::Null),
        );
        Value::Object(wrapper)
    }

    /// Typed event type, when the CSE sent a known one
    pub fn event_type(&self) -> Option<NotificationEventType> {
        self.nev
            .as_ref()
            .and_then(|nev| nev.net)
            .and_then(|net| NotificationEventType::try_from(net).ok())
    }

    /// Resource representation carried by the event
    pub fn representation(&self) -> Option<&Value> {
        self.nev.as_ref().and_then(|nev| nev.rep.as_ref())
    }
}

/// What a handler is invoked with.
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
    /// Dispatched without a payload
    Empty,
    /// Dispatched with a response envelope
    Response(OneM2MResponse),
    /// Inbound notification from a CSE
    Notification(Notification),
}

/// A handler's answer, sent back to the notifying CSE.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationReply {
    /// oneM2M status; also determines the HTTP status
    pub rsc: ResponseStatusCode,
    /// Optional JSON body
    pub body: Option<Value>,
    /// Responder sent as `X-M2M-Origin`; defaults to the notification path
    pub originator: Option<String>,
}

impl NotificationReply {
    /// Reply with `rsc` and no body
    pub fn new(rsc: ResponseStatusCode) -> Self {
        Self {
            rsc,
            body: None,
            originator: None,
        }
    }

    /// 2000 OK
    pub fn ok() -> Self {
        Self::new(ResponseStatusCode::Ok)
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Answer as `originator`
    pub fn with_originator(mut self, originator: impl Into<String>) -> Self {
        self.originator = Some(originator.into());
        self
    }
}

impl Default for NotificationReply {
    fn default() -> Self {
        Self::ok()
    }
}

/// Shared handler function.
pub type Handler = Arc<dyn Fn(Callback) -> Result<NotificationReply> + Send + Sync>;

/// How long a handler stays registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerPolicy {
    /// Until deregistered
    Persistent,
    /// Removed after the first dispatch
    Once,
}

/// Concurrent map from correlation id to handler.
///
/// Cloning shares the same map. Handlers are cloned out before they run, so
/// a handler may itself register or deregister ids.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<DashMap<String, (Handler, HandlerPolicy)>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a persistent handler. Replaces any handler under the same id.
    pub fn register<F>(&self, id: impl Display, handler: F)
    where
        F: Fn(Callback) -> Result<NotificationReply> + Send + Sync + 'static,
    {
        self.insert(id.to_string(), Arc::new(handler), HandlerPolicy::Persistent);
    }

    /// Register a handler that is dropped after its first dispatch
    pub fn register_once<F>(&self, id: impl Display, handler: F)
    where
        F: Fn(Callback) -> Result<NotificationReply> + Send + Sync + 'static,
    {
        self.insert(id.to_string(), Arc::new(handler), HandlerPolicy::Once);
    }

    fn insert(&self, id: String, handler: Handler, policy: HandlerPolicy) {
        tracing::debug!(%id, ?policy, "Registering notification handler");
        if self.handlers.insert(id.clone(), (handler, policy)).is_some() {
            tracing::debug!(%id, "Replaced existing handler");
        }
    }

    /// Remove a handler; returns whether one existed
    pub fn deregister(&self, id: impl Display) -> bool {
        self.handlers.remove(&id.to_string()).is_some()
    }

    /// Is a handler registered under `id`?
    pub fn contains(&self, id: impl Display) -> bool {
        self.handlers.contains_key(&id.to_string())
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// No handlers registered?
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered ids, in no particular order
    pub fn ids(&self) -> Vec<String> {
        self.handlers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Clone the handler for `id` out of the map, evicting it if it is one-shot.
    pub(crate) fn take(&self, id: &str) -> Option<Handler> {
        if let Some((_, (handler, _))) = self
            .handlers
            .remove_if(id, |_, (_, policy)| *policy == HandlerPolicy::Once)
        {
            return Some(handler);
        }
        self.handlers.get(id).map(|entry| Arc::clone(&entry.0))
    }

    /// Invoke the handler for `id`.
    ///
    /// `payload` must be absent or a response envelope. A missing handler is
    /// logged and yields `Ok(None)`.
    pub fn dispatch(
        &self,
        id: impl Display,
        payload: Option<Value>,
    ) -> Result<Option<NotificationReply>> {
        let callback = match payload {
            None => Callback::Empty,
            Some(value) => Callback::Response(OneM2MResponse::from_value(value)?),
        };
        self.invoke(&id.to_string(), callback)
    }

    /// Invoke the handler for `id` with a response envelope
    pub fn dispatch_response(
        &self,
        id: impl Display,
        response: OneM2MResponse,
    ) -> Result<Option<NotificationReply>> {
        self.invoke(&id.to_string(), Callback::Response(response))
    }

    fn invoke(&self, id: &str, callback: Callback) -> Result<Option<NotificationReply>> {
        match self.take(id) {
            Some(handler) => handler(callback).map(Some),
            None => {
                tracing::warn!(%id, "No handler registered for request id");
                Ok(None)
            },
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
