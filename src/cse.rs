//! CSE facade: the operations an AE performs against one CSE.
//!
//! Wraps a [`OneM2MRequest`] with the CSE's address and the AE registered
//! through it. Every operation past registration uses the registered AE's
//! resource id as the originator (`fr`).

use serde_json::Value;

use crate::config::CseConfig;
use crate::error::{OneM2MError, Result};
use crate::primitive::{OneM2MRequest, OneM2MResponse, ParameterSet};
use crate::protocol::catalog::{
    PARAM_FILTER_USAGE, PARAM_FROM, PARAM_RESOURCE_TYPE, PARAM_RESULT_CONTENT,
};
use crate::protocol::{FilterUsage, NotificationEventType, ResourceType, ResultContent};
use crate::resource::{Resource, ResourceKind, SubscriptionBuilder, ATTR_AE_ID};
use crate::transport::{HttpTransport, Transport};

/// Discovery result wrapper key
pub const URI_LIST_SHORT_NAME: &str = "m2m:uril";

/// Latest content instance virtual resource
const LATEST: &str = "la";

/// A CSE as seen from one AE.
pub struct Cse<T: Transport> {
    config: CseConfig,
    request: OneM2MRequest<T>,
    ae: Option<Resource>,
}

impl Cse<HttpTransport> {
    /// Connect over HTTP with the given request timeout
    pub fn connect(config: CseConfig, timeout: std::time::Duration) -> Result<Self> {
        Ok(Self::new(config, HttpTransport::new(timeout)?))
    }
}

impl<T: Transport> Cse<T> {
    /// Create a facade over `transport`
    pub fn new(config: CseConfig, transport: T) -> Self {
        Self {
            config,
            request: OneM2MRequest::with_transport(transport),
            ae: None,
        }
    }

    /// Connection settings
    pub fn config(&self) -> &CseConfig {
        &self.config
    }

    /// Underlying request primitive
    pub fn request(&self) -> &OneM2MRequest<T> {
        &self.request
    }

    /// Registered AE, if any
    pub fn ae(&self) -> Option<&Resource> {
        self.ae.as_ref()
    }

    /// Adopt an AE registered elsewhere
    pub fn set_ae(&mut self, ae: Resource) {
        self.ae = Some(ae);
    }

    /// Absolute URI for a resource path; a leading `/` is ignored.
    pub fn to(&self, uri: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url(),
            uri.strip_prefix('/').unwrap_or(uri)
        )
    }

    fn base(&self) -> String {
        self.to(&self.config.base_resource)
    }

    /// Originator for requests made on behalf of the registered AE
    fn originator(&self) -> Result<String> {
        let ae = self.ae.as_ref().ok_or_else(|| {
            OneM2MError::InvalidArgument("No AE registered with this CSE".to_string())
        })?;
        ae.resource_id()
            .or_else(|| ae.ae_id())
            .map(str::to_string)
            .ok_or_else(|| {
                OneM2MError::InvalidArgument("Registered AE has no resource id".to_string())
            })
    }

    fn ae_params(&self) -> Result<ParameterSet> {
        Ok(ParameterSet::new().with(PARAM_FROM, self.originator()?))
    }

    /// Register `ae`. The `aei` credential is sent as the originator, not in the body.
    pub fn register_ae(&mut self, ae: &Resource) -> Result<OneM2MResponse> {
        if ae.kind() != ResourceKind::Ae {
            return Err(OneM2MError::InvalidArgument(format!(
                "AE registration expects an AE, got {}",
                ae.kind()
            )));
        }
        let aei = ae.ae_id().unwrap_or_default().to_string();
        let params = ParameterSet::new()
            .with(PARAM_FROM, aei)
            .with(PARAM_RESOURCE_TYPE, ResourceType::Ae);
        let body = ae.without(ATTR_AE_ID);

        let response = self
            .request
            .create(Some(&self.base()), Some(params), Some(&body))?;

        if response.is_created() {
            if let Some(registered) = response.content_as(ResourceKind::Ae)? {
                tracing::info!(ri = ?registered.resource_id(), "AE registered");
                self.ae = Some(registered);
            }
        }
        Ok(response)
    }

    /// Retrieve an existing AE and adopt it on success
    pub fn get_ae(&mut self, ae_id: &str) -> Result<OneM2MResponse> {
        let to = format!("{}/{}", self.base(), ae_id);
        let params = ParameterSet::new()
            .with(PARAM_FROM, ae_id)
            .with(PARAM_RESOURCE_TYPE, ResourceType::Ae);

        let response = self.request.retrieve(Some(&to), Some(params))?;
        if response.is_ok() {
            if let Some(ae) = response.content_as(ResourceKind::Ae)? {
                self.ae = Some(ae);
            }
        }
        Ok(response)
    }

    /// Discover resources of type `ty` under the base resource
    pub fn discover_resources(&self, ty: ResourceType) -> Result<OneM2MResponse> {
        let params = self
            .ae_params()?
            .with(PARAM_FILTER_USAGE, FilterUsage::Discovery)
            .with(PARAM_RESOURCE_TYPE, ty);
        self.request.retrieve(Some(&self.base()), Some(params))
    }

    /// URIs of every container under the base resource
    pub fn discover_containers(&self) -> Result<Vec<String>> {
        let response = self.discover_resources(ResourceType::Container)?;
        Ok(uri_list(response.content(URI_LIST_SHORT_NAME)))
    }

    /// Create a content instance in the container at `uri`
    pub fn create_content_instance(&self, uri: &str, content: &Resource) -> Result<OneM2MResponse> {
        let params = self
            .ae_params()?
            .with(PARAM_RESULT_CONTENT, ResultContent::ChildResources);
        self.request
            .create(Some(&self.to(uri)), Some(params), Some(content))
    }

    /// Retrieve content instances of the container at `uri`
    pub fn retrieve_content_instance(
        &self,
        uri: &str,
        rcn: ResultContent,
    ) -> Result<OneM2MResponse> {
        let params = self
            .ae_params()?
            .with(PARAM_RESULT_CONTENT, rcn)
            .with(PARAM_RESOURCE_TYPE, ResourceType::ContentInstance);
        self.request.retrieve(Some(&self.to(uri)), Some(params))
    }

    /// Latest content instance of the container at `uri`, if the CSE returned one
    pub fn retrieve_latest_content_instance(&self, uri: &str) -> Result<Option<Resource>> {
        let to = format!("{}/{LATEST}", self.to(uri));
        let response = self.request.retrieve(Some(&to), Some(self.ae_params()?))?;
        if !response.is_ok() {
            return Ok(None);
        }
        response.content_as(ResourceKind::ContentInstance)
    }

    /// List subscriptions on the resource at `uri`
    pub fn check_existing_subscriptions(&self, uri: &str) -> Result<OneM2MResponse> {
        let params = self
            .ae_params()?
            .with(PARAM_FILTER_USAGE, FilterUsage::Discovery)
            .with(PARAM_RESOURCE_TYPE, ResourceType::Subscription);
        self.request.retrieve(Some(&self.to(uri)), Some(params))
    }

    /// Subscribe to the resource at `uri`.
    ///
    /// An empty `event_types` subscribes to child creation only.
    pub fn create_subscription(
        &self,
        uri: &str,
        name: &str,
        notification_uri: Option<&str>,
        event_types: &[NotificationEventType],
        rcn: Option<ResultContent>,
    ) -> Result<OneM2MResponse> {
        let mut builder = SubscriptionBuilder::new().event_types(event_types.iter().copied());
        if let Some(nu) = notification_uri {
            builder = builder.notification_uri(nu);
        }
        self.create_resource(uri, name, builder.build(), rcn)
    }

    /// Create `resource` named `name` under `uri`
    pub fn create_resource(
        &self,
        uri: &str,
        name: &str,
        mut resource: Resource,
        rcn: Option<ResultContent>,
    ) -> Result<OneM2MResponse> {
        let mut params = self.ae_params()?;
        if let Some(rcn) = rcn {
            params.insert(PARAM_RESULT_CONTENT, rcn);
        }
        resource.set_name(name);
        self.request
            .create(Some(&self.to(uri)), Some(params), Some(&resource))
    }

    /// Retrieve the resource at `uri`
    pub fn retrieve_resource(&self, uri: &str, ty: ResourceType) -> Result<OneM2MResponse> {
        let params = self.ae_params()?.with(PARAM_RESOURCE_TYPE, ty);
        self.request.retrieve(Some(&self.to(uri)), Some(params))
    }

    /// Update one attribute of the resource at `uri`
    pub fn update_resource(
        &self,
        uri: &str,
        short_name: &str,
        key: &str,
        value: Value,
    ) -> Result<OneM2MResponse> {
        self.request.update(
            Some(&self.to(uri)),
            Some(self.ae_params()?),
            short_name,
            key,
            value,
        )
    }

    /// Delete the registered AE. The facade forgets it on success.
    pub fn delete_ae(&mut self) -> Result<OneM2MResponse> {
        let originator = self.originator()?;
        let to = format!("{}/{}", self.base(), originator);
        let params = ParameterSet::new()
            .with(PARAM_FROM, originator)
            .with(PARAM_RESOURCE_TYPE, ResourceType::Ae);

        let response = self.request.delete(Some(&to), Some(params))?;
        if response.is_deleted() {
            self.ae = None;
        }
        Ok(response)
    }

    /// Delete the resource at `uri`
    pub fn delete_resource(&self, uri: &str) -> Result<OneM2MResponse> {
        self.request
            .delete(Some(&self.to(uri)), Some(self.ae_params()?))
    }
}

/// `m2m:uril` arrives as a JSON array or a space separated string.
fn uri_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}
