//! Request primitive: resolve, validate, map to HTTP, send.

use http::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use http::HeaderMap;
use serde_json::{Map, Value};

use super::params::{render_value, ParameterSet};
use super::resolver::{ParameterResolver, Resolved};
use super::response::OneM2MResponse;
use crate::error::{OneM2MError, Result};
use crate::protocol::catalog::{self, HeaderTarget, CONTENT_TYPE_JSON};
use crate::protocol::Operation;
use crate::resource::Resource;
use crate::transport::{HttpRequest, Transport};

/// Builds and sends oneM2M request primitives over a [`Transport`].
///
/// Instance defaults (target and parameters) apply whenever a call does not
/// supply its own; per-call values are never written back.
pub struct OneM2MRequest<T: Transport> {
    resolver: ParameterResolver,
    transport: T,
}

impl<T: Transport> OneM2MRequest<T> {
    /// Create a request primitive with instance defaults
    pub fn new(to: Option<String>, params: ParameterSet, transport: T) -> Self {
        Self {
            resolver: ParameterResolver::new(to, params),
            transport,
        }
    }

    /// Create a request primitive without defaults
    pub fn with_transport(transport: T) -> Self {
        Self::new(None, ParameterSet::new(), transport)
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Instance default parameters
    pub fn params(&self) -> &ParameterSet {
        self.resolver.defaults()
    }

    /// Set one default parameter. Unknown names are ignored.
    pub fn set_param(&mut self, name: &str, value: impl Into<Value>) {
        if catalog::is_known_param(name) {
            self.resolver.defaults_mut().insert(name, value);
        } else {
            tracing::warn!(param = name, "Ignoring unknown oneM2M request parameter");
        }
    }

    /// Set several default parameters. Unknown names are ignored.
    pub fn set_params(&mut self, params: &ParameterSet) {
        for (name, value) in params.iter() {
            self.set_param(name, value.clone());
        }
    }

    /// Create a resource. Without `content` the request carries no body.
    pub fn create(
        &self,
        to: Option<&str>,
        params: Option<ParameterSet>,
        content: Option<&Resource>,
    ) -> Result<OneM2MResponse> {
        let resolved = self.prepare(Operation::Create, to, params)?;
        let mut headers = map_params_to_headers(&resolved.params);

        let content_type = match content {
            Some(resource) => format!("{};ty={}", CONTENT_TYPE_JSON, resource.resource_type()),
            None => CONTENT_TYPE_JSON.to_string(),
        };
        insert_header(&mut headers, CONTENT_TYPE, &content_type);

        let body = content.map(|r| r.to_body().to_string());
        self.send(Operation::Create, resolved.target, headers, body)
    }

    /// Retrieve a resource
    pub fn retrieve(&self, to: Option<&str>, params: Option<ParameterSet>) -> Result<OneM2MResponse> {
        let resolved = self.prepare(Operation::Retrieve, to, params)?;
        let mut headers = map_params_to_headers(&resolved.params);
        insert_header(&mut headers, CONTENT_TYPE, CONTENT_TYPE_JSON);
        self.send(Operation::Retrieve, resolved.target, headers, None)
    }

    /// Update a single attribute: body is `{short_name: {key: value}}`
    pub fn update(
        &self,
        to: Option<&str>,
        params: Option<ParameterSet>,
        short_name: &str,
        key: &str,
        value: Value,
    ) -> Result<OneM2MResponse> {
        let resolved = self.prepare(Operation::Update, to, params)?;
        let mut headers = map_params_to_headers(&resolved.params);
        insert_header(&mut headers, CONTENT_TYPE, CONTENT_TYPE_JSON);

        let mut attrs = Map::new();
        attrs.insert(key.to_string(), value);
        let mut body = Map::new();
        body.insert(short_name.to_string(), Value::Object(attrs));

        self.send(
            Operation::Update,
            resolved.target,
            headers,
            Some(Value::Object(body).to_string()),
        )
    }

    /// Delete a resource
    pub fn delete(&self, to: Option<&str>, params: Option<ParameterSet>) -> Result<OneM2MResponse> {
        let resolved = self.prepare(Operation::Delete, to, params)?;
        let mut headers = map_params_to_headers(&resolved.params);
        insert_header(&mut headers, CONTENT_TYPE, CONTENT_TYPE_JSON);
        self.send(Operation::Delete, resolved.target, headers, None)
    }

    /// Deliver a notification (`{"m2m:sgn": ...}`) to a notification target
    pub fn notify(
        &self,
        to: Option<&str>,
        params: Option<ParameterSet>,
        notification: &Value,
    ) -> Result<OneM2MResponse> {
        let resolved = self.prepare(Operation::Notify, to, params)?;
        let mut headers = map_params_to_headers(&resolved.params);
        insert_header(&mut headers, CONTENT_TYPE, CONTENT_TYPE_JSON);
        self.send(
            Operation::Notify,
            resolved.target,
            headers,
            Some(notification.to_string()),
        )
    }

    fn prepare(
        &self,
        operation: Operation,
        to: Option<&str>,
        params: Option<ParameterSet>,
    ) -> Result<Resolved> {
        let resolved = self.resolver.resolve(operation, to, params)?;
        validate_required_params(operation, &resolved.params)?;
        Ok(resolved)
    }

    fn send(
        &self,
        operation: Operation,
        uri: String,
        mut headers: HeaderMap,
        body: Option<String>,
    ) -> Result<OneM2MResponse> {
        insert_header(&mut headers, ACCEPT, CONTENT_TYPE_JSON);

        tracing::debug!(
            %operation,
            %uri,
            transport = self.transport.name(),
            "Sending request primitive"
        );

        let response = self.transport.send(HttpRequest {
            method: operation.http_method(),
            uri,
            headers,
            body,
        })?;
        OneM2MResponse::from_http(response)
    }
}

/// Check the parameters `operation` requires; the first absent one is reported.
pub fn validate_required_params(operation: Operation, params: &ParameterSet) -> Result<()> {
    match operation
        .required_params()
        .iter()
        .find(|name| !params.contains(name))
    {
        Some(name) => Err(OneM2MError::MissingParameter {
            operation,
            parameter: (*name).to_string(),
        }),
        None => Ok(()),
    }
}

/// Translate header-bound parameters into HTTP headers.
///
/// `to` and `op` live on the request line; parameters with no mapping are dropped.
pub fn map_params_to_headers(params: &ParameterSet) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in params.iter() {
        if let Some(HeaderTarget::Header(header)) = catalog::header_for_param(name) {
            match (
                HeaderName::from_bytes(header.as_bytes()),
                HeaderValue::from_str(&render_value(value)),
            ) {
                (Ok(header), Ok(value)) => {
                    headers.insert(header, value);
                },
                _ => tracing::warn!(param = %name, "Dropping parameter with invalid header value"),
            }
        }
    }
    headers
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ResourceType;
    use crate::resource::{AeBuilder, ResourceKind};
    use crate::transport::mock::MockTransport;
    use crate::transport::HttpResponse;
    use http::{Method, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    fn request(transport: Arc<MockTransport>) -> OneM2MRequest<Arc<MockTransport>> {
        OneM2MRequest::new(
            Some("http://cse:8100/PN_CSE".to_string()),
            ParameterSet::new(),
            transport,
        )
    }

    #[test]
    fn test_required_params_per_operation() {
        for op in Operation::ALL {
            for required in op.required_params() {
                let mut params = ParameterSet::new()
                    .with("to", "http://x")
                    .with("fr", "C1")
                    .with("rqi", "1");
                params.remove(required);
                let err = validate_required_params(op, &params).unwrap_err();
                match err {
                    OneM2MError::MissingParameter {
                        operation,
                        parameter,
                    } => {
                        assert_eq!(operation, op);
                        assert_eq!(parameter, *required);
                    },
                    other => panic!("unexpected error: {other}"),
                }

                params.insert(*required, "v");
                validate_required_params(op, &params).unwrap();
            }
        }
    }

    #[test]
    fn test_validation_ignores_op_entry() {
        let params = ParameterSet::new().with("op", 2);
        validate_required_params(Operation::Retrieve, &params).unwrap();
        assert!(validate_required_params(Operation::Create, &params).is_err());
    }

    #[test]
    fn test_header_mapping() {
        let params = ParameterSet::new()
            .with("to", "http://x")
            .with("op", 1)
            .with("fr", "C1")
            .with("rqi", "abc")
            .with("rcn", 8);
        let headers = map_params_to_headers(&params);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["X-M2M-Origin"], "C1");
        assert_eq!(headers["X-M2M-RI"], "abc");
    }

    #[test]
    fn test_create_without_from_never_sends() {
        let transport = Arc::new(MockTransport::new());
        let err = request(transport.clone()).create(None, None, None).unwrap_err();
        assert!(matches!(
            err,
            OneM2MError::MissingParameter { operation: Operation::Create, ref parameter } if parameter == "fr"
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_unknown_param_never_sends() {
        let transport = Arc::new(MockTransport::new());
        let params = ParameterSet::new().with("bogus", 1);
        let err = request(transport.clone())
            .retrieve(None, Some(params))
            .unwrap_err();
        assert!(matches!(err, OneM2MError::UnknownParameter(name) if name == "bogus"));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_create_roundtrip_preserves_attributes() {
        let transport = Arc::new(MockTransport::echo());
        let ae = AeBuilder::new("N_SB_AE_1", "C1")
            .app_name("N_SB_AE_1")
            .point_of_access("http://localhost:7000")
            .build()
            .unwrap();
        let params = ParameterSet::new().with("fr", "C1");

        let response = request(transport.clone())
            .create(None, Some(params), Some(&ae))
            .unwrap();
        assert!(response.is_created());

        let sent = transport.last();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.uri, "http://cse:8100/PN_CSE");
        assert_eq!(
            sent.headers[CONTENT_TYPE],
            "application/vnd.onem2m-res+json;ty=2"
        );
        assert_eq!(sent.headers[ACCEPT], CONTENT_TYPE_JSON);
        assert_eq!(response.rqi, sent.headers["X-M2M-RI"].to_str().unwrap());

        let parsed = response.content_as(ResourceKind::Ae).unwrap().unwrap();
        assert_eq!(parsed.attributes(), ae.attributes());
        assert_eq!(parsed.resource_type(), ResourceType::Ae);
    }

    #[test]
    fn test_retrieve_builds_query_and_method() {
        let transport = Arc::new(MockTransport::new());
        let params = ParameterSet::new().with("rcn", 2).with("fu", 1);
        request(transport.clone())
            .retrieve(Some("http://cse:8100/PN_CSE/cnt?old=1"), Some(params))
            .unwrap();

        let sent = transport.last();
        assert_eq!(sent.method, Method::GET);
        assert_eq!(sent.uri, "http://cse:8100/PN_CSE/cnt?rcn=2&fu=1");
        assert!(sent.body.is_none());
    }

    #[test]
    fn test_update_body_and_method() {
        let transport = Arc::new(MockTransport::new());
        transport.push(
            HttpResponse::new(StatusCode::OK)
                .with_header("X-M2M-Origin", "/PN_CSE")
                .with_header("X-M2M-RI", "1")
                .with_header("X-M2M-RSC", "2004"),
        );
        let response = request(transport.clone())
            .update(Some("http://cse/PN_CSE/ae1"), None, "m2m:ae", "lbl", json!(["a"]))
            .unwrap();
        assert!(response.is_updated());

        let sent = transport.last();
        assert_eq!(sent.method, Method::PUT);
        let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"m2m:ae": {"lbl": ["a"]}}));
    }

    #[test]
    fn test_delete_and_notify_methods() {
        let transport = Arc::new(MockTransport::new());
        let req = request(transport.clone());

        req.delete(None, None).unwrap();
        assert_eq!(transport.last().method, Method::DELETE);

        let sgn = json!({"m2m:sgn": {"sur": "sub1", "nev": {"rep": {}, "net": 3}}});
        req.notify(Some("http://ae:8080/notify"), None, &sgn).unwrap();
        let sent = transport.last();
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.uri, "http://ae:8080/notify");
        assert_eq!(
            serde_json::from_str::<Value>(sent.body.as_deref().unwrap()).unwrap(),
            sgn
        );
    }

    #[test]
    fn test_defaults_not_mutated_by_calls() {
        let transport = Arc::new(MockTransport::new());
        let mut req = request(transport.clone());
        req.set_param("fr", "C1");
        req.set_param("nonsense", "x");
        assert_eq!(req.params().len(), 1);

        req.retrieve(None, None).unwrap();
        req.retrieve(Some("http://elsewhere"), None).unwrap();
        assert_eq!(req.params().len(), 1);
        assert!(!req.params().contains("rqi"));

        let sent = transport.requests();
        assert_ne!(sent[0].headers["X-M2M-RI"], sent[1].headers["X-M2M-RI"]);
        assert_eq!(sent[1].uri, "http://elsewhere");
    }

    #[test]
    fn test_http_error_propagates() {
        let transport = Arc::new(MockTransport::new());
        transport.push(HttpResponse::new(StatusCode::NOT_FOUND).with_body("gone"));
        let err = request(transport).retrieve(None, None).unwrap_err();
        assert!(matches!(err, OneM2MError::HttpStatus { status: 404, .. }));
    }
}
