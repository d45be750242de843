//! Response primitive: HTTP response → oneM2M response envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OneM2MError, Result};
use crate::protocol::catalog::{self, REQUIRED_CONTROL_HEADERS, SUPPORTED_RESPONSE_HEADERS};
use crate::protocol::ResponseStatusCode;
use crate::resource::{Resource, ResourceKind};
use crate::transport::HttpResponse;

/// oneM2M response envelope.
///
/// Control parameters are typed fields; any other supported header lands in
/// `params` under its parameter name (e.g. `cn` for `Content-Location`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneM2MResponse {
    /// Response status code, kept as wire text (e.g. "2001")
    pub rsc: String,
    /// Request identifier echoed back by the CSE
    pub rqi: String,
    /// Originator of the response
    pub fr: String,
    /// Remaining header-derived parameters
    #[serde(flatten)]
    pub params: Map<String, Value>,
    /// Primitive content: parsed JSON, raw text, or nothing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pc: Option<Value>,
    /// HTTP status the envelope arrived with
    #[serde(skip)]
    pub http_status: Option<u16>,
}

impl OneM2MResponse {
    /// Build an envelope from a completed HTTP response.
    ///
    /// Non-success HTTP statuses are fatal. All missing control headers are
    /// reported together.
    pub fn from_http(response: HttpResponse) -> Result<Self> {
        if !response.status.is_success() {
            return Err(OneM2MError::HttpStatus {
                status: response.status.as_u16(),
                body: response.body,
            });
        }

        let missing: Vec<String> = REQUIRED_CONTROL_HEADERS
            .iter()
            .filter(|h| response.header(**h).is_none())
            .map(|h| (*h).to_string())
            .collect();
        if !missing.is_empty() {
            tracing::warn!(?missing, body = %response.body, "Response missing control headers");
            return Err(OneM2MError::MissingControlParameters(missing));
        }

        let mut params = Map::new();
        for header in SUPPORTED_RESPONSE_HEADERS {
            let Some(value) = response.header(header) else {
                continue;
            };
            if let Some(param) = catalog::param_for_header(header) {
                params.insert(param.to_string(), Value::String(value.to_string()));
            }
        }

        let mut take = |name: &str| match params.remove(name) {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        let rsc = take(catalog::PARAM_RESPONSE_STATUS_CODE);
        let rqi = take(catalog::PARAM_REQUEST_IDENTIFIER);
        let fr = take(catalog::PARAM_FROM);

        let is_json = response
            .header(http::header::CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.contains("json"));
        let pc = if is_json && !response.body.trim().is_empty() {
            Some(serde_json::from_str(&response.body)?)
        } else if response.body.is_empty() {
            None
        } else {
            Some(Value::String(response.body))
        };

        Ok(Self {
            rsc,
            rqi,
            fr,
            params,
            pc,
            http_status: Some(response.status.as_u16()),
        })
    }

    /// Parse a JSON value that must describe a well-formed envelope.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| OneM2MError::InvalidCallbackArgument(format!(
                "Callbacks take no argument or a oneM2M response envelope: {e}"
            )))
    }

    /// JSON representation
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Typed status code, if it is one this crate knows
    pub fn status_code(&self) -> Option<ResponseStatusCode> {
        ResponseStatusCode::from_code(&self.rsc)
    }

    /// Does `rsc` equal `code`?
    pub fn has_status(&self, code: ResponseStatusCode) -> bool {
        self.rsc == code.as_str()
    }

    /// rsc == 2000
    pub fn is_ok(&self) -> bool {
        self.has_status(ResponseStatusCode::Ok)
    }

    /// rsc == 2001
    pub fn is_created(&self) -> bool {
        self.has_status(ResponseStatusCode::Created)
    }

    /// rsc == 2002
    pub fn is_deleted(&self) -> bool {
        self.has_status(ResponseStatusCode::Deleted)
    }

    /// rsc == 2004
    pub fn is_updated(&self) -> bool {
        self.has_status(ResponseStatusCode::Updated)
    }

    /// Other header-derived parameter (e.g. `cn`)
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Content wrapped under `short_name`, e.g. `pc["m2m:ae"]`
    pub fn content(&self, short_name: &str) -> Option<&Value> {
        self.pc.as_ref().and_then(|pc| pc.get(short_name))
    }

    /// Decode the content as a resource of `kind`.
    ///
    /// Returns `Ok(None)` when the body does not carry that resource.
    pub fn content_as(&self, kind: ResourceKind) -> Result<Option<Resource>> {
        match self.content(kind.short_name()) {
            Some(attrs) => Resource::from_value(kind, attrs.clone()).map(Some),
            None => Ok(None),
        }
    }
}

impl TryFrom<HttpResponse> for OneM2MResponse {
    type Error = OneM2MError;

    fn try_from(response: HttpResponse) -> Result<Self> {
        Self::from_http(response)
    }
}

impl std::fmt::Display for OneM2MResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
