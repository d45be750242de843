//! Parameter catalog: oneM2M parameter names and their HTTP bindings.
//!
//! Static tables from TS-0004 Table 8.2.2-1 and TS-0009 6.2 / 6.4 describing
//! which request parameters travel as headers, which travel in the query
//! string, and which response headers are translated back into parameters.

use phf::{phf_map, phf_set};

/// Canonical oneM2M JSON media type.
pub const CONTENT_TYPE_JSON: &str = "application/vnd.onem2m-res+json";

// === Primitive parameters (TS-0004 Table 8.2.2-1) ===

/// Target resource
pub const PARAM_TO: &str = "to";
/// Originator
pub const PARAM_FROM: &str = "fr";
/// Operation
pub const PARAM_OPERATION: &str = "op";
/// Request identifier (correlation id)
pub const PARAM_REQUEST_IDENTIFIER: &str = "rqi";
/// Content
pub const PARAM_CONTENT: &str = "cn";
/// Response status code
pub const PARAM_RESPONSE_STATUS_CODE: &str = "rsc";
/// Primitive content
pub const PARAM_PRIMITIVE_CONTENT: &str = "pc";

// === Query string parameters (TS-0009 Table 6.2.2.1-1) ===

/// Response type
pub const PARAM_RESPONSE_TYPE: &str = "rt";
/// Result persistence
pub const PARAM_RESULT_PERSISTENCE: &str = "rp";
/// Result content
pub const PARAM_RESULT_CONTENT: &str = "rcn";
/// Delivery aggregation
pub const PARAM_DELIVERY_AGGREGATION: &str = "da";
/// Created before
pub const PARAM_CREATED_BEFORE: &str = "crb";
/// Created after
pub const PARAM_CREATED_AFTER: &str = "cra";
/// Modified since
pub const PARAM_MODIFIED_SINCE: &str = "ms";
/// Unmodified since
pub const PARAM_UNMODIFIED_SINCE: &str = "us";
/// State tag smaller
pub const PARAM_STATE_TAG_SMALLER: &str = "sts";
/// State tag bigger
pub const PARAM_STATE_TAG_BIGGER: &str = "stb";
/// Expire before
pub const PARAM_EXPIRE_BEFORE: &str = "exb";
/// Expire after
pub const PARAM_EXPIRE_AFTER: &str = "exa";
/// Labels
pub const PARAM_LABELS: &str = "lbl";
/// Resource type
pub const PARAM_RESOURCE_TYPE: &str = "ty";
/// Size above
pub const PARAM_SIZE_ABOVE: &str = "sza";
/// Size below
pub const PARAM_SIZE_BELOW: &str = "szb";
/// Content type
pub const PARAM_CONTENT_TYPE: &str = "cty";
/// Limit
pub const PARAM_LIMIT: &str = "lim";
/// Attribute
pub const PARAM_ATTRIBUTE: &str = "atr";
/// Filter usage
pub const PARAM_FILTER_USAGE: &str = "fu";
/// Semantics filter
pub const PARAM_SEMANTICS_FILTER: &str = "smf";
/// Discovery result type
pub const PARAM_DISCOVERY_RESULT_TYPE: &str = "drt";
/// Role IDs
pub const PARAM_ROLE_IDS: &str = "rids";
/// Token IDs
pub const PARAM_TOKEN_IDS: &str = "tids";
/// Local token IDs
pub const PARAM_LOCAL_TOKEN_IDS: &str = "ltids";
/// Token request indicator
pub const PARAM_TOKEN_REQUEST_INDICATOR: &str = "tqi";

// === HTTP headers ===

/// Originator header
pub const X_M2M_ORIGIN: &str = "X-M2M-Origin";
/// Request identifier header
pub const X_M2M_RI: &str = "X-M2M-RI";
/// Response status code header
pub const X_M2M_RSC: &str = "X-M2M-RSC";
/// Content-Location header
pub const CONTENT_LOCATION: &str = "Content-Location";

/// Where a header-mapped request parameter ends up on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderTarget {
    /// Carried by the request URI itself
    RequestUri,
    /// Carried by the HTTP method
    Method,
    /// Carried by a named header
    Header(&'static str),
}

/// Request parameter → HTTP binding.
pub static PARAM_TO_HEADER: phf::Map<&'static str, HeaderTarget> = phf_map! {
    "to" => HeaderTarget::RequestUri,
    "op" => HeaderTarget::Method,
    "fr" => HeaderTarget::Header(X_M2M_ORIGIN),
    "rqi" => HeaderTarget::Header(X_M2M_RI),
};

/// Response header → parameter. Keys are lowercase, the form `http::HeaderMap` stores.
pub static HEADER_TO_PARAM: phf::Map<&'static str, &'static str> = phf_map! {
    "content-location" => "cn",
    "x-m2m-origin" => "fr",
    "x-m2m-ri" => "rqi",
    "x-m2m-rsc" => "rsc",
};

/// Response headers translated into parameters; everything else is ignored (TS-0009 6.4).
pub const SUPPORTED_RESPONSE_HEADERS: [&str; 4] = [CONTENT_LOCATION, X_M2M_ORIGIN, X_M2M_RI, X_M2M_RSC];

/// Control headers every response primitive must carry.
pub const REQUIRED_CONTROL_HEADERS: [&str; 3] = [X_M2M_ORIGIN, X_M2M_RI, X_M2M_RSC];

/// Parameters carried in the request query string.
pub static QUERY_STRING_PARAMS: phf::Set<&'static str> = phf_set! {
    "rt", "rp", "rcn", "da", "crb", "cra", "ms", "us", "sts", "stb", "exb", "exa",
    "lbl", "ty", "sza", "szb", "cty", "lim", "atr", "fu", "smf", "drt", "rids",
    "tids", "ltids", "tqi",
};

/// Primitive parameters consumed by headers, the request line, or the body.
pub static PRIMITIVE_PARAMS: phf::Set<&'static str> = phf_set! {
    "to", "fr", "op", "rqi", "cn", "rsc", "pc",
};

/// Is `name` carried in the query string?
pub fn is_query_param(name: &str) -> bool {
    QUERY_STRING_PARAMS.contains(name)
}

/// Is `name` a primitive parameter that never appears in the query string?
pub fn is_primitive_param(name: &str) -> bool {
    PRIMITIVE_PARAMS.contains(name)
}

/// Is `name` a known request parameter at all?
pub fn is_known_param(name: &str) -> bool {
    is_query_param(name) || is_primitive_param(name)
}

/// HTTP binding of a request parameter, if it has one.
pub fn header_for_param(name: &str) -> Option<HeaderTarget> {
    PARAM_TO_HEADER.get(name).copied()
}

/// Parameter name for a response header, if the header is supported.
pub fn param_for_header(header: &str) -> Option<&'static str> {
    HEADER_TO_PARAM.get(header.to_ascii_lowercase().as_str()).copied()
}
