//! Ordered oneM2M parameter set.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OneM2MError, Result};
use crate::protocol::catalog::{PARAM_FROM, PARAM_REQUEST_IDENTIFIER, PARAM_TO};

/// Mapping from protocol parameter name to value.
///
/// Insertion order is preserved; query strings are emitted in that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    inner: Map<String, Value>,
}

impl ParameterSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or overwrite a parameter, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.insert(name.into(), value.into())
    }

    /// Get a parameter value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inner.get(name)
    }

    /// Get a parameter rendered as wire text
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.inner.get(name).map(render_value)
    }

    /// Remove a parameter
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.inner.shift_remove(name)
    }

    /// Does the set contain `name`?
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Is the set empty?
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.inner.iter()
    }

    /// Target (`to`) as text
    pub fn to(&self) -> Option<String> {
        self.get_str(PARAM_TO)
    }

    /// Originator (`fr`) as text
    pub fn originator(&self) -> Option<String> {
        self.get_str(PARAM_FROM)
    }

    /// Request identifier (`rqi`) as text
    pub fn request_id(&self) -> Option<String> {
        self.get_str(PARAM_REQUEST_IDENTIFIER)
    }

    /// Borrow the underlying JSON map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.inner
    }
}

impl From<Map<String, Value>> for ParameterSet {
    fn from(inner: Map<String, Value>) -> Self {
        Self { inner }
    }
}

impl TryFrom<Value> for ParameterSet {
    type Error = OneM2MError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(inner) => Ok(Self { inner }),
            other => Err(OneM2MError::InvalidParameterStructure {
                found: json_type_name(&other).to_string(),
            }),
        }
    }
}

impl std::str::FromStr for ParameterSet {
    type Err = OneM2MError;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(serde_json::from_str::<Value>(s)?)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Render a parameter value the way it appears in headers and query strings.
///
/// Strings are emitted raw, arrays are joined with `+` (TS-0009 6.2.2.2).
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join("+"),
        other => other.to_string(),
    }
}

/// JSON type name used in structure errors.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preserves_insertion_order() {
        let params = ParameterSet::new().with("rcn", 2).with("fu", 1).with("fr", "CAE");
        let keys: Vec<_> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["rcn", "fu", "fr"]);
    }

    #[test]
    fn test_non_mapping_rejected_with_type() {
        let err = ParameterSet::try_from(json!(["to", "fr"])).unwrap_err();
        match err {
            OneM2MError::InvalidParameterStructure { found } => assert_eq!(found, "array"),
            other => panic!("unexpected error: {other}"),
        }

        let err = "\"just a string\"".parse::<ParameterSet>().unwrap_err();
        assert!(matches!(err, OneM2MError::InvalidParameterStructure { found } if found == "string"));
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&json!("abc")), "abc");
        assert_eq!(render_value(&json!(2)), "2");
        assert_eq!(render_value(&json!(true)), "true");
        assert_eq!(render_value(&json!(["a", "b"])), "a+b");
    }

    #[test]
    fn test_accessors() {
        let params: ParameterSet = [("to", "http://cse"), ("fr", "CAE1"), ("rqi", "42")]
            .into_iter()
            .collect();
        assert_eq!(params.to().as_deref(), Some("http://cse"));
        assert_eq!(params.originator().as_deref(), Some("CAE1"));
        assert_eq!(params.request_id().as_deref(), Some("42"));
    }
}
