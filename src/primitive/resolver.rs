//! Parameter resolution: merging call arguments with instance defaults.
//!
//! Precedence, highest first:
//!
//! 1. Explicit `to` / `params` passed to the call (never persisted).
//! 2. A `to` entry inside the resolved parameter set.
//! 3. The instance default target and parameters.
//!
//! The resolver always works on an owned copy. Instance defaults are never
//! touched by a request, so a caller holding the same set sees no mutation.

use serde_json::Value;
use uuid::Uuid;

use super::params::{render_value, ParameterSet};
use crate::error::{OneM2MError, Result};
use crate::protocol::catalog::{self, PARAM_REQUEST_IDENTIFIER, PARAM_TO};
use crate::protocol::Operation;

/// Output of a resolution: the final request URI and the parameters behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Target URI including the query string
    pub target: String,
    /// Resolved parameters (always contains `to` and `rqi`)
    pub params: ParameterSet,
}

/// Resolves per-call arguments against instance defaults.
#[derive(Debug, Clone, Default)]
pub struct ParameterResolver {
    default_to: Option<String>,
    defaults: ParameterSet,
}

impl ParameterResolver {
    /// Create a resolver with instance defaults
    pub fn new(default_to: Option<String>, defaults: ParameterSet) -> Self {
        Self {
            default_to,
            defaults,
        }
    }

    /// Default target
    pub fn default_target(&self) -> Option<&str> {
        self.default_to.as_deref()
    }

    /// Default parameters
    pub fn defaults(&self) -> &ParameterSet {
        &self.defaults
    }

    /// Mutable default parameters
    pub fn defaults_mut(&mut self) -> &mut ParameterSet {
        &mut self.defaults
    }

    /// Resolve the target URI and parameter set for one operation.
    pub fn resolve(
        &self,
        operation: Operation,
        to: Option<&str>,
        params: Option<ParameterSet>,
    ) -> Result<Resolved> {
        let mut params = params.unwrap_or_else(|| self.defaults.clone());

        if !params.contains(PARAM_REQUEST_IDENTIFIER) {
            params.insert(PARAM_REQUEST_IDENTIFIER, generate_rqi());
        }

        let target = match to {
            Some(to) => {
                params.insert(PARAM_TO, to);
                to.to_string()
            },
            None => params
                .to()
                .or_else(|| self.default_to.clone())
                .ok_or_else(|| OneM2MError::MissingParameter {
                    operation,
                    parameter: PARAM_TO.to_string(),
                })?,
        };

        if !params.contains(PARAM_TO) {
            params.insert(PARAM_TO, target.clone());
        }

        let target = apply_query_string(&target, &params)?;
        tracing::debug!(%operation, %target, "Resolved request target");

        Ok(Resolved { target, params })
    }
}

/// Generate a fresh request identifier.
pub fn generate_rqi() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Replace any query string on `target` with the query-string parameters in `params`.
///
/// Primitive parameters are skipped; any name that is neither a primitive nor
/// a query-string parameter is rejected. Values are percent-encoded; the `+`
/// joining multi-value items stays literal.
pub fn apply_query_string(target: &str, params: &ParameterSet) -> Result<String> {
    let base = target.split('?').next().unwrap_or(target);

    let mut pairs = Vec::new();
    for (name, value) in params.iter() {
        if catalog::is_query_param(name) {
            pairs.push(format!("{name}={}", encode_query_value(value)));
        } else if !catalog::is_primitive_param(name) {
            return Err(OneM2MError::UnknownParameter(name.clone()));
        }
    }

    if pairs.is_empty() {
        Ok(base.to_string())
    } else {
        Ok(format!("{base}?{}", pairs.join("&")))
    }
}

fn encode_query_value(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(encode_query_value)
            .collect::<Vec<_>>()
            .join("+"),
        other => urlencoding::encode(&render_value(other)).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_to_taken_from_params_when_not_explicit() {
        let resolver = ParameterResolver::default();
        let params = ParameterSet::new()
            .with("to", "http://host:8000")
            .with("rqi", "123");

        let resolved = resolver.resolve(Operation::Retrieve, None, Some(params)).unwrap();
        assert_eq!(resolved.target, "http://host:8000");
        assert_eq!(resolved.params.request_id().as_deref(), Some("123"));
        assert_eq!(resolved.params.to().as_deref(), Some("http://host:8000"));
        assert_eq!(resolved.params.len(), 2);
    }

    #[test]
    fn test_explicit_to_wins_over_params() {
        let resolver = ParameterResolver::default();
        let params = ParameterSet::new().with("to", "http://wrong:9090");

        let resolved = resolver
            .resolve(Operation::Retrieve, Some("http://correct:8080"), Some(params))
            .unwrap();
        assert_eq!(resolved.target, "http://correct:8080");
        assert_eq!(resolved.params.to().as_deref(), Some("http://correct:8080"));
    }

    #[test]
    fn test_instance_defaults_used_and_not_mutated() {
        let defaults = ParameterSet::new().with("fr", "CAE1");
        let resolver = ParameterResolver::new(Some("http://cse:8100/PN_CSE".into()), defaults);

        let resolved = resolver.resolve(Operation::Create, None, None).unwrap();
        assert_eq!(resolved.target, "http://cse:8100/PN_CSE");
        assert_eq!(resolved.params.originator().as_deref(), Some("CAE1"));
        assert!(resolved.params.request_id().is_some());

        // Defaults untouched: no rqi or to leaked back.
        assert_eq!(resolver.defaults().len(), 1);
        assert!(!resolver.defaults().contains("rqi"));
    }

    #[test]
    fn test_explicit_params_override_defaults_for_one_call() {
        let resolver = ParameterResolver::new(
            Some("http://default".into()),
            ParameterSet::new().with("fr", "default-origin"),
        );
        let resolved = resolver
            .resolve(
                Operation::Retrieve,
                None,
                Some(ParameterSet::new().with("fr", "override")),
            )
            .unwrap();
        assert_eq!(resolved.params.originator().as_deref(), Some("override"));
        assert_eq!(resolved.target, "http://default");

        let again = resolver.resolve(Operation::Retrieve, None, None).unwrap();
        assert_eq!(again.params.originator().as_deref(), Some("default-origin"));
    }

    #[test]
    fn test_missing_target_reported_for_operation() {
        let resolver = ParameterResolver::default();
        let err = resolver.resolve(Operation::Delete, None, None).unwrap_err();
        assert!(matches!(
            err,
            OneM2MError::MissingParameter { operation: Operation::Delete, ref parameter } if parameter == "to"
        ));
    }

    #[test]
    fn test_query_string_in_param_order_and_strips_existing() {
        let params = ParameterSet::new().with("rcn", 2).with("fu", 1);
        let resolver = ParameterResolver::default();
        let resolved = resolver
            .resolve(
                Operation::Retrieve,
                Some("http://cse:8100/PN_CSE?ty=3&lim=1"),
                Some(params),
            )
            .unwrap();
        assert_eq!(resolved.target, "http://cse:8100/PN_CSE?rcn=2&fu=1");
    }

    #[test]
    fn test_primitive_params_skipped_in_query() {
        let params = ParameterSet::new()
            .with("fr", "CAE1")
            .with("ty", 23)
            .with("lbl", serde_json::json!(["a", "b"]));
        let query = apply_query_string("http://cse/x", &params).unwrap();
        assert_eq!(query, "http://cse/x?ty=23&lbl=a+b");
    }

    #[test]
    fn test_reserved_characters_stay_in_one_value() {
        let params = ParameterSet::new().with("lbl", "k=v&rcn=9");
        let query = apply_query_string("http://cse/x", &params).unwrap();
        assert_eq!(query, "http://cse/x?lbl=k%3Dv%26rcn%3D9");

        let params = ParameterSet::new().with("lbl", serde_json::json!(["a&b", "c d", "e+f"]));
        let query = apply_query_string("http://cse/x", &params).unwrap();
        assert_eq!(query, "http://cse/x?lbl=a%26b+c%20d+e%2Bf");
    }

    #[test]
    fn test_unknown_param_rejected() {
        let params = ParameterSet::new().with("rcn", 1).with("bogus", "x");
        let err = apply_query_string("http://cse/x", &params).unwrap_err();
        assert!(matches!(err, OneM2MError::UnknownParameter(name) if name == "bogus"));
    }

    #[test]
    fn test_generated_rqis_unique() {
        let resolver = ParameterResolver::new(Some("http://cse".into()), ParameterSet::new());
        let ids: HashSet<_> = (0..1000)
            .map(|_| {
                resolver
                    .resolve(Operation::Retrieve, None, None)
                    .unwrap()
                    .params
                    .request_id()
                    .unwrap()
            })
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    proptest! {
        #[test]
        fn prop_query_order_follows_insertion(
            keys in proptest::sample::subsequence(vec!["rcn", "fu", "ty", "lim", "lbl", "drt"], 1..6)
                .prop_shuffle(),
        ) {
            let params: ParameterSet = keys.iter().enumerate().map(|(i, k)| (*k, i as i64)).collect();
            let target = apply_query_string("http://cse/base?old=1", &params).unwrap();
            let expected = keys
                .iter()
                .enumerate()
                .map(|(i, k)| format!("{k}={i}"))
                .collect::<Vec<_>>()
                .join("&");
            prop_assert_eq!(target, format!("http://cse/base?{expected}"));
        }
    }
}
