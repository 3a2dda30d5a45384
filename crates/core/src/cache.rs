//! Per-turn function-call cache.
//!
//! Keyed by function name, then by the canonical form of the arguments. A
//! cache lives for exactly one turn.

use crate::dispatch::DispatchOutcome;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

/// Serializes `value` with object keys sorted at every level and no
/// insignificant whitespace, so equal argument objects always produce the
/// same key.
pub fn canonical_arguments(value: &JsonValue) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let sorted: BTreeMap<&String, JsonValue> =
                map.iter().map(|(k, v)| (k, canonicalize(v))).collect();
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k.clone(), v);
            }
            JsonValue::Object(out)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[derive(Debug, Default)]
pub struct FunctionCallCache {
    entries: HashMap<String, HashMap<String, DispatchOutcome>>,
}

impl FunctionCallCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, function_name: &str, canonical_args: &str) -> Option<&DispatchOutcome> {
        self.entries
            .get(function_name)
            .and_then(|by_args| by_args.get(canonical_args))
    }

    pub fn insert(&mut self, function_name: &str, canonical_args: String, outcome: DispatchOutcome) {
        self.entries
            .entry(function_name.to_string())
            .or_default()
            .insert(canonical_args, outcome);
    }
}

#[cfg(test)]
impl FunctionCallCache {
    /// Number of distinct (function, arguments) pairs recorded.
    fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_form_ignores_key_order_and_whitespace() {
        let a: JsonValue =
            serde_json::from_str(r#"{"language": "zh-HK",   "input_text": "黑社會"}"#).unwrap();
        let b: JsonValue =
            serde_json::from_str("{\n  \"input_text\": \"黑社會\",\n  \"language\": \"zh-HK\"\n}")
                .unwrap();
        assert_eq!(canonical_arguments(&a), canonical_arguments(&b));
        assert_eq!(
            canonical_arguments(&a),
            r#"{"input_text":"黑社會","language":"zh-HK"}"#
        );
    }

    #[test]
    fn canonical_form_sorts_nested_objects() {
        let value = json!({"b": [{"z": 1, "a": 2}], "a": {"y": true, "x": null}});
        assert_eq!(
            canonical_arguments(&value),
            r#"{"a":{"x":null,"y":true},"b":[{"a":2,"z":1}]}"#
        );
    }

    #[test]
    fn cache_is_keyed_by_function_and_arguments() {
        let mut cache = FunctionCallCache::new();
        let args = canonical_arguments(&json!({"input_text": "成本很低", "language": "zh-CN"}));
        cache.insert(
            "transliterate",
            args.clone(),
            DispatchOutcome::shown("chéngběn hěn dī"),
        );

        assert_eq!(
            cache.get("transliterate", &args).map(|o| o.result.as_str()),
            Some("chéngběn hěn dī")
        );
        assert!(cache.get("breakdown", &args).is_none());
        assert!(cache.get("transliterate", "{}").is_none());
        assert_eq!(cache.len(), 1);
    }
}
