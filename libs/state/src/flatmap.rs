//! Flat attribute paths.
//!
//! Nested values become dotted paths the way the engine's legacy state did:
//! `tags.foo`, `network.0.uuid`, with `name.#` holding list lengths and
//! `name.%` holding map sizes. Nulls are omitted.

use std::collections::BTreeMap;

use serde_json::Value;

/// Flatten a resource's `values` object.
pub fn flatten(values: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    if let Value::Object(map) = values {
        for (key, value) in map {
            flatten_into(&mut out, key, value);
        }
    }
    out
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Array(items) => {
            out.insert(format!("{prefix}.#"), items.len().to_string());
            for (idx, item) in items.iter().enumerate() {
                flatten_into(out, &format!("{prefix}.{idx}"), item);
            }
        }
        Value::Object(map) => {
            out.insert(format!("{prefix}.%"), map.len().to_string());
            for (key, item) in map {
                flatten_into(out, &format!("{prefix}.{key}"), item);
            }
        }
    }
}

/// Whether `path` is `prefix` itself or lies beneath it.
pub fn path_within(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_scalars_maps_and_lists() {
        let flat = flatten(&json!({
            "name": "vpc",
            "shared": false,
            "size": 8,
            "missing": null,
            "tags": {"foo": "bar", "key": "value"},
            "network": [{"uuid": "n-1", "fixed_ip_v4": ""}]
        }));

        assert_eq!(flat["name"], "vpc");
        assert_eq!(flat["shared"], "false");
        assert_eq!(flat["size"], "8");
        assert!(!flat.contains_key("missing"));
        assert_eq!(flat["tags.%"], "2");
        assert_eq!(flat["tags.foo"], "bar");
        assert_eq!(flat["network.#"], "1");
        assert_eq!(flat["network.0.uuid"], "n-1");
        assert_eq!(flat["network.0.fixed_ip_v4"], "");
    }

    #[test]
    fn test_empty_list_has_zero_count() {
        let flat = flatten(&json!({"rules": []}));
        assert_eq!(flat["rules.#"], "0");
    }

    #[test]
    fn test_path_within_respects_segments() {
        assert!(path_within("flavor", "flavor"));
        assert!(path_within("flavor.0.num", "flavor"));
        assert!(!path_within("flavor_ref", "flavor"));
    }
}
