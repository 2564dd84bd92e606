//! Tag payloads.
//!
//! Services return tags in one of two shapes: a plain object
//! (`{"tags": {"k": "v"}}`) or a list of pairs
//! (`{"tags": [{"key": "k", "value": "v"}]}`).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::SdkError;

/// Wire shape of a tag listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagShape {
    Map,
    KeyValueList,
}

/// Extract tags from a response body.
///
/// A missing or null `tags` member yields an empty map.
///
/// # Errors
///
/// Fails when `tags` has the wrong shape.
pub fn parse_tags(
    body: &Value,
    shape: TagShape,
    url: &str,
) -> Result<BTreeMap<String, String>, SdkError> {
    let tags = match body.get("tags") {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(tags) => tags,
    };

    match shape {
        TagShape::Map => {
            let object = tags
                .as_object()
                .ok_or_else(|| SdkError::decode(url, "tags is not an object"))?;
            Ok(object
                .iter()
                .map(|(k, v)| (k.clone(), scalar(v)))
                .collect())
        }
        TagShape::KeyValueList => {
            let items = tags
                .as_array()
                .ok_or_else(|| SdkError::decode(url, "tags is not a list"))?;
            items
                .iter()
                .map(|item| {
                    let key = item
                        .get("key")
                        .and_then(Value::as_str)
                        .ok_or_else(|| SdkError::decode(url, "tag without key"))?;
                    let value = item.get("value").map(scalar).unwrap_or_default();
                    Ok((key.to_string(), value))
                })
                .collect()
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
