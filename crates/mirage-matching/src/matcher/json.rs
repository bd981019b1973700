//! JSON structural matchers: `json`, `jsonpath` and `jsonPartial`.

use serde_json::Value;

/// Semantic JSON equality: both sides parse and compare as documents, so key
/// order and insignificant whitespace are irrelevant. A string-typed pattern
/// is itself parsed as JSON first (patterns usually arrive as raw text).
pub(super) fn json_equals(actual: &str, pattern: &Value) -> bool {
    let Ok(actual) = serde_json::from_str::<Value>(actual) else {
        return false;
    };
    match normalized_pattern(pattern) {
        Some(expected) => actual == expected,
        None => false,
    }
}

/// Partial JSON match: every key in the pattern must be present in the actual
/// document with an equal or recursively partially-equal value. Arrays compare
/// elementwise and must have equal length; extra keys in the actual document
/// are allowed.
pub(super) fn json_partial_matches(actual: &str, pattern: &Value) -> bool {
    let Ok(actual) = serde_json::from_str::<Value>(actual) else {
        return false;
    };
    match normalized_pattern(pattern) {
        Some(expected) => json_contains(&actual, &expected),
        None => false,
    }
}

fn normalized_pattern(pattern: &Value) -> Option<Value> {
    match pattern {
        Value::String(text) => serde_json::from_str(text).ok(),
        other => Some(other.clone()),
    }
}

fn json_contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => {
            expected.iter().all(|(key, expected_value)| {
                actual
                    .get(key)
                    .is_some_and(|actual_value| json_contains(actual_value, expected_value))
            })
        }
        (Value::Array(actual), Value::Array(expected)) => {
            actual.len() == expected.len()
                && actual
                    .iter()
                    .zip(expected.iter())
                    .all(|(a, e)| json_contains(a, e))
        }
        _ => actual == expected,
    }
}

/// Extract a value from a JSON document using a dotted-path expression.
///
/// Supports:
/// - `$.field` - top-level field
/// - `$.field.nested` - nested field
/// - `$.array[0]` - array index
/// - `$.array[*].field` - all elements' field (first match wins)
///
/// Returns `None` when the body is not JSON or the path selects nothing, so a
/// `jsonpath` matcher is simply "does this path select anything".
pub(super) fn json_path_selects(body: &str, path: &str) -> Option<String> {
    let document: Value = serde_json::from_str(body).ok()?;

    let path = path.strip_prefix("$.").unwrap_or(path);
    let path = path.strip_prefix('$').unwrap_or(path);

    let value = navigate(&document, path)?;
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some("null".to_string()),
        other => Some(other.to_string()),
    }
}

fn navigate<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    if let Some(rest) = path.strip_prefix('[') {
        let (index, rest) = rest.split_once(']')?;
        let rest = rest.strip_prefix('.').unwrap_or(rest);

        if index == "*" {
            // Wildcard: first element the remaining path resolves against.
            let elements = value.as_array()?;
            return elements.iter().find_map(|element| navigate(element, rest));
        }
        let index: usize = index.parse().ok()?;
        return navigate(value.as_array()?.get(index)?, rest);
    }

    let segment_end = path
        .find(['.', '['])
        .unwrap_or(path.len());
    let (segment, rest) = path.split_at(segment_end);
    let rest = rest.strip_prefix('.').unwrap_or(rest);

    navigate(value.as_object()?.get(segment)?, rest)
}
