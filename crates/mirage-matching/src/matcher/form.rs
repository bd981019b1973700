//! `application/x-www-form-urlencoded` body matching.

use super::pattern_text;
use serde_json::Value;
use std::collections::HashMap;

/// The pattern is an object of field names to expected values; every listed
/// field must be present in the decoded body with at least one equal value.
/// Non-object patterns and bodies that decode to nothing never match.
pub(super) fn form_matches(actual: &str, pattern: &Value) -> bool {
    let Some(expected) = pattern.as_object() else {
        return false;
    };

    let form = parse_form(actual);
    expected.iter().all(|(field, value)| {
        let expected_value = pattern_text(value);
        form.get(field)
            .is_some_and(|values| values.iter().any(|actual| *actual == expected_value))
    })
}

/// Decode a form body into a multi-map. `+` decodes to space and percent
/// escapes are resolved; undecodable sequences are kept verbatim.
fn parse_form(body: &str) -> HashMap<String, Vec<String>> {
    let mut form: HashMap<String, Vec<String>> = HashMap::new();
    for pair in body.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        form.entry(decode_component(key))
            .or_default()
            .push(decode_component(value));
    }
    form
}

fn decode_component(component: &str) -> String {
    let unplused = component.replace('+', " ");
    urlencoding::decode(&unplused)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(unplused)
}
