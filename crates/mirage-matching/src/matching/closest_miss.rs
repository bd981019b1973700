//! The closest-miss diagnostic and its textual rendering.

use super::Field;
use crate::request::RequestDetails;
use crate::simulation::{RequestMatcher, RequestResponsePair, ResponseDetails};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::{BTreeMap, HashMap};

/// Returned when no pair in the simulation matched the request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Could not find a match for request, create or record a new pair first")]
pub struct MatchError {
    pub closest_miss: ClosestMiss,
}

impl MatchError {
    pub(super) fn new(closest_miss: ClosestMiss) -> Self {
        Self { closest_miss }
    }
}

/// The best-scoring pair that failed to match, captured with enough context
/// to explain the miss after the request snapshot is gone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosestMiss {
    pub request: RequestDetails,
    pub request_matcher: RequestMatcher,
    pub response: ResponseDetails,
    pub state: BTreeMap<String, String>,
    /// Canonical order, no duplicates.
    pub missed_fields: Vec<Field>,
}

impl ClosestMiss {
    pub(super) fn new(
        request: &RequestDetails,
        state: &HashMap<String, String>,
        pair: &RequestResponsePair,
        missed_fields: Vec<Field>,
    ) -> Self {
        Self {
            request: request.clone(),
            request_matcher: pair.request_matcher.clone(),
            response: pair.response.clone(),
            state: state
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            missed_fields,
        }
    }

    /// Render the human-readable diagnostic.
    ///
    /// The layout is byte-compatible with Hoverfly's output so tooling that
    /// parses it keeps working: literal headings, four-space JSON indentation,
    /// fixed key order per section, map keys sorted. Rendering is pure; the
    /// whitespace is covered by golden tests.
    pub fn message(&self) -> String {
        let missed: Vec<&str> = self.missed_fields.iter().map(|field| field.as_str()).collect();
        format!(
            "\n\nThe following request was made, but was not matched by Hoverfly:\n\n{}\n\n\
             Whilst Hoverfly has the following state:\n\n{}\n\n\
             The matcher which came closest was:\n\n{}\n\n\
             But it did not match on the following fields:\n\n[{}]\n\n\
             Which if hit would have given the following response:\n\n{}",
            pretty_json(&RequestView::from(&self.request)),
            pretty_json(&self.state),
            pretty_json(&self.request_matcher),
            missed.join(", "),
            pretty_json(&ResponseView::from(&self.response)),
        )
    }
}

/// Request rendering for the report: fixed field order, sorted map keys.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RequestView {
    path: String,
    method: String,
    destination: String,
    scheme: String,
    query: BTreeMap<String, Vec<String>>,
    body: String,
    headers: BTreeMap<String, Vec<String>>,
}

impl From<&RequestDetails> for RequestView {
    fn from(request: &RequestDetails) -> Self {
        Self {
            path: request.path.clone(),
            method: request.method.clone(),
            destination: request.destination.clone(),
            scheme: request.scheme.clone(),
            query: sorted(&request.query),
            body: request.body.clone(),
            headers: sorted(&request.headers),
        }
    }
}

/// Response rendering for the report.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseView {
    status: u16,
    body: String,
    encoded_body: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, Vec<String>>,
    templated: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    transitions_state: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    removes_state: Vec<String>,
}

impl From<&ResponseDetails> for ResponseView {
    fn from(response: &ResponseDetails) -> Self {
        Self {
            status: response.status,
            body: response.body.clone(),
            encoded_body: response.encoded_body,
            headers: sorted(&response.headers),
            templated: response.templated,
            transitions_state: response
                .transitions_state
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            removes_state: response.removes_state.clone(),
        }
    }
}

fn sorted(map: &HashMap<String, Vec<String>>) -> BTreeMap<String, Vec<String>> {
    map.iter()
        .map(|(key, values)| (key.clone(), values.clone()))
        .collect()
}

/// Four-space pretty printing, matching the report contract.
fn pretty_json<T: Serialize>(value: &T) -> String {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    if value.serialize(&mut serializer).is_err() {
        return String::new();
    }
    String::from_utf8(out).unwrap_or_default()
}
