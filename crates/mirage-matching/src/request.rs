//! Inbound request snapshot.
//!
//! A [`RequestDetails`] is created by the host for each intercepted request
//! and discarded once matching returns. All fields default to the empty value
//! of their type; an absent field and an empty field are the same thing here
//! (unlike matchers, where absence means "no constraint").

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable snapshot of one inbound HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestDetails {
    pub method: String,
    pub scheme: String,
    /// Target host.
    pub destination: String,
    pub path: String,
    /// Query parameters as an ordered multi-map. Matching never looks at this
    /// map directly; it matches against [`RequestDetails::query_string`].
    pub query: HashMap<String, Vec<String>>,
    pub body: String,
    /// Header names are looked up case-insensitively.
    pub headers: HashMap<String, Vec<String>>,
}

impl RequestDetails {
    /// Canonical query string: keys sorted ascending, one `key=value` segment
    /// per value (in input order), segments joined with `&`. No re-encoding
    /// is applied; values are taken as captured.
    ///
    /// Query matchers run against this form, so `{"q": ["test"]}` is matched
    /// as `q=test` and `{"hit": [""]}` as `hit=`.
    pub fn query_string(&self) -> String {
        let mut keys: Vec<&String> = self.query.keys().collect();
        keys.sort();

        let mut segments = Vec::with_capacity(self.query.len());
        for key in keys {
            for value in &self.query[key] {
                segments.push(format!("{key}={value}"));
            }
        }
        segments.join("&")
    }

    /// Case-insensitive header lookup.
    pub fn header_values(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(actual, _)| actual.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }
}
