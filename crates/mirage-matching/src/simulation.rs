//! The user-authored simulation model: request matchers, responses, pairs and
//! the simulation container.
//!
//! Pairs are value objects. Matcher patterns are compiled once when a pair is
//! constructed (or deserialized); the compiled form is immutable and shared,
//! so any number of selector calls can evaluate the same pair concurrently.
//! The container itself is not synchronized; administrative mutation must be
//! serialized against readers by the host, typically by handing readers a
//! [`Simulation::snapshot`].

use crate::matcher::{compile_chain, CompiledMatcher, FieldMatchers, GlobPattern};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Matching constraints for one pair. Absent fields are wildcards.
///
/// Field order matters: the closest-miss report serializes this type
/// directly, and its key order is part of the diagnostic contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestMatcher {
    #[serde(skip_serializing_if = "chain_is_empty")]
    pub path: Option<FieldMatchers>,
    #[serde(skip_serializing_if = "chain_is_empty")]
    pub method: Option<FieldMatchers>,
    #[serde(skip_serializing_if = "chain_is_empty")]
    pub destination: Option<FieldMatchers>,
    #[serde(skip_serializing_if = "chain_is_empty")]
    pub scheme: Option<FieldMatchers>,
    #[serde(skip_serializing_if = "chain_is_empty")]
    pub query: Option<FieldMatchers>,
    #[serde(skip_serializing_if = "chain_is_empty")]
    pub body: Option<FieldMatchers>,
    /// Required headers: every listed pattern must match at least one actual
    /// value under the same (case-insensitively compared) name. Values use
    /// glob semantics.
    #[serde(skip_serializing_if = "headers_are_empty")]
    pub headers: Option<BTreeMap<String, Vec<String>>>,
    /// State keys that must be present and equal in the ambient state map.
    #[serde(skip_serializing_if = "state_is_empty")]
    pub requires_state: Option<BTreeMap<String, String>>,
}

impl RequestMatcher {
    pub(crate) fn requires_state(&self) -> bool {
        !state_is_empty(&self.requires_state)
    }
}

fn chain_is_empty(chain: &Option<FieldMatchers>) -> bool {
    chain.as_ref().map_or(true, FieldMatchers::is_empty)
}

fn headers_are_empty(headers: &Option<BTreeMap<String, Vec<String>>>) -> bool {
    headers.as_ref().map_or(true, BTreeMap::is_empty)
}

fn state_is_empty(state: &Option<BTreeMap<String, String>>) -> bool {
    state.as_ref().map_or(true, BTreeMap::is_empty)
}

/// The recorded response a pair returns when it wins.
///
/// Opaque to matching; the selector carries it from input to output verbatim.
/// `transitions_state` and `removes_state` are applied to the ambient state
/// map by the host after a stateful match; the core never mutates state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseDetails {
    pub status: u16,
    pub body: String,
    /// True when `body` is base64-encoded binary.
    pub encoded_body: bool,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, Vec<String>>,
    pub templated: bool,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub transitions_state: HashMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removes_state: Vec<String>,
}

/// One matcher/response pair. The compiled matcher is built at construction
/// and rebuilt on deserialization; it never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RequestResponsePairShape")]
pub struct RequestResponsePair {
    pub request_matcher: RequestMatcher,
    pub response: ResponseDetails,
    #[serde(skip)]
    compiled: CompiledRequestMatcher,
}

impl RequestResponsePair {
    pub fn new(request_matcher: RequestMatcher, response: ResponseDetails) -> Self {
        let compiled = CompiledRequestMatcher::compile(&request_matcher);
        Self {
            request_matcher,
            response,
            compiled,
        }
    }

    pub(crate) fn compiled(&self) -> &CompiledRequestMatcher {
        &self.compiled
    }
}

impl PartialEq for RequestResponsePair {
    fn eq(&self, other: &Self) -> bool {
        // The compiled form is derived state.
        self.request_matcher == other.request_matcher && self.response == other.response
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RequestResponsePairShape {
    request_matcher: RequestMatcher,
    response: ResponseDetails,
}

impl From<RequestResponsePairShape> for RequestResponsePair {
    fn from(shape: RequestResponsePairShape) -> Self {
        Self::new(shape.request_matcher, shape.response)
    }
}

/// Runtime form of a [`RequestMatcher`]: per-field compiled chains plus the
/// header and state requirements in lookup-ready shape.
#[derive(Debug, Clone, Default)]
pub(crate) struct CompiledRequestMatcher {
    pub(crate) body: Option<Vec<CompiledMatcher>>,
    pub(crate) path: Option<Vec<CompiledMatcher>>,
    pub(crate) method: Option<Vec<CompiledMatcher>>,
    pub(crate) destination: Option<Vec<CompiledMatcher>>,
    pub(crate) query: Option<Vec<CompiledMatcher>>,
    pub(crate) scheme: Option<Vec<CompiledMatcher>>,
    pub(crate) headers: Vec<CompiledHeader>,
    pub(crate) requires_state: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledHeader {
    /// Lowercased header name.
    pub(crate) name: String,
    pub(crate) patterns: Vec<CompiledMatcher>,
}

impl CompiledRequestMatcher {
    fn compile(matcher: &RequestMatcher) -> Self {
        let headers = matcher
            .headers
            .iter()
            .flatten()
            .map(|(name, patterns)| CompiledHeader {
                name: name.to_lowercase(),
                patterns: patterns
                    .iter()
                    .map(|pattern| match GlobPattern::compile(pattern) {
                        Ok(glob) => CompiledMatcher::Glob(glob),
                        Err(error) => {
                            warn!(header = %name, %error, "header pattern failed to compile and will never match");
                            CompiledMatcher::Unmatchable
                        }
                    })
                    .collect(),
            })
            .collect();

        let requires_state = matcher
            .requires_state
            .iter()
            .flatten()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            body: compile_field("body", &matcher.body),
            path: compile_field("path", &matcher.path),
            method: compile_field("method", &matcher.method),
            destination: compile_field("destination", &matcher.destination),
            query: compile_field("query", &matcher.query),
            scheme: compile_field("scheme", &matcher.scheme),
            headers,
            requires_state,
        }
    }
}

/// An empty chain is treated as unspecified: it constrains nothing and must
/// not contribute to the match score.
fn compile_field(field: &'static str, chain: &Option<FieldMatchers>) -> Option<Vec<CompiledMatcher>> {
    chain
        .as_ref()
        .filter(|chain| !chain.is_empty())
        .map(|chain| compile_chain(field, chain))
}

/// Append-only, insertion-ordered collection of pairs plus a metadata bag.
///
/// Insertion order is stable and serves as the final tie-breaker during
/// selection. Not safe for concurrent writers; readers either hold the host's
/// read lock or work on a [`Simulation::snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Simulation {
    pairs: Vec<RequestResponsePair>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    metadata: HashMap<String, String>,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pair(&mut self, pair: RequestResponsePair) {
        self.pairs.push(pair);
    }

    /// Pairs in insertion order. Pairs are never mutated after insertion.
    pub fn pairs(&self) -> &[RequestResponsePair] {
        &self.pairs
    }

    /// Remove every pair. Metadata is kept; it describes the simulation, not
    /// its contents.
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Copy for hand-off to a reader. Compiled patterns are shared, so this
    /// is cheap relative to recompiling.
    pub fn snapshot(&self) -> Simulation {
        self.clone()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }
}
