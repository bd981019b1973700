//! Per-pair evaluation: apply one compiled request matcher to one request and
//! state map, producing a [`Verdict`].

use super::Field;
use crate::matcher::CompiledMatcher;
use crate::request::RequestDetails;
use crate::simulation::{CompiledHeader, CompiledRequestMatcher};
use std::collections::HashMap;

/// Outcome of evaluating one pair against one request.
///
/// The score counts satisfied constraints: +1 per specified scalar field that
/// matched, +1 per required header name whose patterns all matched, +1 per
/// satisfied state key. Unspecified fields contribute nothing, so more
/// specific matchers outrank less specific ones.
#[derive(Debug)]
pub(super) struct Verdict {
    pub matched: bool,
    pub score: u32,
    /// Fields that failed, in canonical order, each at most once.
    pub missed_fields: Vec<Field>,
    /// Specified scalar fields (method, scheme, destination, path, query,
    /// body) that matched. The cacheability rule needs this: a miss confined
    /// to headers/state only poisons the scalar-keyed cache when the pair
    /// actually matched something the cache key contains.
    pub matched_scalars: u32,
}

impl Verdict {
    pub fn missed_only_headers_or_state(&self) -> bool {
        !self.missed_fields.is_empty()
            && self
                .missed_fields
                .iter()
                .all(|field| matches!(field, Field::Headers | Field::State))
    }
}

struct FieldMatch {
    matched: bool,
    score: u32,
}

pub(super) fn evaluate(
    request: &RequestDetails,
    matcher: &CompiledRequestMatcher,
    state: &HashMap<String, String>,
) -> Verdict {
    let mut verdict = Verdict {
        matched: true,
        score: 0,
        missed_fields: Vec::new(),
        matched_scalars: 0,
    };

    scalar_field(&mut verdict, Field::Body, matcher.body.as_deref(), &request.body, true);
    scalar_field(&mut verdict, Field::Path, matcher.path.as_deref(), &request.path, true);
    scalar_field(&mut verdict, Field::Method, matcher.method.as_deref(), &request.method, true);
    scalar_field(
        &mut verdict,
        Field::Destination,
        matcher.destination.as_deref(),
        &request.destination,
        true,
    );
    scalar_field(
        &mut verdict,
        Field::Query,
        matcher.query.as_deref(),
        &request.query_string(),
        true,
    );

    let headers = header_match(&matcher.headers, request);
    verdict.score += headers.score;
    if !headers.matched {
        verdict.matched = false;
        verdict.missed_fields.push(Field::Headers);
    }

    // A request that carries no scheme neither hits nor misses a scheme
    // matcher; the field is skipped outright. Scheme comparison is
    // case-insensitive.
    if !request.scheme.is_empty() {
        scalar_field(&mut verdict, Field::Scheme, matcher.scheme.as_deref(), &request.scheme, false);
    }

    let state_result = state_match(&matcher.requires_state, state);
    verdict.score += state_result.score;
    if !state_result.matched {
        verdict.matched = false;
        verdict.missed_fields.push(Field::State);
    }

    verdict
}

/// Every matcher in a specified chain must accept the value (conjunction).
/// An unspecified field is a wildcard and scores nothing.
fn scalar_field(
    verdict: &mut Verdict,
    field: Field,
    chain: Option<&[CompiledMatcher]>,
    actual: &str,
    case_sensitive: bool,
) {
    let Some(chain) = chain else {
        return;
    };

    if chain.iter().all(|matcher| matcher.matches(actual, case_sensitive)) {
        verdict.score += 1;
        verdict.matched_scalars += 1;
    } else {
        verdict.matched = false;
        verdict.missed_fields.push(field);
    }
}

/// Each required header name must be present (case-insensitively) and every
/// one of its patterns must match at least one actual value. Names that are
/// fully satisfied score +1 even when another name fails.
fn header_match(required: &[CompiledHeader], request: &RequestDetails) -> FieldMatch {
    let mut result = FieldMatch {
        matched: true,
        score: 0,
    };

    for header in required {
        match request.header_values(&header.name) {
            Some(values) => {
                let satisfied = header
                    .patterns
                    .iter()
                    .all(|pattern| values.iter().any(|value| pattern.matches(value, true)));
                if satisfied {
                    result.score += 1;
                } else {
                    result.matched = false;
                }
            }
            None => result.matched = false,
        }
    }
    result
}

/// Each required key must be present in the ambient state map with an equal
/// value. Satisfied keys score +1 even when another key fails.
fn state_match(required: &[(String, String)], state: &HashMap<String, String>) -> FieldMatch {
    let mut result = FieldMatch {
        matched: true,
        score: 0,
    };

    for (key, value) in required {
        if state.get(key) == Some(value) {
            result.score += 1;
        } else {
            result.matched = false;
        }
    }
    result
}
