//! The strongest-match selection loop and cacheability reduction.

use super::closest_miss::{ClosestMiss, MatchError};
use super::evaluator::evaluate;
use super::Field;
use crate::request::RequestDetails;
use crate::simulation::{RequestResponsePair, Simulation};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Result of one selection. Exactly one of `pair` and `error` is set when the
/// simulation is non-empty; both are absent for an empty simulation.
/// `cachable` is meaningful on both paths.
#[derive(Debug)]
pub struct MatchResult<'a> {
    /// The winning pair, a reference into the simulation.
    pub pair: Option<&'a RequestResponsePair>,
    /// The miss diagnostic when nothing matched.
    pub error: Option<MatchError>,
    /// Whether the outcome may be memoized in a cache keyed on the scalar
    /// request fields (method, scheme, destination, path, query, body).
    pub cachable: bool,
}

/// Pick the pair that matches the request with the highest score.
///
/// Pairs are evaluated in insertion order. Among matching pairs the highest
/// score wins and ties go to the earliest pair; finding any match permanently
/// clears the closest miss. When nothing matches, the best-scoring miss is
/// returned as a [`MatchError`] carrying a [`ClosestMiss`] diagnostic.
///
/// Headers and ambient state are not part of the host's response-cache key,
/// so the result is marked non-cachable whenever a header or state change
/// alone could flip the outcome: some pair missed only on headers and/or
/// state while matching at least one specified scalar field, or the winning
/// pair requires state.
///
/// `stateful` signals that the host intends to apply the winning response's
/// state transitions; evaluation is identical either way and the flag is only
/// carried through.
///
/// Selection is total and deterministic: same inputs, same output, including
/// the diagnostic rendering. The simulation must be a stable snapshot for the
/// duration of the call; no other synchronization is needed.
pub fn strongest_match<'a>(
    request: &RequestDetails,
    stateful: bool,
    simulation: &'a Simulation,
    state: &HashMap<String, String>,
) -> MatchResult<'a> {
    let mut strongest: Option<(&'a RequestResponsePair, u32)> = None;
    let mut closest: Option<(&'a RequestResponsePair, u32, Vec<Field>)> = None;
    let mut header_or_state_near_miss = false;

    for (index, pair) in simulation.pairs().iter().enumerate() {
        let verdict = evaluate(request, pair.compiled(), state);
        trace!(
            pair = index,
            matched = verdict.matched,
            score = verdict.score,
            "evaluated pair"
        );

        if verdict.matched {
            let stronger = strongest.map_or(true, |(_, best)| verdict.score > best);
            if stronger {
                strongest = Some((pair, verdict.score));
            }
            // A match anywhere in the scan invalidates miss reporting, even
            // when it scores below an earlier near-miss.
            closest = None;
        } else {
            if verdict.missed_only_headers_or_state() && verdict.matched_scalars > 0 {
                header_or_state_near_miss = true;
            }
            if strongest.is_none() {
                let closer = closest
                    .as_ref()
                    .map_or(true, |(_, best, _)| verdict.score > *best);
                if closer {
                    closest = Some((pair, verdict.score, verdict.missed_fields));
                }
            }
        }
    }

    let winner = strongest.map(|(pair, _)| pair);
    let cachable =
        !header_or_state_near_miss && !winner.is_some_and(|pair| pair.request_matcher.requires_state());

    debug!(
        stateful,
        matched = winner.is_some(),
        cachable,
        pairs = simulation.len(),
        "strongest-match selection finished"
    );

    match (winner, closest) {
        (Some(pair), _) => MatchResult {
            pair: Some(pair),
            error: None,
            cachable,
        },
        (None, Some((pair, _, missed_fields))) => MatchResult {
            pair: None,
            error: Some(MatchError::new(ClosestMiss::new(
                request,
                state,
                pair,
                missed_fields,
            ))),
            cachable,
        },
        (None, None) => MatchResult {
            pair: None,
            error: None,
            cachable,
        },
    }
}
