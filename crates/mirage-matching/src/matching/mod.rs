//! Strongest-match selection.
//!
//! The selector walks the simulation once per request, scoring every pair and
//! keeping the strongest match, the closest miss and the facts the
//! cacheability rule needs. See [`strongest_match`] for the contract.
//!
//! # Module Structure
//!
//! - `evaluator` - applies one pair's compiled matcher to one request
//! - `strongest` - the selection loop and cacheability reduction
//! - `closest_miss` - the miss diagnostic and its textual rendering

mod closest_miss;
mod evaluator;
mod strongest;

pub use closest_miss::{ClosestMiss, MatchError};
pub use strongest::{strongest_match, MatchResult};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request fields a matcher can miss on.
///
/// Declaration order is the canonical order: missed-field lists are reported
/// in this order with no duplicates, and the diagnostic renderer relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Body,
    Path,
    Method,
    Destination,
    Query,
    Headers,
    Scheme,
    State,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Body => "body",
            Field::Path => "path",
            Field::Method => "method",
            Field::Destination => "destination",
            Field::Query => "query",
            Field::Headers => "headers",
            Field::Scheme => "scheme",
            Field::State => "state",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
