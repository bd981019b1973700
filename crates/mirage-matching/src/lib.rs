//! Request-matching core for the Mirage service-virtualization engine.
//!
//! In simulate mode the surrounding proxy must answer every intercepted
//! request from a user-authored library of matcher/response pairs. This crate
//! is the decision procedure: given an immutable request snapshot, a
//! [`Simulation`] and an ambient state map, [`strongest_match`] decides which
//! pair wins, explains the closest miss when nothing matches, and reports
//! whether the outcome is safe to memoize in a scalar-keyed response cache.
//!
//! # Design Goals
//!
//! 1. **Hoverfly compatibility**: matcher semantics, tie-breaking and the
//!    textual miss diagnostic are byte-compatible with Hoverfly, so existing
//!    simulations and tooling keep working.
//! 2. **Totality**: selection never fails. Malformed patterns (bad regex,
//!    unparseable JSON) degrade to never-matching at ingress.
//! 3. **Concurrency**: matchers compile once at ingress into immutable shared
//!    state; any number of callers may run [`strongest_match`] in parallel
//!    against the same simulation snapshot.
//!
//! # Module Structure
//!
//! - `request` - inbound request snapshot and canonical forms
//! - `matcher` - the field-matcher kernel (exact, glob, regex, ...)
//! - `simulation` - matcher/response pairs and the simulation container
//! - `matching` - the strongest-match selector, cacheability analysis and
//!   closest-miss reporting

pub mod matcher;
pub mod matching;
pub mod request;
pub mod simulation;

pub use matcher::{FieldMatchers, MatcherView};
pub use matching::{strongest_match, ClosestMiss, Field, MatchError, MatchResult};
pub use request::RequestDetails;
pub use simulation::{RequestMatcher, RequestResponsePair, ResponseDetails, Simulation};
