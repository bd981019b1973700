//! Field-matcher kernel.
//!
//! A request field is constrained by a *chain* of matchers, all of which must
//! accept the field's value (conjunction). Each matcher is authored as a
//! [`MatcherView`] (`{matcher, value, config}`) and compiled at ingress into a
//! [`CompiledMatcher`], the runtime form the evaluator dispatches over.
//!
//! Compilation never aborts ingress: an unknown matcher tag or a pattern that
//! fails to compile degrades to [`CompiledMatcher::Unmatchable`] with a
//! warning, so selection stays total (Hoverfly-compatible behavior).
//!
//! # Module Structure
//!
//! - `glob` - shell-style `*`/`?` patterns, compiled to anchored regexes
//! - `json` - `json`, `jsonpath` and `jsonPartial` structural matchers
//! - `xml` - `xml` structural equality and `xpath` selection
//! - `form` - `application/x-www-form-urlencoded` body matching

mod form;
mod glob;
mod json;
mod xml;

pub(crate) use glob::GlobPattern;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Serialized form of a single field matcher.
///
/// `value` is an arbitrary JSON value because the structural matchers
/// (`json`, `jsonPartial`, `form`) take objects as patterns. `config` carries
/// matcher-specific tuning and is rendered as `null` when absent; the
/// closest-miss report depends on that, so it must not be skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherView {
    pub matcher: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub config: Option<Value>,
}

impl MatcherView {
    pub fn new(matcher: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            matcher: matcher.into(),
            value: value.into(),
            config: None,
        }
    }
}

/// A conjunction chain of matchers for one request field.
///
/// Serializes as a plain array. Deserialization additionally accepts the
/// legacy single-object form carrying `exactMatch`/`globMatch`/`regexMatch`
/// pointers; those are normalized into a chain on ingress and never survive
/// past deserialization. When a legacy object also carries a typed
/// `matcher`/`value` pair, the typed pair is canonical and the pointers are
/// dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldMatchers {
    pub matchers: Vec<MatcherView>,
}

impl FieldMatchers {
    pub fn new(matchers: Vec<MatcherView>) -> Self {
        Self { matchers }
    }

    pub fn exact(value: impl Into<String>) -> Self {
        Self::new(vec![MatcherView::new("exact", value.into())])
    }

    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::new(vec![MatcherView::new("glob", pattern.into())])
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::new(vec![MatcherView::new("regex", pattern.into())])
    }

    pub fn contains(value: impl Into<String>) -> Self {
        Self::new(vec![MatcherView::new("contains", value.into())])
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl<'de> Deserialize<'de> for FieldMatchers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(FieldMatchersRaw::deserialize(deserializer)?.into())
    }
}

/// Raw deserialization shape accepting both the chain form and the legacy
/// single-object form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldMatchersRaw {
    Chain(Vec<MatcherView>),
    Legacy(LegacyFieldMatcher),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyFieldMatcher {
    matcher: Option<String>,
    value: Option<Value>,
    config: Option<Value>,
    exact_match: Option<String>,
    glob_match: Option<String>,
    regex_match: Option<String>,
}

impl From<FieldMatchersRaw> for FieldMatchers {
    fn from(raw: FieldMatchersRaw) -> Self {
        match raw {
            FieldMatchersRaw::Chain(matchers) => FieldMatchers::new(matchers),
            FieldMatchersRaw::Legacy(legacy) => {
                if let Some(matcher) = legacy.matcher {
                    return FieldMatchers::new(vec![MatcherView {
                        matcher,
                        value: legacy.value.unwrap_or(Value::Null),
                        config: legacy.config,
                    }]);
                }

                let mut matchers = Vec::new();
                if let Some(exact) = legacy.exact_match {
                    matchers.push(MatcherView::new("exact", exact));
                }
                if let Some(glob) = legacy.glob_match {
                    matchers.push(MatcherView::new("glob", glob));
                }
                if let Some(regex) = legacy.regex_match {
                    matchers.push(MatcherView::new("regex", regex));
                }
                FieldMatchers::new(matchers)
            }
        }
    }
}

/// Ingress diagnostics for patterns that cannot be compiled. These are logged,
/// never surfaced: the offending matcher simply never matches.
#[derive(Debug, thiserror::Error)]
pub enum MatcherCompileError {
    #[error("invalid regex pattern {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("unknown matcher type {0:?}")]
    UnknownMatcher(String),
}

/// A pattern string with its pre-computed lowercase form, so case-insensitive
/// fields (scheme) do not lowercase the pattern on every evaluation.
#[derive(Debug, Clone)]
pub(crate) struct CachedPattern {
    value: String,
    lower: String,
}

impl CachedPattern {
    pub(crate) fn new(value: String) -> Self {
        let lower = value.to_lowercase();
        Self { value, lower }
    }

    #[inline]
    pub(crate) fn equals(&self, actual: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            actual == self.value
        } else {
            actual.to_lowercase() == self.lower
        }
    }

    #[inline]
    pub(crate) fn contained_in(&self, actual: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            actual.contains(&self.value)
        } else {
            actual.to_lowercase().contains(&self.lower)
        }
    }
}

/// Compiled form of one matcher, ready for evaluation.
///
/// The kernel is pure: evaluation performs no I/O and keeps no mutable state,
/// so compiled matchers can be shared freely across threads.
#[derive(Debug, Clone)]
pub(crate) enum CompiledMatcher {
    Exact(CachedPattern),
    Contains(CachedPattern),
    Glob(GlobPattern),
    Regex(Arc<Regex>),
    Xml(String),
    Xpath(String),
    Json(Value),
    JsonPath(String),
    JsonPartial(Value),
    Form(Value),
    /// Unknown tag or a pattern that failed to compile. Never matches.
    Unmatchable,
}

impl CompiledMatcher {
    /// Compile a matcher view. Tags are case-sensitive.
    pub(crate) fn compile(view: &MatcherView) -> Result<Self, MatcherCompileError> {
        match view.matcher.as_str() {
            "exact" => Ok(Self::Exact(CachedPattern::new(pattern_text(&view.value)))),
            "contains" => Ok(Self::Contains(CachedPattern::new(pattern_text(&view.value)))),
            "glob" => {
                let pattern = pattern_text(&view.value);
                GlobPattern::compile(&pattern)
                    .map(Self::Glob)
                    .map_err(|source| MatcherCompileError::InvalidGlob { pattern, source })
            }
            "regex" => {
                let pattern = pattern_text(&view.value);
                Regex::new(&pattern)
                    .map(|regex| Self::Regex(Arc::new(regex)))
                    .map_err(|source| MatcherCompileError::InvalidRegex { pattern, source })
            }
            "xml" => Ok(Self::Xml(pattern_text(&view.value))),
            "xpath" => Ok(Self::Xpath(pattern_text(&view.value))),
            "json" => Ok(Self::Json(view.value.clone())),
            "jsonpath" => Ok(Self::JsonPath(pattern_text(&view.value))),
            "jsonPartial" => Ok(Self::JsonPartial(view.value.clone())),
            "form" => Ok(Self::Form(view.value.clone())),
            other => Err(MatcherCompileError::UnknownMatcher(other.to_string())),
        }
    }

    /// Evaluate against a concrete field value.
    ///
    /// `case_sensitive` applies to `exact`, `contains` and `glob`; regex
    /// patterns express case-insensitivity in the pattern itself and the
    /// structural matchers define their own equivalence.
    pub(crate) fn matches(&self, actual: &str, case_sensitive: bool) -> bool {
        match self {
            Self::Exact(pattern) => pattern.equals(actual, case_sensitive),
            Self::Contains(pattern) => pattern.contained_in(actual, case_sensitive),
            Self::Glob(pattern) => pattern.matches(actual, case_sensitive),
            Self::Regex(regex) => regex.is_match(actual),
            Self::Xml(pattern) => xml::xml_equals(actual, pattern),
            Self::Xpath(expression) => xml::xpath_selects(actual, expression),
            Self::Json(pattern) => json::json_equals(actual, pattern),
            Self::JsonPath(expression) => json::json_path_selects(actual, expression).is_some(),
            Self::JsonPartial(pattern) => json::json_partial_matches(actual, pattern),
            Self::Form(pattern) => form::form_matches(actual, pattern),
            Self::Unmatchable => false,
        }
    }
}

/// Compile a whole chain, degrading failures to never-matching entries.
pub(crate) fn compile_chain(field: &'static str, chain: &FieldMatchers) -> Vec<CompiledMatcher> {
    chain
        .matchers
        .iter()
        .map(|view| match CompiledMatcher::compile(view) {
            Ok(compiled) => compiled,
            Err(error) => {
                warn!(field, matcher = %view.matcher, %error, "matcher failed to compile and will never match");
                CompiledMatcher::Unmatchable
            }
        })
        .collect()
}

/// The textual form of a pattern value: strings verbatim, scalars via their
/// display form, structures as compact JSON.
pub(crate) fn pattern_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
