//! Shell-style glob patterns.
//!
//! `*` matches any run of characters (including the empty run), `?` matches
//! exactly one character, and the pattern is anchored to both ends. Patterns
//! compile to regexes at ingress; header values reuse these semantics, which
//! degrade to byte equality when the pattern carries no wildcard.

use regex::Regex;

/// A compiled glob pattern.
///
/// Case-insensitive evaluation (used for schemes) matches the lowercased
/// pattern against the lowercased value, so both forms are compiled up front.
#[derive(Debug, Clone)]
pub(crate) struct GlobPattern {
    sensitive: Regex,
    insensitive: Regex,
}

impl GlobPattern {
    pub(crate) fn compile(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            sensitive: Regex::new(&glob_to_regex(pattern))?,
            insensitive: Regex::new(&glob_to_regex(&pattern.to_lowercase()))?,
        })
    }

    pub(crate) fn matches(&self, actual: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.sensitive.is_match(actual)
        } else {
            self.insensitive.is_match(&actual.to_lowercase())
        }
    }
}

/// Translate a glob into an anchored regex. `(?s)` lets `*` and `?` cross
/// newlines, which matters for body patterns.
fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 8);
    regex.push_str("(?s)^");

    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' | '?' => {
                if !literal.is_empty() {
                    regex.push_str(&regex::escape(&literal));
                    literal.clear();
                }
                regex.push_str(if ch == '*' { ".*" } else { "." });
            }
            _ => literal.push(ch),
        }
    }
    if !literal.is_empty() {
        regex.push_str(&regex::escape(&literal));
    }

    regex.push('$');
    regex
}
