//! Free-text approval classification.
//!
//! Replies are matched against two keyword tables with word-boundary
//! regexes. Approve wins over reject when both match.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

/// Classification of a human reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
    Unknown,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Approve => write!(f, "approve"),
            Decision::Reject => write!(f, "reject"),
            Decision::Unknown => write!(f, "unknown"),
        }
    }
}

/// Keyword tables for both outcomes. Loadable from TOML; missing keys use
/// the built-in lists.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PatternTable {
    pub approve: Vec<String>,
    pub reject: Vec<String>,
}

impl Default for PatternTable {
    fn default() -> Self {
        let owned =
            |words: &[&str]| -> Vec<String> { words.iter().map(|w| w.to_string()).collect() };
        Self {
            approve: owned(&[
                "yes",
                "y",
                "approve",
                "approved",
                "ok",
                "okay",
                "agree",
                "accepted",
                "accept",
                "looks good",
                "ship it",
            ]),
            reject: owned(&[
                "no",
                "n",
                "reject",
                "rejected",
                "disagree",
                "not ok",
                "needs changes",
                "question",
                "questions",
                "deny",
                "denied",
            ]),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("{0} pattern list is empty")]
    Empty(&'static str),
    #[error("invalid {kind} pattern: {source}")]
    Regex {
        kind: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Compiled decision router.
#[derive(Debug, Clone)]
pub struct Router {
    approve: Regex,
    reject: Regex,
}

impl Router {
    pub fn new(table: &PatternTable) -> Result<Self, RouterError> {
        Ok(Self {
            approve: compile("approve", &table.approve)?,
            reject: compile("reject", &table.reject)?,
        })
    }

    pub fn classify(&self, reply: &str) -> Decision {
        let normalized = reply.trim().to_lowercase();
        if self.approve.is_match(&normalized) {
            Decision::Approve
        } else if self.reject.is_match(&normalized) {
            Decision::Reject
        } else {
            Decision::Unknown
        }
    }
}

fn compile(kind: &'static str, words: &[String]) -> Result<Regex, RouterError> {
    if words.is_empty() {
        return Err(RouterError::Empty(kind));
    }
    let alternatives: Vec<String> = words
        .iter()
        .map(|w| regex::escape(&w.trim().to_lowercase()))
        .collect();
    RegexBuilder::new(&format!(
        r"\b{{start-half}}(?:{})\b{{end-half}}",
        alternatives.join("|")
    ))
        .case_insensitive(true)
        .build()
        .map_err(|source| RouterError::Regex { kind, source })
}
