//! Append-only run log and retrieved references.
//!
//! A run owns exactly one [`PipelineState`]. Stages never touch it directly:
//! they read it and hand back a [`Delta`], which the executor concatenates
//! onto the end of the log. Nothing is ever removed or rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Human,
    Generated,
}

/// Artifact kind carried by a log entry. The tag alone decides how the
/// payload is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    Requirements,
    ClarifyingQuestions,
    AmendedRequirements,
    ApprovalReply,
    ImplementationResult,
    RefactorCommentary,
    CodeRefactor,
    UserFeedback,
    UserNotes,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Requirements => "requirements",
            Tag::ClarifyingQuestions => "clarifying-questions",
            Tag::AmendedRequirements => "amended-requirements",
            Tag::ApprovalReply => "approval-reply",
            Tag::ImplementationResult => "implementation-result",
            Tag::RefactorCommentary => "refactor-commentary",
            Tag::CodeRefactor => "code-refactor",
            Tag::UserFeedback => "user-feedback",
            Tag::UserNotes => "user-notes",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry content: plain text or a structured object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Structured(serde_json::Value),
}

impl Payload {
    /// Text content, or `None` for structured payloads.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Structured(_) => None,
        }
    }

    /// Human-readable rendering (structured payloads as pretty JSON).
    pub fn render(&self) -> String {
        match self {
            Payload::Text(s) => s.clone(),
            Payload::Structured(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }
}

/// One immutable record in the run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub origin: Origin,
    pub tag: Option<Tag>,
    pub payload: Payload,
    pub at: DateTime<Utc>,
}

impl LogEntry {
    /// An untagged human turn (the seed query).
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Human,
            tag: None,
            payload: Payload::Text(text.into()),
            at: Utc::now(),
        }
    }

    /// A human reply recorded by a gate.
    pub fn human_reply(tag: Tag, text: impl Into<String>) -> Self {
        Self {
            tag: Some(tag),
            ..Self::human(text)
        }
    }

    /// A plain generated notice with no artifact attached.
    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Generated,
            tag: None,
            payload: Payload::Text(text.into()),
            at: Utc::now(),
        }
    }

    /// A generated entry whose payload is free text.
    pub fn generated_text(tag: Tag, text: impl Into<String>) -> Self {
        Self {
            tag: Some(tag),
            ..Self::notice(text)
        }
    }

    /// A generated entry carrying `value` serialized as a structured payload.
    pub fn generated<T: Serialize>(tag: Tag, value: &T) -> serde_json::Result<Self> {
        Ok(Self {
            origin: Origin::Generated,
            tag: Some(tag),
            payload: Payload::Structured(serde_json::to_value(value)?),
            at: Utc::now(),
        })
    }

    pub fn is_human(&self) -> bool {
        self.origin == Origin::Human
    }
}

/// A retrieved reference fragment. Opaque to the pipeline apart from its text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Position of the chunk in the source document.
    pub chunk: usize,
    pub content: String,
}

/// What a stage contributes to the state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    pub entries: Vec<LogEntry>,
    pub references: Vec<Fragment>,
}

impl Delta {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entry(entry: LogEntry) -> Self {
        Self {
            entries: vec![entry],
            references: Vec::new(),
        }
    }

    pub fn references(references: Vec<Fragment>) -> Self {
        Self {
            entries: Vec::new(),
            references,
        }
    }

    /// Concatenate `next` after `self`.
    pub fn then(mut self, next: Delta) -> Self {
        self.entries.extend(next.entries);
        self.references.extend(next.references);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.references.is_empty()
    }
}

/// Per-run state: the log plus accumulated references.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    log: Vec<LogEntry>,
    references: Vec<Fragment>,
}

impl PipelineState {
    /// A fresh state holding only the seed entry.
    pub fn seeded(seed: LogEntry) -> Self {
        Self {
            log: vec![seed],
            references: Vec::new(),
        }
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn references(&self) -> &[Fragment] {
        &self.references
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.log.last()
    }

    pub fn append(&mut self, entries: impl IntoIterator<Item = LogEntry>) {
        self.log.extend(entries);
    }

    pub fn append_references(&mut self, fragments: impl IntoIterator<Item = Fragment>) {
        self.references.extend(fragments);
    }

    /// Merge a stage's delta by concatenation.
    pub fn merge(&mut self, delta: Delta) {
        self.append(delta.entries);
        self.append_references(delta.references);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(chunk: usize) -> Fragment {
        Fragment {
            chunk,
            content: format!("chunk {chunk}"),
        }
    }

    #[test]
    fn merge_preserves_order() {
        let mut state = PipelineState::seeded(LogEntry::human("query"));
        state.merge(Delta::entry(LogEntry::notice("one")));
        state.merge(Delta::entry(LogEntry::notice("two")));

        let texts: Vec<_> = state
            .log()
            .iter()
            .map(|e| e.payload.as_text().unwrap())
            .collect();
        assert_eq!(texts, ["query", "one", "two"]);
    }

    #[test]
    fn merging_two_deltas_equals_merging_their_concatenation() {
        let d1 = Delta::entry(LogEntry::notice("a")).then(Delta::references(vec![fragment(0)]));
        let d2 = Delta::entry(LogEntry::human("b")).then(Delta::references(vec![fragment(3)]));
        let seed = LogEntry::human("seed");

        let mut stepwise = PipelineState::seeded(seed.clone());
        stepwise.merge(d1.clone());
        stepwise.merge(d2.clone());

        let mut combined = PipelineState::seeded(seed);
        combined.merge(d1.then(d2));

        assert_eq!(stepwise.log(), combined.log());
        assert_eq!(stepwise.references(), combined.references());
    }

    #[test]
    fn references_are_not_deduplicated() {
        let mut state = PipelineState::default();
        state.append_references([fragment(1), fragment(1)]);
        assert_eq!(state.references().len(), 2);
    }

    #[test]
    fn tag_serializes_kebab_case() {
        let json = serde_json::to_string(&Tag::AmendedRequirements).unwrap();
        assert_eq!(json, "\"amended-requirements\"");
        assert_eq!(Tag::AmendedRequirements.to_string(), "amended-requirements");
    }

    #[test]
    fn empty_delta() {
        assert!(Delta::empty().is_empty());
        assert!(!Delta::entry(LogEntry::notice("x")).is_empty());
    }
}
