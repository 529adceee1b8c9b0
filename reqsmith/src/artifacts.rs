//! Artifact schemas and latest-artifact extraction from the log.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::generator::{OutputSchema, Structured};
use crate::log::{LogEntry, Payload, Tag};

/// Tags whose payload is a [`RequirementsList`].
pub const REQUIREMENT_TAGS: &[Tag] = &[Tag::Requirements, Tag::AmendedRequirements];

/// Tags whose payload is free-text guidance for a code refactor.
pub const NOTE_TAGS: &[Tag] = &[Tag::RefactorCommentary, Tag::UserNotes];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequirementsList {
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswerPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionsAndAnswers {
    pub pairs: Vec<QuestionAnswerPair>,
}

/// Clarifying questions proposed by the generator, before a human answers them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Questions {
    pub questions: Vec<String>,
}

/// The two files that make up a generated app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAppFiles {
    pub html_content: String,
    pub js_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactorComments {
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenFiles {
    pub html: String,
    pub javascript: String,
}

/// Summary appended after files are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationResult {
    pub message: String,
    pub files: WrittenFiles,
}

impl Structured for RequirementsList {
    fn schema() -> OutputSchema {
        OutputSchema {
            name: "requirements_list",
            description: "A list of software requirements extracted from the context.",
            json: json!({
                "type": "object",
                "required": ["requirements"],
                "properties": {
                    "requirements": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["id", "description", "category"],
                            "properties": {
                                "id": {
                                    "type": "string",
                                    "description": "Unique requirement ID, e.g. 'REQ-001'"
                                },
                                "description": {
                                    "type": "string",
                                    "description": "Detailed, testable description"
                                },
                                "category": {
                                    "type": "string",
                                    "description": "e.g. 'Functional', 'Non-Functional', 'User Story'"
                                }
                            }
                        }
                    }
                }
            }),
        }
    }
}

impl Structured for Questions {
    fn schema() -> OutputSchema {
        OutputSchema {
            name: "clarifying_questions",
            description: "Questions that clarify the requirements.",
            json: json!({
                "type": "object",
                "required": ["questions"],
                "properties": {
                    "questions": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                }
            }),
        }
    }
}

impl Structured for GeneratedAppFiles {
    fn schema() -> OutputSchema {
        OutputSchema {
            name: "web_app_files",
            description: "Generated web application files.",
            json: json!({
                "type": "object",
                "required": ["html_content", "js_content"],
                "properties": {
                    "html_content": {
                        "type": "string",
                        "description": "Content of index.html"
                    },
                    "js_content": {
                        "type": "string",
                        "description": "Content of main.js"
                    }
                }
            }),
        }
    }
}

impl Structured for RefactorComments {
    fn schema() -> OutputSchema {
        OutputSchema {
            name: "refactor_comments",
            description: "Refactoring comments on the implementation files.",
            json: json!({
                "type": "object",
                "required": ["comments"],
                "properties": {
                    "comments": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                }
            }),
        }
    }
}

/// A tagged entry whose payload does not fit the schema for its tag.
#[derive(Debug, thiserror::Error)]
#[error("entry tagged {tag} does not match its schema: {source}")]
pub struct SchemaMismatch {
    pub tag: Tag,
    #[source]
    pub source: serde_json::Error,
}

/// The most recent entry whose tag is exactly one of `tags`.
pub fn find_latest_entry<'a>(log: &'a [LogEntry], tags: &[Tag]) -> Option<&'a LogEntry> {
    log.iter()
        .rev()
        .find(|entry| entry.tag.is_some_and(|tag| tags.contains(&tag)))
}

/// Deserialize the most recent artifact tagged with one of `tags`.
///
/// `Ok(None)` means nothing matched; callers treat that as "nothing to work
/// on yet". A matching entry that does not deserialize is an error.
pub fn find_latest<T: DeserializeOwned>(
    log: &[LogEntry],
    tags: &[Tag],
) -> Result<Option<T>, SchemaMismatch> {
    let Some(entry) = find_latest_entry(log, tags) else {
        return Ok(None);
    };
    let value = match &entry.payload {
        Payload::Structured(v) => v.clone(),
        Payload::Text(s) => Value::String(s.clone()),
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| SchemaMismatch {
            // find_latest_entry only returns tagged entries
            tag: entry.tag.unwrap_or(tags[0]),
            source,
        })
}

/// Text of the most recent entry tagged with one of `tags`.
pub fn latest_text<'a>(log: &'a [LogEntry], tags: &[Tag]) -> Option<&'a str> {
    find_latest_entry(log, tags).map(|entry| match &entry.payload {
        Payload::Text(s) => s.as_str(),
        Payload::Structured(_) => "",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[&str]) -> RequirementsList {
        RequirementsList {
            requirements: ids
                .iter()
                .map(|id| Requirement {
                    id: id.to_string(),
                    description: format!("desc {id}"),
                    category: "Functional".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn returns_entry_closest_to_end() {
        let log = vec![
            LogEntry::generated(Tag::Requirements, &list(&["REQ-1"])).unwrap(),
            LogEntry::human("hello"),
            LogEntry::generated(Tag::Requirements, &list(&["REQ-2"])).unwrap(),
            LogEntry::notice("unrelated"),
        ];
        let found: RequirementsList = find_latest(&log, &[Tag::Requirements]).unwrap().unwrap();
        assert_eq!(found.requirements[0].id, "REQ-2");
    }

    #[test]
    fn not_found_on_empty_or_unmatched_log() {
        let found: Option<RequirementsList> = find_latest(&[], &[Tag::Requirements]).unwrap();
        assert!(found.is_none());

        let log = vec![
            LogEntry::human("hello"),
            LogEntry::generated(Tag::Requirements, &list(&["REQ-1"])).unwrap(),
        ];
        let found: Option<RequirementsList> =
            find_latest(&log, &[Tag::AmendedRequirements]).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn matching_is_exact_across_a_tag_set() {
        let log = vec![
            LogEntry::generated(Tag::AmendedRequirements, &list(&["A"])).unwrap(),
            LogEntry::generated(Tag::Requirements, &list(&["B"])).unwrap(),
        ];
        let amended: RequirementsList = find_latest(&log, &[Tag::AmendedRequirements])
            .unwrap()
            .unwrap();
        assert_eq!(amended.requirements[0].id, "A");

        let any: RequirementsList = find_latest(&log, REQUIREMENT_TAGS).unwrap().unwrap();
        assert_eq!(any.requirements[0].id, "B");
    }

    #[test]
    fn mismatched_payload_is_an_error() {
        let log = vec![LogEntry::generated_text(Tag::Requirements, "not json")];
        let err = find_latest::<RequirementsList>(&log, &[Tag::Requirements]).unwrap_err();
        assert_eq!(err.tag, Tag::Requirements);

        let log = vec![
            LogEntry::generated(Tag::ClarifyingQuestions, &json!({"pairs": "oops"})).unwrap(),
        ];
        assert!(find_latest::<QuestionsAndAnswers>(&log, &[Tag::ClarifyingQuestions]).is_err());
    }

    #[test]
    fn requirements_list_round_trips() {
        let original = list(&["REQ-1", "REQ-2"]);
        let text = serde_json::to_string(&original).unwrap();
        let back: RequirementsList = serde_json::from_str(&text).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn latest_text_picks_most_recent_note() {
        let log = vec![
            LogEntry::generated_text(Tag::RefactorCommentary, "reviewer says"),
            LogEntry::human_reply(Tag::UserNotes, "make it blue"),
            LogEntry::notice("done"),
        ];
        assert_eq!(latest_text(&log, NOTE_TAGS), Some("make it blue"));
        assert_eq!(latest_text(&log, &[Tag::CodeRefactor]), None);
    }
}
