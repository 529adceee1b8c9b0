//! Stage bodies. Each reads the state and returns only what it adds.

use anyhow::Result;

use super::Pipeline;
use super::prompts;
use crate::artifacts::{
    self, GeneratedAppFiles, ImplementationResult, NOTE_TAGS, QuestionAnswerPair, Questions,
    QuestionsAndAnswers, REQUIREMENT_TAGS, RefactorComments, RequirementsList,
};
use crate::generator::{Tier, generate};
use crate::log::{Delta, LogEntry, PipelineState, Tag};
use crate::output;
use crate::preview::PreviewServer;
use crate::render;
use crate::workspace::{HTML_FILE, JS_FILE};

/// A generated entry carrying no artifact, explaining why a stage did nothing.
fn notice(text: &str) -> Delta {
    tracing::warn!("{text}");
    output::status("pipeline", "⚠️", text);
    Delta::entry(LogEntry::notice(text))
}

impl Pipeline {
    pub(super) async fn retrieve(&self, state: &PipelineState) -> Result<Delta> {
        let query = match state.last() {
            Some(entry) if entry.is_human() => entry.payload.render(),
            _ => {
                tracing::debug!("Last entry is not a human message, skipping retrieval");
                return Ok(Delta::empty());
            }
        };
        let fragments = self.retriever.retrieve(&query).await?;
        output::status(
            "retriever",
            "📚",
            &format!("Found {} reference fragments", fragments.len()),
        );
        Ok(Delta::references(fragments))
    }

    pub(super) async fn generate_requirements(&self, state: &PipelineState) -> Result<Delta> {
        let context = state
            .references()
            .iter()
            .map(|f| f.content.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n");
        let list: RequirementsList = generate(
            self.generator.as_ref(),
            Tier::Fast,
            &prompts::extract_requirements(&context),
        )
        .await?;
        output::status(
            "requirements",
            "📋",
            &format!("Extracted {} requirements", list.requirements.len()),
        );
        Ok(Delta::entry(LogEntry::generated(Tag::Requirements, &list)?))
    }

    pub(super) async fn question_maker(&self, state: &PipelineState) -> Result<Delta> {
        let Some(requirements) =
            artifacts::find_latest::<RequirementsList>(state.log(), REQUIREMENT_TAGS)?
        else {
            return Ok(notice("No requirements found to ask questions about."));
        };
        let proposed: Questions = generate(
            self.generator.as_ref(),
            Tier::Fast,
            &prompts::clarifying_questions(
                &serde_json::to_string_pretty(&requirements)?,
                self.config.max_questions,
            ),
        )
        .await?;

        let mut pairs = Vec::new();
        for question in proposed
            .questions
            .into_iter()
            .filter(|q| !q.trim().is_empty())
            .take(self.config.max_questions)
        {
            let answer = self.gate.ask(&question).await?;
            pairs.push(QuestionAnswerPair { question, answer });
        }
        tracing::info!(answered = pairs.len(), "Clarifying questions answered");
        Ok(Delta::entry(LogEntry::generated(
            Tag::ClarifyingQuestions,
            &QuestionsAndAnswers { pairs },
        )?))
    }

    pub(super) async fn amend_requirements(&self, state: &PipelineState) -> Result<Delta> {
        let requirements = artifacts::find_latest::<RequirementsList>(state.log(), REQUIREMENT_TAGS)?;
        let answers =
            artifacts::find_latest::<QuestionsAndAnswers>(state.log(), &[Tag::ClarifyingQuestions])?;
        let (Some(requirements), Some(answers)) = (requirements, answers) else {
            return Ok(notice(
                "Cannot amend requirements: requirements or clarifying answers are missing.",
            ));
        };
        let amended: RequirementsList = generate(
            self.generator.as_ref(),
            Tier::Fast,
            &prompts::amend_requirements(
                &serde_json::to_string_pretty(&requirements)?,
                &serde_json::to_string_pretty(&answers)?,
            ),
        )
        .await?;
        Ok(Delta::entry(LogEntry::generated(
            Tag::AmendedRequirements,
            &amended,
        )?))
    }

    pub(super) async fn present_for_approval(&self, state: &PipelineState) -> Result<Delta> {
        let Some(amended) =
            artifacts::find_latest::<RequirementsList>(state.log(), &[Tag::AmendedRequirements])?
        else {
            return Ok(notice("No amended requirements to present."));
        };
        let summary = render::requirements_by_category(&amended);
        let reply = self.gate.ask(&prompts::approval_request(&summary)).await?;
        Ok(Delta::entry(LogEntry::human_reply(Tag::ApprovalReply, reply)))
    }

    pub(super) async fn implementation(&self, state: &PipelineState) -> Result<Delta> {
        let Some(approved) =
            artifacts::find_latest::<RequirementsList>(state.log(), &[Tag::AmendedRequirements])?
        else {
            return Ok(notice("No approved requirements to implement."));
        };
        let files: GeneratedAppFiles = generate(
            self.generator.as_ref(),
            Tier::Capable,
            &prompts::implement(&serde_json::to_string_pretty(&approved)?),
        )
        .await?;
        let written = self.workspace.save(&files).await?;
        output::status(
            "builder",
            "📄",
            &format!("Wrote {} and {}", written.html, written.javascript),
        );
        let result = ImplementationResult {
            message: "Web application has been generated".to_string(),
            files: written,
        };
        Ok(Delta::entry(LogEntry::generated(
            Tag::ImplementationResult,
            &result,
        )?))
    }

    pub(super) async fn refactor_comment(&self, _state: &PipelineState) -> Result<Delta> {
        let html = self.workspace.read_optional(HTML_FILE).await;
        let js = self.workspace.read_optional(JS_FILE).await;
        if html.is_none() && js.is_none() {
            let root = self.workspace.root.display();
            let text = format!(
                "No inputs to review: neither {root}/{HTML_FILE} nor {root}/{JS_FILE} could be read. \
                 Generate the app first or place the files under {root}."
            );
            tracing::warn!("{text}");
            return Ok(Delta::entry(LogEntry::generated_text(
                Tag::RefactorCommentary,
                text,
            )));
        }
        let html = html.unwrap_or_else(|| format!("<missing {HTML_FILE}>"));
        let js = js.unwrap_or_else(|| format!("<missing {JS_FILE}>"));

        let review: RefactorComments = generate(
            self.generator.as_ref(),
            Tier::Fast,
            &prompts::review(&html, &js),
        )
        .await?;
        let commentary = review
            .comments
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        output::say("reviewer", &commentary);
        Ok(Delta::entry(LogEntry::generated_text(
            Tag::RefactorCommentary,
            commentary,
        )))
    }

    pub(super) async fn code_refactor(&self, state: &PipelineState) -> Result<Delta> {
        let current = self.workspace.load().await?;
        let notes = artifacts::latest_text(state.log(), NOTE_TAGS).unwrap_or_default();
        let files: GeneratedAppFiles = generate(
            self.generator.as_ref(),
            Tier::Capable,
            &prompts::refactor(&current.html_content, &current.js_content, notes),
        )
        .await?;
        let written = self.workspace.save(&files).await?;
        let result = ImplementationResult {
            message: "Web application has been refactored".to_string(),
            files: written,
        };
        Ok(Delta::entry(LogEntry::generated(Tag::CodeRefactor, &result)?))
    }

    pub(super) async fn user_feedback(&self, _state: &PipelineState) -> Result<Delta> {
        let server = PreviewServer::start(&self.workspace.root, self.config.preview_addr).await?;
        output::status("preview", "🌐", &format!("Preview at {}", server.url()));
        let reply = self.gate.ask(&prompts::feedback_request(&server.url())).await;
        server.stop().await?;
        Ok(Delta::entry(LogEntry::human_reply(Tag::UserFeedback, reply?)))
    }

    pub(super) async fn user_notes(&self, _state: &PipelineState) -> Result<Delta> {
        let notes = self.gate.ask(prompts::NOTES_REQUEST).await?;
        Ok(Delta::entry(LogEntry::human_reply(Tag::UserNotes, notes)))
    }
}
