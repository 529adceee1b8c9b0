//! Pipeline orchestrator: walks the stage graph, merging each stage's delta
//! into the shared state.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use super::graph::{self, Next, Outcome, Stage};
use crate::gate::HumanGate;
use crate::generator::Generator;
use crate::log::{Delta, LogEntry, PipelineState};
use crate::output;
use crate::retriever::Retriever;
use crate::router::Router;
use crate::workspace::Workspace;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Questions asked per clarification round.
    pub max_questions: usize,
    /// Where the preview server listens during `user_feedback`.
    pub preview_addr: SocketAddr,
    /// Stage executions allowed before the run is aborted.
    pub max_steps: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_questions: 3,
            preview_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            max_steps: 200,
        }
    }
}

/// What a finished run leaves behind.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: Outcome,
    pub state: PipelineState,
    /// Stage executions performed.
    pub steps: usize,
}

/// The requirements-to-app pipeline.
pub struct Pipeline {
    pub config: PipelineConfig,
    pub(super) generator: Arc<dyn Generator>,
    pub(super) retriever: Arc<dyn Retriever>,
    pub(super) gate: Arc<dyn HumanGate>,
    pub(super) workspace: Workspace,
    pub(super) router: Router,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        generator: Arc<dyn Generator>,
        retriever: Arc<dyn Retriever>,
        gate: Arc<dyn HumanGate>,
        workspace: Workspace,
        router: Router,
    ) -> Self {
        Self {
            config,
            generator,
            retriever,
            gate,
            workspace,
            router,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Run from the entry stage with `query` as the seed human message.
    pub async fn run(&self, query: &str) -> Result<RunReport> {
        let state = PipelineState::seeded(LogEntry::human(query));
        self.run_from(Stage::ENTRY, state).await
    }

    /// Run starting at `stage` over an existing state.
    pub async fn run_from(&self, stage: Stage, mut state: PipelineState) -> Result<RunReport> {
        let mut current = stage;
        let mut steps = 0;
        loop {
            if steps >= self.config.max_steps {
                bail!(
                    "Pipeline stopped after {steps} stages without finishing (last stage: {current})"
                );
            }
            steps += 1;

            let (emoji, label) = banner(current);
            output::status(current.name(), emoji, label);
            tracing::info!(stage = %current, step = steps, "Running stage");

            let delta = self
                .execute(current, &state)
                .await
                .with_context(|| format!("stage {current} failed"))?;
            tracing::debug!(
                stage = %current,
                entries = delta.entries.len(),
                references = delta.references.len(),
                "Merging delta"
            );
            state.merge(delta);

            match graph::next(current, &state, &self.router) {
                Next::Stage(to) => current = to,
                Next::End(outcome) => {
                    match outcome {
                        Outcome::Completed => {
                            output::status("pipeline", "✅", "Approved. All done.");
                        }
                        Outcome::Halted { at } => {
                            output::error(
                                "pipeline",
                                &format!("Could not read the reply at {at}; stopping."),
                            );
                        }
                    }
                    tracing::info!(?outcome, steps, "Pipeline finished");
                    return Ok(RunReport {
                        outcome,
                        state,
                        steps,
                    });
                }
            }
        }
    }

    /// Run one stage against a read-only view of the state.
    pub async fn execute(&self, stage: Stage, state: &PipelineState) -> Result<Delta> {
        match stage {
            Stage::Retrieve => self.retrieve(state).await,
            Stage::GenerateRequirements => self.generate_requirements(state).await,
            Stage::QuestionMaker => self.question_maker(state).await,
            Stage::AmendRequirements => self.amend_requirements(state).await,
            Stage::PresentForApproval => self.present_for_approval(state).await,
            Stage::Implementation => self.implementation(state).await,
            Stage::RefactorComment => self.refactor_comment(state).await,
            Stage::CodeRefactor => self.code_refactor(state).await,
            Stage::UserFeedback => self.user_feedback(state).await,
            Stage::UserNotes => self.user_notes(state).await,
        }
    }
}

fn banner(stage: Stage) -> (&'static str, &'static str) {
    match stage {
        Stage::Retrieve => ("🔍", "Retrieving reference material..."),
        Stage::GenerateRequirements => ("📋", "Generating requirements..."),
        Stage::QuestionMaker => ("❓", "Preparing clarifying questions..."),
        Stage::AmendRequirements => ("✏️", "Amending requirements..."),
        Stage::PresentForApproval => ("📝", "Presenting requirements for approval..."),
        Stage::Implementation => ("🔨", "Implementing the web app..."),
        Stage::RefactorComment => ("🔎", "Reviewing the generated code..."),
        Stage::CodeRefactor => ("♻️", "Refactoring code..."),
        Stage::UserFeedback => ("🌐", "Waiting for feedback on the preview..."),
        Stage::UserNotes => ("🗒️", "Collecting improvement notes..."),
    }
}
