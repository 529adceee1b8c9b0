//! The fixed stage graph.
//!
//! ```text
//! retrieve → generate_requirements → question_maker → amend_requirements
//!                                          ↑                  ↓
//!                                          └─ reject ── present_for_approval ── unknown → halt
//!                                                             ↓ approve
//! implementation → refactor_comment → code_refactor → user_feedback ── approve → done
//!                                          ↑               ↓ reject      └─ unknown → halt
//!                                          └────────── user_notes
//! ```

use crate::log::PipelineState;
use crate::router::{Decision, Router};

/// A node of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Retrieve,
    GenerateRequirements,
    QuestionMaker,
    AmendRequirements,
    PresentForApproval,
    Implementation,
    RefactorComment,
    CodeRefactor,
    UserFeedback,
    UserNotes,
}

impl Stage {
    /// Where every run starts.
    pub const ENTRY: Stage = Stage::Retrieve;

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Retrieve => "retrieve",
            Stage::GenerateRequirements => "generate_requirements",
            Stage::QuestionMaker => "question_maker",
            Stage::AmendRequirements => "amend_requirements",
            Stage::PresentForApproval => "present_for_approval",
            Stage::Implementation => "implementation",
            Stage::RefactorComment => "refactor_comment",
            Stage::CodeRefactor => "code_refactor",
            Stage::UserFeedback => "user_feedback",
            Stage::UserNotes => "user_notes",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a run ended, when it ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The preview was approved.
    Completed,
    /// A reply at `at` could not be classified.
    Halted { at: Stage },
}

/// Where to go after a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Stage(Stage),
    End(Outcome),
}

/// Outgoing edge of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Always(Stage),
    OnDecision {
        approve: Next,
        reject: Next,
        unknown: Next,
    },
}

pub fn edge(stage: Stage) -> Edge {
    use Stage::*;
    match stage {
        Retrieve => Edge::Always(GenerateRequirements),
        GenerateRequirements => Edge::Always(QuestionMaker),
        QuestionMaker => Edge::Always(AmendRequirements),
        AmendRequirements => Edge::Always(PresentForApproval),
        PresentForApproval => Edge::OnDecision {
            approve: Next::Stage(Implementation),
            reject: Next::Stage(QuestionMaker),
            unknown: Next::End(Outcome::Halted { at: stage }),
        },
        Implementation => Edge::Always(RefactorComment),
        RefactorComment => Edge::Always(CodeRefactor),
        CodeRefactor => Edge::Always(UserFeedback),
        UserFeedback => Edge::OnDecision {
            approve: Next::End(Outcome::Completed),
            reject: Next::Stage(UserNotes),
            unknown: Next::End(Outcome::Halted { at: stage }),
        },
        UserNotes => Edge::Always(CodeRefactor),
    }
}

/// Classify the reply a gate stage just recorded.
///
/// Only a human entry at the very end of the log counts; a branch stage
/// that recorded nothing resolves to [`Decision::Unknown`].
pub fn decision(state: &PipelineState, router: &Router) -> Decision {
    match state.last() {
        Some(entry) if entry.is_human() => match entry.payload.as_text() {
            Some(text) => router.classify(text),
            None => Decision::Unknown,
        },
        _ => Decision::Unknown,
    }
}

/// Follow the outgoing edge of `stage` given the state after it ran.
pub fn next(stage: Stage, state: &PipelineState, router: &Router) -> Next {
    match edge(stage) {
        Edge::Always(to) => Next::Stage(to),
        Edge::OnDecision {
            approve,
            reject,
            unknown,
        } => {
            let decision = decision(state, router);
            tracing::info!(stage = %stage, %decision, "Branch decision");
            match decision {
                Decision::Approve => approve,
                Decision::Reject => reject,
                Decision::Unknown => unknown,
            }
        }
    }
}
