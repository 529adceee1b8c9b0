//! The requirements-to-app pipeline.
//!
//! Stages never mutate shared state: each gets a read-only view and returns
//! a [`Delta`](crate::log::Delta) that the orchestrator appends.

pub mod graph;
pub mod orchestrator;
pub mod prompts;
mod stages;

pub use graph::{Next, Outcome, Stage};
pub use orchestrator::{Pipeline, PipelineConfig, RunReport};
