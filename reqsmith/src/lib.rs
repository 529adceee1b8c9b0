//! reqsmith: turn a requirements document into a reviewed, working web app.
//!
//! A fixed graph of stages extracts requirements from retrieved document
//! fragments, clarifies them with a human, generates a two-file web app,
//! reviews and refactors it, and serves it for approval.

pub mod artifacts;
pub mod config;
pub mod document;
pub mod gate;
pub mod generator;
pub mod llm;
pub mod log;
pub mod output;
pub mod pipeline;
pub mod preview;
pub mod render;
pub mod retriever;
pub mod router;
pub mod workspace;
