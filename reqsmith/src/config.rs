//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::pipeline::PipelineConfig;
use crate::retriever::Chunking;
use crate::router::{PatternTable, Router};

pub const DEFAULT_QUERY: &str = "What are the core requirements and key details in this document?";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "reqsmith",
    about = "Turn a requirements document into a reviewed, working web app"
)]
pub struct Config {
    /// Source document (.pdf or plain text)
    pub document: PathBuf,

    /// Anthropic API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Model for extraction and review
    #[arg(long, env = "REQSMITH_FAST_MODEL", default_value = "claude-3-5-haiku-20241022")]
    pub fast_model: String,

    /// Model for code generation
    #[arg(long, env = "REQSMITH_CAPABLE_MODEL", default_value = "claude-sonnet-4-20250514")]
    pub capable_model: String,

    /// Directory the generated app is written to
    #[arg(long, env = "REQSMITH_OUTPUT_DIR", default_value = "out")]
    pub output_dir: PathBuf,

    /// Listen address for the preview server
    #[arg(long, env = "REQSMITH_PREVIEW_ADDR", default_value = "127.0.0.1:8000")]
    pub preview_addr: SocketAddr,

    /// TOML file with `approve` and `reject` keyword lists
    #[arg(long, env = "REQSMITH_PATTERNS")]
    pub patterns: Option<PathBuf>,

    /// Seed question for retrieval
    #[arg(long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Clarifying questions asked per round
    #[arg(long, default_value_t = 3)]
    pub max_questions: usize,

    /// Reference fragments retrieved
    #[arg(long, default_value_t = 4)]
    pub top_k: usize,

    /// Chunk size in characters
    #[arg(long, default_value_t = 1000)]
    pub chunk_size: usize,

    /// Characters shared between neighbouring chunks
    #[arg(long, default_value_t = 200)]
    pub chunk_overlap: usize,

    /// Stage executions before the run is aborted
    #[arg(long, default_value_t = 200)]
    pub max_steps: usize,
}

impl Config {
    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("--chunk-size must be greater than zero");
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "--chunk-overlap ({}) must be smaller than --chunk-size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        if self.top_k == 0 {
            bail!("--top-k must be greater than zero");
        }
        if self.max_steps == 0 {
            bail!("--max-steps must be greater than zero");
        }
        Ok(())
    }

    pub fn chunking(&self) -> Chunking {
        Chunking {
            size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            max_questions: self.max_questions,
            preview_addr: self.preview_addr,
            max_steps: self.max_steps,
        }
    }

    /// Compile the decision router from `--patterns`, or the built-in table.
    pub async fn router(&self) -> Result<Router> {
        let table = match &self.patterns {
            Some(path) => load_patterns(path).await?,
            None => PatternTable::default(),
        };
        Router::new(&table).context("Invalid decision patterns")
    }
}

pub async fn load_patterns(path: &Path) -> Result<PatternTable> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read pattern file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse pattern file {}", path.display()))
}
