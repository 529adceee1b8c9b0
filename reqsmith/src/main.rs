//! reqsmith: requirements document in, reviewed web app out.
//!
//!   reqsmith requirements.pdf
//!
//! Requires ANTHROPIC_API_KEY. Set RUST_LOG to adjust verbosity and
//! REQSMITH_LOG_JSON=1 for JSON logs on stderr.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use reqsmith::config::Config;
use reqsmith::gate::ConsoleGate;
use reqsmith::llm::LlmClient;
use reqsmith::output;
use reqsmith::pipeline::{Outcome, Pipeline};
use reqsmith::retriever::ChunkRetriever;
use reqsmith::workspace::Workspace;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "reqsmith=info".into());
    let json = std::env::var("REQSMITH_LOG_JSON").is_ok_and(|v| v == "1");
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::parse();
    config.validate()?;
    let router = config.router().await?;

    let text = reqsmith::document::load(&config.document).await?;
    let retriever = ChunkRetriever::from_text(&text, config.chunking(), config.top_k);
    tracing::info!(
        document = %config.document.display(),
        chunks = retriever.len(),
        "Document indexed"
    );

    let llm = LlmClient::new(config.api_key.clone())
        .with_models(&config.fast_model, &config.capable_model);

    let pipeline = Pipeline::new(
        config.pipeline(),
        Arc::new(llm),
        Arc::new(retriever),
        Arc::new(ConsoleGate::new()),
        Workspace::new(&config.output_dir),
        router,
    );

    let report = match pipeline.run(&config.query).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Run failed");
            return Err(e);
        }
    };

    if let Some(last) = report.state.last() {
        output::say("result", &last.payload.render());
    }
    if let Outcome::Halted { at } = report.outcome {
        tracing::warn!(stage = %at, "Run halted on an unrecognised reply");
    }
    Ok(())
}
