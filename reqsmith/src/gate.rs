//! Human gate: the point where a stage blocks for one line of human input.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("input closed before a reply was given")]
    Closed,
    #[error("no scripted answer left for prompt: {0}")]
    Exhausted(String),
}

#[async_trait]
pub trait HumanGate: Send + Sync {
    /// Show `prompt` and wait for one line, returned verbatim.
    async fn ask(&self, prompt: &str) -> Result<String>;
}

/// Reads replies from the terminal.
pub struct ConsoleGate {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleGate {
    pub fn new() -> Self {
        Self {
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for ConsoleGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HumanGate for ConsoleGate {
    async fn ask(&self, prompt: &str) -> Result<String> {
        let mut lines = self.lines.lock().await;
        {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "\n{prompt}")?;
            write!(stdout, "> ")?;
            stdout.flush()?;
        }
        match lines.next_line().await? {
            Some(line) => Ok(line),
            None => Err(GateError::Closed.into()),
        }
    }
}

/// Replays canned answers in order and remembers what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedGate {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedGate {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or_default()
    }
}

#[async_trait]
impl HumanGate for ScriptedGate {
    async fn ask(&self, prompt: &str) -> Result<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(prompt.to_string());
        }
        let next = self
            .answers
            .lock()
            .map_err(|_| anyhow::anyhow!("scripted gate poisoned"))?
            .pop_front();
        next.ok_or_else(|| GateError::Exhausted(prompt.to_string()).into())
    }
}
