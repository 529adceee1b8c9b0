//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::{Value, json};

use reqsmith::gate::ScriptedGate;
use reqsmith::generator::{Generator, OutputSchema, Prompt, Tier};
use reqsmith::pipeline::{Pipeline, PipelineConfig};
use reqsmith::retriever::{ChunkRetriever, Chunking};
use reqsmith::router::{PatternTable, Router};
use reqsmith::workspace::Workspace;

/// One recorded generator call.
#[derive(Debug, Clone)]
pub struct Call {
    pub tier: Tier,
    pub schema: &'static str,
    pub prompt: Prompt,
}

/// Canned generator keyed by output-schema name.
///
/// Responses for a schema are replayed in order; the last one repeats.
#[derive(Default)]
pub struct FakeGenerator {
    responses: Mutex<HashMap<&'static str, VecDeque<Value>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, schema: &'static str, value: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(schema)
            .or_default()
            .push_back(value);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, schema: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.schema == schema)
            .collect()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, tier: Tier, prompt: &Prompt, schema: &OutputSchema) -> Result<Value> {
        self.calls.lock().unwrap().push(Call {
            tier,
            schema: schema.name,
            prompt: prompt.clone(),
        });
        let mut responses = self.responses.lock().unwrap();
        let Some(queue) = responses.get_mut(schema.name) else {
            bail!("no canned response for {}", schema.name);
        };
        let value = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match value {
            Some(v) => Ok(v),
            None => bail!("no canned response for {}", schema.name),
        }
    }
}

pub fn requirements(descriptions: &[&str]) -> Value {
    let items: Vec<Value> = descriptions
        .iter()
        .enumerate()
        .map(|(i, d)| {
            json!({
                "id": format!("REQ-{}", i + 1),
                "description": d,
                "category": "Functional",
            })
        })
        .collect();
    json!({ "requirements": items })
}

pub fn questions(qs: &[&str]) -> Value {
    json!({ "questions": qs })
}

pub fn app(html: &str, js: &str) -> Value {
    json!({ "html_content": html, "js_content": js })
}

pub fn comments(cs: &[&str]) -> Value {
    json!({ "comments": cs })
}

/// A generator that can carry a whole run.
pub fn full_generator() -> FakeGenerator {
    FakeGenerator::new()
        .respond("requirements_list", requirements(&["Users can sign in"]))
        .respond(
            "requirements_list",
            requirements(&["Users can sign in with email"]),
        )
        .respond("clarifying_questions", questions(&["Which login methods?"]))
        .respond("web_app_files", app("<h1>v1</h1>", "console.log(1);"))
        .respond("web_app_files", app("<h1>v2</h1>", "console.log(2);"))
        .respond("web_app_files", app("<h1>v3</h1>", "console.log(3);"))
        .respond(
            "refactor_comments",
            comments(&["Add a label to the form.", "Debounce the submit handler."]),
        )
}

pub const DOCUMENT: &str = "The system lets users sign in with email.\n\n\
    Administrators can ban users who break the rules.\n\n\
    The app must load in under two seconds.";

pub struct Harness {
    pub generator: Arc<FakeGenerator>,
    pub gate: Arc<ScriptedGate>,
    pub pipeline: Pipeline,
    pub dir: tempfile::TempDir,
}

pub fn harness(generator: FakeGenerator, answers: &[&str]) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let generator = Arc::new(generator);
    let gate = Arc::new(ScriptedGate::new(answers.iter().copied()));
    let retriever = Arc::new(ChunkRetriever::from_text(DOCUMENT, Chunking::default(), 4));
    let config = PipelineConfig {
        max_questions: 3,
        preview_addr: "127.0.0.1:0".parse().unwrap(),
        max_steps: 50,
    };
    let pipeline = Pipeline::new(
        config,
        generator.clone(),
        retriever,
        gate.clone(),
        Workspace::new(dir.path().join("out")),
        Router::new(&PatternTable::default()).unwrap(),
    );
    Harness {
        generator,
        gate,
        pipeline,
        dir,
    }
}
