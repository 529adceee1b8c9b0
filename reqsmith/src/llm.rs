//! Claude API client backing the [`Generator`] trait.
//!
//! Structured output is a single forced tool call: the output schema is
//! sent as the tool's input schema and `tool_choice` names it, so the
//! tool-use block's `input` is the object we asked for.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::generator::{GenerationError, Generator, OutputSchema, Prompt, Tier};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse(ToolUseBlock),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUseBlock {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// Tool definition for Claude.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

impl From<&OutputSchema> for ToolDef {
    fn from(schema: &OutputSchema) -> Self {
        Self {
            name: schema.name.to_string(),
            description: schema.description.to_string(),
            input_schema: schema.json.clone(),
        }
    }
}

/// Response from Claude API.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Claude API client.
pub struct LlmClient {
    api_key: String,
    fast_model: String,
    capable_model: String,
    base_url: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            fast_model: "claude-3-5-haiku-20241022".to_string(),
            capable_model: "claude-sonnet-4-20250514".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_models(mut self, fast: &str, capable: &str) -> Self {
        self.fast_model = fast.to_string();
        self.capable_model = capable.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self, tier: Tier) -> &str {
        match tier {
            Tier::Fast => &self.fast_model,
            Tier::Capable => &self.capable_model,
        }
    }

    fn max_tokens(tier: Tier) -> u32 {
        match tier {
            Tier::Fast => 4096,
            Tier::Capable => 16000,
        }
    }

    /// Send a conversation to Claude, forcing a call to `forced_tool` if given.
    pub async fn chat(
        &self,
        tier: Tier,
        system: &str,
        messages: &[Message],
        tools: &[ToolDef],
        forced_tool: Option<&str>,
    ) -> Result<ApiResponse> {
        let mut body = serde_json::json!({
            "model": self.model(tier),
            "max_tokens": Self::max_tokens(tier),
            "system": system,
            "messages": messages,
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::to_value(tools)?;
        }
        if let Some(name) = forced_tool {
            body["tool_choice"] = serde_json::json!({ "type": "tool", "name": name });
        }

        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to call Claude API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed = resp
            .json::<ApiResponse>()
            .await
            .context("Failed to parse Claude response")?;
        if let Some(usage) = &parsed.usage {
            tracing::info!(
                model = self.model(tier),
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Claude call complete"
            );
        }
        Ok(parsed)
    }
}

#[async_trait]
impl Generator for LlmClient {
    async fn generate(
        &self,
        tier: Tier,
        prompt: &Prompt,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value> {
        let messages = [Message {
            role: "user".to_string(),
            content: prompt.user.clone(),
        }];
        let tools = [ToolDef::from(schema)];
        let resp = self
            .chat(tier, &prompt.system, &messages, &tools, Some(schema.name))
            .await?;

        if resp.stop_reason.as_deref() == Some("max_tokens") {
            tracing::warn!(schema = schema.name, "Claude stopped at max_tokens");
        }

        resp.content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::ToolUse(tu) if tu.name == schema.name => Some(tu.input),
                _ => None,
            })
            .ok_or_else(|| {
                GenerationError::MissingOutput {
                    schema: schema.name,
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_map_to_configured_models() {
        let client = LlmClient::new("key".into()).with_models("small", "large");
        assert_eq!(client.model(Tier::Fast), "small");
        assert_eq!(client.model(Tier::Capable), "large");
    }

    #[test]
    fn parses_tool_use_response() {
        let raw = r#"{
            "content": [
                {"type": "text", "text": "Here you go"},
                {"type": "tool_use", "id": "tu_1", "name": "questions", "input": {"questions": ["Why?"]}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let resp: ApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.content.len(), 2);
        match &resp.content[1] {
            ContentBlock::ToolUse(tu) => assert_eq!(tu.input["questions"][0], "Why?"),
            other => panic!("unexpected block: {other:?}"),
        }
    }

    #[test]
    fn unknown_block_types_are_tolerated() {
        let raw = r#"{
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "abc"},
                {"type": "tool_use", "id": "tu_1", "name": "questions", "input": {"questions": []}}
            ],
            "stop_reason": "tool_use"
        }"#;
        let resp: ApiResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(resp.content[0], ContentBlock::Other));
        assert!(matches!(resp.content[1], ContentBlock::ToolUse(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = LlmClient::new("key".into()).with_base_url("http://127.0.0.1:9/");
        assert_eq!(client.base_url, "http://127.0.0.1:9");
    }
}
