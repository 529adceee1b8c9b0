//! Generator collaborator: structured-output text generation.
//!
//! Stages describe what they want with an [`OutputSchema`] and a [`Prompt`],
//! pick a [`Tier`], and get back a typed value. The backend behind the
//! [`Generator`] trait is constructed once and handed to the pipeline.

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Model class used for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Cheap model for extraction and review.
    Fast,
    /// Stronger model for code generation.
    Capable,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Fast => write!(f, "fast"),
            Tier::Capable => write!(f, "capable"),
        }
    }
}

/// A system instruction plus one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Declared shape of a structured output.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema for the object.
    pub json: serde_json::Value,
}

/// Types that can be requested as structured output.
pub trait Structured: DeserializeOwned {
    fn schema() -> OutputSchema;
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("response carried no `{schema}` output")]
    MissingOutput { schema: &'static str },
    #[error("output does not match schema `{schema}`: {source}")]
    SchemaMismatch {
        schema: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a JSON object that is meant to conform to `schema`.
    async fn generate(
        &self,
        tier: Tier,
        prompt: &Prompt,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value>;
}

/// Request a `T` and validate the reply against it.
pub async fn generate<T: Structured>(
    generator: &dyn Generator,
    tier: Tier,
    prompt: &Prompt,
) -> Result<T> {
    let schema = T::schema();
    tracing::debug!(
        schema = schema.name,
        %tier,
        prompt_chars = prompt.system.len() + prompt.user.len(),
        "Requesting structured output"
    );
    let value = generator.generate(tier, prompt, &schema).await?;
    let parsed = serde_json::from_value(value).map_err(|source| GenerationError::SchemaMismatch {
        schema: schema.name,
        source,
    })?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::RequirementsList;
    use serde_json::json;

    struct Fixed(serde_json::Value);

    #[async_trait]
    impl Generator for Fixed {
        async fn generate(
            &self,
            _tier: Tier,
            _prompt: &Prompt,
            _schema: &OutputSchema,
        ) -> Result<serde_json::Value> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn conforming_output_is_parsed() {
        let generator = Fixed(json!({
            "requirements": [
                {"id": "REQ-1", "description": "Log in", "category": "Functional"}
            ]
        }));
        let list: RequirementsList = generate(&generator, Tier::Fast, &Prompt::new("s", "u"))
            .await
            .unwrap();
        assert_eq!(list.requirements.len(), 1);
    }

    #[tokio::test]
    async fn nonconforming_output_is_schema_mismatch() {
        let generator = Fixed(json!({"requirements": [{"id": 1}]}));
        let err = generate::<RequirementsList>(&generator, Tier::Fast, &Prompt::new("s", "u"))
            .await
            .unwrap_err();
        match err.downcast_ref::<GenerationError>() {
            Some(GenerationError::SchemaMismatch { schema, .. }) => {
                assert_eq!(*schema, "requirements_list");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
