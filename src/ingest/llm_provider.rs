//! Shared LLM-call contract for the structured extraction stages: strict
//! JSON schema in, retry-once-with-repair on parse failure, low default
//! temperature. Core-B-scoped twin of the teacher's `LLMProvider` trait.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureLlmError {
    #[error("provider request failed: {0}")]
    Provider(String),
    #[error("response did not match the requested schema even after repair: {0}")]
    SchemaMismatch(String),
}

/// Which backend answers structured-extraction calls for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Local,
    Remote,
}

/// One LLM backend capable of returning a raw JSON string for a prompt.
/// Schema validation and the retry-with-repair loop live in
/// `complete_structured`, above the provider boundary, so every provider
/// gets the same retry behaviour for free.
#[async_trait]
pub trait StructureLlmProvider: Send + Sync {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, StructureLlmError>;
    fn kind(&self) -> LlmProviderKind;
}

/// Default temperature for structured extraction calls.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Issue `prompt` against `provider`, parse the response as `T`, and retry
/// once with a repair instruction appended if parsing fails. Fails the
/// stage if the repaired response is still invalid.
pub async fn complete_structured<T: DeserializeOwned>(
    provider: &dyn StructureLlmProvider,
    prompt: &str,
) -> Result<T, StructureLlmError> {
    let first = provider.complete(prompt, DEFAULT_TEMPERATURE).await?;
    if let Ok(parsed) = serde_json::from_str(&first) {
        return Ok(parsed);
    }

    let repair_prompt = format!(
        "{prompt}\n\nYour previous response was not valid JSON matching the requested schema:\n{first}\n\nRespond again with only valid JSON."
    );
    let repaired = provider.complete(&repair_prompt, DEFAULT_TEMPERATURE).await?;
    serde_json::from_str(&repaired).map_err(|e| StructureLlmError::SchemaMismatch(e.to_string()))
}
