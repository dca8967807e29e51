//! Generic HTTP-backed `OcrProvider`/`StructureLlmProvider` adapters for
//! wiring `corpus ingest` to a configured endpoint. Protocol-level only, the
//! same way `HttpTrackerClient`/`HttpVectorStore` are generic REST clients
//! rather than bindings to any one named vendor product.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;

use crate::ingest::llm_provider::{LlmProviderKind, StructureLlmError, StructureLlmProvider};
use crate::ingest::ocr::{OcrError, OcrOptions, OcrProvider, OcrResponse};

pub struct HttpOcrProvider {
    endpoint: url::Url,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpOcrProvider {
    pub fn new(endpoint: url::Url, api_key: Option<String>) -> Self {
        Self { endpoint, api_key, client: reqwest::Client::new() }
    }
}

#[async_trait]
impl OcrProvider for HttpOcrProvider {
    async fn recognize(&self, pdf_path: &Path, options: OcrOptions) -> Result<OcrResponse, OcrError> {
        let bytes = tokio::fs::read(pdf_path)
            .await
            .map_err(|e| OcrError::Provider(format!("failed to read {}: {e}", pdf_path.display())))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        let mut request = self.client.post(self.endpoint.clone()).json(&serde_json::json!({
            "pdf_base64": encoded,
            "use_annotations": options.use_annotations,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| OcrError::Provider(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Provider(format!("{status}: {body}")));
        }
        response.json::<OcrResponse>().await.map_err(|e| OcrError::Provider(e.to_string()))
    }
}

pub struct HttpStructureLlmProvider {
    endpoint: url::Url,
    oauth_token: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl HttpStructureLlmProvider {
    pub fn new(endpoint: url::Url, oauth_token: Option<String>, model: impl Into<String>) -> Self {
        Self { endpoint, oauth_token, model: model.into(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl StructureLlmProvider for HttpStructureLlmProvider {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, StructureLlmError> {
        let mut request = self.client.post(self.endpoint.clone()).json(&serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "temperature": temperature,
        }));
        if let Some(token) = &self.oauth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| StructureLlmError::Provider(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StructureLlmError::Provider(format!("{status}: {body}")));
        }
        let body: serde_json::Value = response.json().await.map_err(|e| StructureLlmError::Provider(e.to_string()))?;
        body.get("completion")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| StructureLlmError::Provider("response missing `completion` field".into()))
    }

    fn kind(&self) -> LlmProviderKind {
        LlmProviderKind::Remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_providers_with_expected_endpoints() {
        let ocr = HttpOcrProvider::new(url::Url::parse("http://localhost:9000/ocr").unwrap(), Some("k".into()));
        assert_eq!(ocr.endpoint.as_str(), "http://localhost:9000/ocr");

        let llm = HttpStructureLlmProvider::new(url::Url::parse("http://localhost:9001/complete").unwrap(), None, "claude-haiku");
        assert_eq!(llm.model, "claude-haiku");
        assert_eq!(llm.kind(), LlmProviderKind::Remote);
    }
}
