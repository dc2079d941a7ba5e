//! Azure OpenAI client for files, fine-tuning jobs and chat completions.

use crate::config::AzureOpenAIConfig;
use crate::http::{RestTransport, validate_endpoint};
use crate::retry::RetryConfig;
use aif_core::{
    AifError, ChatCompletion, ChatMessage, ChatService, CreateJobRequest, EventPage, FilePurpose,
    FineTuneFile, FineTuningJob, FineTuningService, Result,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use std::path::Path;

/// Client for one Azure OpenAI resource.
///
/// # Example
///
/// ```rust,ignore
/// use aif_client::{AzureOpenAIClient, AzureOpenAIConfig};
///
/// let config = AzureOpenAIConfig::new("https://my-resource.openai.azure.com", "my-api-key");
/// let client = AzureOpenAIClient::new(config)?;
/// ```
#[derive(Clone)]
pub struct AzureOpenAIClient {
    transport: RestTransport,
}

impl AzureOpenAIClient {
    pub fn new(config: AzureOpenAIConfig) -> Result<Self> {
        let base_url = format!("{}/openai", validate_endpoint("openai", &config.endpoint)?);
        let transport =
            RestTransport::new("openai", &base_url, config.credential, config.api_version)?;
        Ok(Self { transport })
    }

    /// Set the retry configuration for reads, consuming and returning `self`.
    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.transport.set_retry_config(retry_config);
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        self.transport.retry_config()
    }
}

#[async_trait]
impl FineTuningService for AzureOpenAIClient {
    async fn upload_file(&self, path: &Path, purpose: FilePurpose) -> Result<FineTuneFile> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| AifError::Config(format!("{} has no file name", path.display())))?
            .to_string();

        tracing::debug!(file = %path.display(), bytes = bytes.len(), purpose = purpose.as_str(), "uploading file");

        let form = Form::new()
            .text("purpose", purpose.as_str())
            .part("file", Part::bytes(bytes).file_name(filename));
        self.transport.post_multipart("/files", form).await
    }

    async fn create_job(&self, request: &CreateJobRequest) -> Result<FineTuningJob> {
        self.transport.post("/fine_tuning/jobs", request).await
    }

    async fn retrieve_job(&self, job_id: &str) -> Result<FineTuningJob> {
        self.transport.get(&format!("/fine_tuning/jobs/{job_id}"), &[]).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<FineTuningJob> {
        self.transport.post_empty(&format!("/fine_tuning/jobs/{job_id}/cancel")).await
    }

    async fn list_job_events(&self, job_id: &str, limit: Option<u32>) -> Result<EventPage> {
        let query: Vec<(&str, String)> =
            limit.map(|limit| ("limit", limit.to_string())).into_iter().collect();
        self.transport.get(&format!("/fine_tuning/jobs/{job_id}/events"), &query).await
    }
}

#[async_trait]
impl ChatService for AzureOpenAIClient {
    async fn chat_completion(
        &self,
        deployment: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatCompletion> {
        self.transport
            .post(
                &format!("/deployments/{deployment}/chat/completions"),
                &json!({ "messages": messages }),
            )
            .await
    }
}
