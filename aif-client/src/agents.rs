//! Azure AI Foundry agents client.

use crate::config::AgentsConfig;
use crate::http::RestTransport;
use crate::retry::RetryConfig;
use aif_core::{
    Agent, AgentDeletion, AgentsService, CreateAgentRequest, CreateMessageRequest, Message,
    MessagePage, Result, Run, Thread,
};
use async_trait::async_trait;
use serde_json::json;

/// Client for the agents, threads, messages and runs of one Foundry project.
///
/// Reads (run status, message listing) are retried on transient failures.
/// Writes are sent once.
///
/// # Example
///
/// ```rust,ignore
/// use aif_client::{AgentsClient, AgentsConfig, Credential};
///
/// let config = AgentsConfig::new(
///     "https://my-foundry.services.ai.azure.com/api/projects/my-project",
///     Credential::Bearer(token),
/// );
/// let client = AgentsClient::new(config)?;
/// ```
#[derive(Clone)]
pub struct AgentsClient {
    transport: RestTransport,
}

impl AgentsClient {
    pub fn new(config: AgentsConfig) -> Result<Self> {
        let transport =
            RestTransport::new("agents", &config.endpoint, config.credential, config.api_version)?;
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
impl AgentsService for AgentsClient {
    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<Agent> {
        self.transport.post("/assistants", request).await
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<AgentDeletion> {
        self.transport.delete(&format!("/assistants/{agent_id}")).await
    }

    async fn create_thread(&self) -> Result<Thread> {
        self.transport.post("/threads", &json!({})).await
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<Message> {
        self.transport.post(&format!("/threads/{thread_id}/messages"), request).await
    }

    async fn list_messages(&self, thread_id: &str, after: Option<&str>) -> Result<MessagePage> {
        let mut query = vec![("order", "asc".to_string())];
        if let Some(cursor) = after {
            query.push(("after", cursor.to_string()));
        }
        self.transport.get(&format!("/threads/{thread_id}/messages"), &query).await
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run> {
        self.transport
            .post(&format!("/threads/{thread_id}/runs"), &json!({ "assistant_id": agent_id }))
            .await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.transport.get(&format!("/threads/{thread_id}/runs/{run_id}"), &[]).await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.transport.post_empty(&format!("/threads/{thread_id}/runs/{run_id}/cancel")).await
    }
}
