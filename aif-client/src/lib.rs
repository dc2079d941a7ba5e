//! # aif-client
//!
//! REST clients for the two Azure services the flows talk to.
//!
//! ## Overview
//!
//! - [`AgentsClient`] - agents, threads, messages and runs of an Azure AI Foundry project
//! - [`AzureOpenAIClient`] - file uploads, fine-tuning jobs and chat completions
//! - [`MockAgentsService`] / [`MockFineTuningService`] - scripted in-memory services for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aif_client::{AzureOpenAIClient, AzureOpenAIConfig};
//!
//! let endpoint = std::env::var("AZURE_OPENAI_ENDPOINT").unwrap();
//! let api_key = std::env::var("AZURE_OPENAI_API_KEY").unwrap();
//! let client = AzureOpenAIClient::new(AzureOpenAIConfig::new(endpoint, api_key)).unwrap();
//! ```
//!
//! ## Retries
//!
//! Idempotent reads are retried on 408/429/5xx and transport failures with
//! exponential backoff ([`RetryConfig`]). Writes are sent exactly once.

pub mod agents;
pub mod config;
mod http;
pub mod mock;
pub mod openai;
pub mod retry;

pub use agents::AgentsClient;
pub use config::{
    AgentsConfig, AzureOpenAIConfig, Credential, DEFAULT_AGENTS_API_VERSION,
    DEFAULT_OPENAI_API_VERSION,
};
pub use mock::{MockAgentsService, MockFineTuningService};
pub use openai::AzureOpenAIClient;
pub use retry::{RetryConfig, execute_with_retry};
