//! Endpoint and credential configuration for the two Azure services.

use reqwest::RequestBuilder;
use std::fmt;

/// Default data-plane version for Azure OpenAI files, fine-tuning and chat.
pub const DEFAULT_OPENAI_API_VERSION: &str = "2024-05-01-preview";

/// Default version of the Foundry project agents API.
pub const DEFAULT_AGENTS_API_VERSION: &str = "v1";

/// How requests authenticate.
///
/// Tokens are accepted pre-issued; acquiring them (managed identity, CLI
/// login) is left to the caller.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent as the `api-key` header.
    ApiKey(String),
    /// Sent as `Authorization: Bearer <token>`.
    Bearer(String),
}

impl Credential {
    pub(crate) fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::ApiKey(key) => builder.header("api-key", key),
            Self::Bearer(token) => builder.bearer_auth(token),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

/// Configuration for an Azure OpenAI resource.
///
/// # Example
///
/// ```rust,ignore
/// use aif_client::AzureOpenAIConfig;
///
/// let config = AzureOpenAIConfig::new("https://my-resource.openai.azure.com", "my-api-key");
/// ```
#[derive(Debug, Clone)]
pub struct AzureOpenAIConfig {
    /// Resource endpoint (e.g. `https://my-resource.openai.azure.com`).
    pub endpoint: String,
    pub credential: Credential,
    /// Data-plane API version (e.g. `"2024-05-01-preview"`).
    pub api_version: String,
}

impl AzureOpenAIConfig {
    /// Create a config authenticating with an API key and the default API version.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential: Credential::ApiKey(api_key.into()),
            api_version: DEFAULT_OPENAI_API_VERSION.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

/// Configuration for the agents API of an Azure AI Foundry project.
#[derive(Debug, Clone)]
pub struct AgentsConfig {
    /// Project endpoint, e.g.
    /// `https://<resource>.services.ai.azure.com/api/projects/<project>`.
    pub endpoint: String,
    pub credential: Credential,
    pub api_version: String,
}

impl AgentsConfig {
    pub fn new(endpoint: impl Into<String>, credential: Credential) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential,
            api_version: DEFAULT_AGENTS_API_VERSION.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}
