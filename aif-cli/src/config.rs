//! Service configuration read from the process environment.

use aif_client::{AgentsConfig, AzureOpenAIConfig, Credential};
use aif_core::{AifError, Result};

pub const OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const PROJECT_ENDPOINT: &str = "AZURE_AI_PROJECT_ENDPOINT";
pub const AGENTS_TOKEN: &str = "AZURE_AI_AGENTS_TOKEN";
pub const AGENTS_API_KEY: &str = "AZURE_AI_AGENTS_API_KEY";
pub const AGENTS_API_VERSION: &str = "AZURE_AI_AGENTS_API_VERSION";

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Non-empty, trimmed value of `name`.
fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    optional(lookup, name)
        .ok_or_else(|| AifError::Config(format!("{name} environment variable not set")))
}

pub fn openai_config_from_env() -> Result<AzureOpenAIConfig> {
    openai_config_from_lookup(env_lookup)
}

pub fn openai_config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AzureOpenAIConfig> {
    let config =
        AzureOpenAIConfig::new(required(&lookup, OPENAI_ENDPOINT)?, required(&lookup, OPENAI_API_KEY)?);
    Ok(match optional(&lookup, OPENAI_API_VERSION) {
        Some(version) => config.with_api_version(version),
        None => config,
    })
}

pub fn agents_config_from_env() -> Result<AgentsConfig> {
    agents_config_from_lookup(env_lookup)
}

/// A bearer token takes precedence over an API key.
pub fn agents_config_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<AgentsConfig> {
    let endpoint = required(&lookup, PROJECT_ENDPOINT)?;
    let credential = match (optional(&lookup, AGENTS_TOKEN), optional(&lookup, AGENTS_API_KEY)) {
        (Some(token), _) => Credential::Bearer(token),
        (None, Some(key)) => Credential::ApiKey(key),
        (None, None) => {
            return Err(AifError::Config(format!(
                "{AGENTS_TOKEN} or {AGENTS_API_KEY} environment variable not set"
            )));
        }
    };
    let config = AgentsConfig::new(endpoint, credential);
    Ok(match optional(&lookup, AGENTS_API_VERSION) {
        Some(version) => config.with_api_version(version),
        None => config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aif_client::{DEFAULT_AGENTS_API_VERSION, DEFAULT_OPENAI_API_VERSION};
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn openai_config_requires_endpoint_and_key() {
        let err = openai_config_from_lookup(vars(&[(OPENAI_API_KEY, "k")])).unwrap_err();
        assert!(matches!(err, AifError::Config(ref msg) if msg.contains(OPENAI_ENDPOINT)));

        let err = openai_config_from_lookup(vars(&[(OPENAI_ENDPOINT, "https://x"), (OPENAI_API_KEY, " ")]))
            .unwrap_err();
        assert!(matches!(err, AifError::Config(ref msg) if msg.contains(OPENAI_API_KEY)));
    }

    #[test]
    fn openai_config_defaults_api_version() {
        let config = openai_config_from_lookup(vars(&[
            (OPENAI_ENDPOINT, "https://x.openai.azure.com"),
            (OPENAI_API_KEY, "k"),
        ]))
        .unwrap();
        assert_eq!(config.api_version, DEFAULT_OPENAI_API_VERSION);
        assert_eq!(config.credential, Credential::ApiKey("k".into()));

        let config = openai_config_from_lookup(vars(&[
            (OPENAI_ENDPOINT, "https://x.openai.azure.com"),
            (OPENAI_API_KEY, "k"),
            (OPENAI_API_VERSION, "2024-10-21"),
        ]))
        .unwrap();
        assert_eq!(config.api_version, "2024-10-21");
    }

    #[test]
    fn agents_config_prefers_bearer_token() {
        let config = agents_config_from_lookup(vars(&[
            (PROJECT_ENDPOINT, "https://p.services.ai.azure.com/api/projects/demo"),
            (AGENTS_TOKEN, "t"),
            (AGENTS_API_KEY, "k"),
        ]))
        .unwrap();
        assert_eq!(config.credential, Credential::Bearer("t".into()));
        assert_eq!(config.api_version, DEFAULT_AGENTS_API_VERSION);

        let config = agents_config_from_lookup(vars(&[
            (PROJECT_ENDPOINT, "https://p"),
            (AGENTS_API_KEY, "k"),
        ]))
        .unwrap();
        assert_eq!(config.credential, Credential::ApiKey("k".into()));
    }

    #[test]
    fn agents_config_requires_a_credential() {
        let err = agents_config_from_lookup(vars(&[(PROJECT_ENDPOINT, "https://p")])).unwrap_err();
        assert!(err.to_string().contains(AGENTS_TOKEN));
    }
}
