//! Shared request plumbing for the REST clients.

use crate::config::Credential;
use crate::retry::{RetryConfig, execute_with_retry};
use aif_core::{AifError, Result};
use aif_telemetry::Instrument;
use reqwest::{Client, Method, RequestBuilder, Url, multipart::Form};
use serde::{Serialize, de::DeserializeOwned};

/// Check that `endpoint` is an absolute http(s) URL and return it without a
/// trailing slash.
pub(crate) fn validate_endpoint(service: &str, endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.is_empty() {
        return Err(AifError::Config(format!("{service} endpoint is empty")));
    }
    let url = Url::parse(endpoint)
        .map_err(|e| AifError::Config(format!("{service} endpoint {endpoint:?} is invalid: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AifError::Config(format!(
            "{service} endpoint {endpoint:?} must be an http or https URL"
        )));
    }
    Ok(endpoint.to_string())
}

#[derive(Clone)]
pub(crate) struct RestTransport {
    client: Client,
    base_url: String,
    credential: Credential,
    api_version: String,
    service: &'static str,
    retry_config: RetryConfig,
}

impl RestTransport {
    pub(crate) fn new(
        service: &'static str,
        base_url: &str,
        credential: Credential,
        api_version: String,
    ) -> Result<Self> {
        let base_url = validate_endpoint(service, base_url)?;

        let client = Client::builder()
            .build()
            .map_err(|e| AifError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            credential,
            api_version,
            service,
            retry_config: RetryConfig::default(),
        })
    }

    pub(crate) fn set_retry_config(&mut self, retry_config: RetryConfig) {
        self.retry_config = retry_config;
    }

    pub(crate) fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .query(&[("api-version", self.api_version.as_str())]);
        self.credential.apply(builder)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: &'static str,
        path: &str,
    ) -> Result<T> {
        let service = self.service;
        let span = aif_telemetry::service_call_span(service, method, path);

        async move {
            let response = builder.send().await.map_err(|e| {
                // A request that cannot be built will never succeed on retry.
                if e.is_builder() {
                    AifError::Config(format!("{service} {method} {path} is malformed: {e}"))
                } else {
                    AifError::Transport(format!("{service} {method} {path} failed: {e}"))
                }
            })?;

            let status = response.status();
            let body = response.text().await.map_err(|e| {
                AifError::Transport(format!("{service} {method} {path} body read failed: {e}"))
            })?;

            if !status.is_success() {
                tracing::debug!(status = status.as_u16(), "request rejected");
                return Err(AifError::from_response(status.as_u16(), &body));
            }

            tracing::debug!(status = status.as_u16(), "request succeeded");
            serde_json::from_str(&body).map_err(|e| {
                AifError::UnexpectedResponse(format!("{service} {method} {path}: {e}"))
            })
        }
        .instrument(span)
        .await
    }

    /// GET with retries on transient failures.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let this = self;
        execute_with_retry(&self.retry_config, path, move || {
            let builder = this.request(Method::GET, path).query(query);
            this.send(builder, "GET", path)
        })
        .await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        self.send(builder, "POST", path).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::POST, path), "POST", path).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T> {
        let builder = self.request(Method::POST, path).multipart(form);
        self.send(builder, "POST", path).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(self.request(Method::DELETE, path), "DELETE", path).await
    }
}
