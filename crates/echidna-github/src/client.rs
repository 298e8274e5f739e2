//! HTTP implementation of [`CodeSearchApi`] on top of reqwest.

use crate::api::{
    Account, CodeSearchApi, ItemMetadata, QuotaStatus, RateLimitResponse, SearchPage,
    SearchRequest,
};
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use echidna_core::{ApiConfig, Credential};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Build an HTTP client with the configured timeout and user agent.
///
/// # Errors
/// Returns error if the HTTP client cannot be created.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent)
        .build()
        .map_err(|e| ApiError::Internal(format!("failed to create HTTP client: {e}")))
}

/// Code search client for the GitHub REST API.
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a client from the API settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout_secs, &config.user_agent)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URL of an endpoint path.
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, url: &str, credential: Option<&Credential>) -> RequestBuilder {
        let request = self.client.get(url).header(ACCEPT, ACCEPT_JSON);
        match credential {
            Some(credential) => {
                request.header(AUTHORIZATION, format!("token {}", credential.expose()))
            }
            None => request,
        }
    }

    /// Send a request and return the body of a success response.
    async fn send(request: RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            tracing::debug!(status = status.as_u16(), "non-success API response");
            Err(ApiError::classify(status.as_u16(), body))
        }
    }

    fn parse<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|e| ApiError::Parse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CodeSearchApi for GitHubClient {
    async fn identity(&self, credential: &Credential) -> Result<Account> {
        let body = Self::send(self.get(&self.endpoint("user"), Some(credential))).await?;
        Self::parse("user", &body)
    }

    async fn rate_limit(&self, credential: Option<&Credential>) -> Result<QuotaStatus> {
        let body = Self::send(self.get(&self.endpoint("rate_limit"), credential)).await?;
        let parsed: RateLimitResponse = Self::parse("rate_limit", &body)?;
        Ok(parsed.resources)
    }

    async fn search(&self, credential: &Credential, request: &SearchRequest) -> Result<SearchPage> {
        let builder = self
            .get(&self.endpoint("search/code"), Some(credential))
            .query(request);
        let body = Self::send(builder).await?;
        Self::parse("search/code", &body)
    }

    async fn item_metadata(
        &self,
        credential: Option<&Credential>,
        url: &str,
    ) -> Result<ItemMetadata> {
        let body = Self::send(self.get(url, credential)).await?;
        Self::parse("contents", &body)
    }

    async fn raw_content(&self, download_url: &str) -> Result<String> {
        Self::send(self.client.get(download_url)).await
    }
}
