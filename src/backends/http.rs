//! HTTP backend talking to the Sentinel REST API.
//!
//! This module provides the [`SentinelApi`] implementation used against a
//! real backend deployment.
//!
//! # Endpoints
//!
//! - `POST {base}/register`, `POST {base}/login` - authentication
//! - `GET/POST {base}/websites` - website collection
//! - `POST {base}/websites/{id}/scan` - begin a scan
//! - `GET {base}/tasks/{task_id}` - poll a scan task

use crate::core::{
    ApiError, AuthToken, Credentials, ScanStarted, SentinelApi, TaskStatus, Website, WebsiteId,
};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

/// HTTP backend configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the API, including the `/api` prefix.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpConfig {
    /// Creates a configuration pointing at a local development backend.
    pub fn new() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/api".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// `SentinelApi` implementation backed by the REST API.
///
/// # Example
///
/// ```rust,ignore
/// use sentinel_client::backends::{HttpApi, HttpConfig};
///
/// let config = HttpConfig::new().with_base_url("https://sentinel.example/api");
/// let api = HttpApi::new(config)?;
/// ```
#[derive(Debug)]
pub struct HttpApi {
    config: HttpConfig,
    client: reqwest::Client,
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::request(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct WebsitesResponse {
    websites: Vec<Website>,
}

#[derive(Debug, Deserialize)]
struct WebsiteResponse {
    website: Website,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpApi {
    /// Creates a new HTTP backend with the given configuration.
    pub fn new(config: HttpConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ApiError::configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Maps a non-2xx response to the error taxonomy.
    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| format!("HTTP {status}"));

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ApiError::auth(message));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::not_found(what.to_string()));
        }
        Err(ApiError::backend(message))
    }

    async fn authenticate(
        &self,
        endpoint: &str,
        credentials: &Credentials,
    ) -> Result<AuthToken, ApiError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password.expose_secret(),
            }))
            .send()
            .await?;

        let body: TokenResponse = Self::check(response, endpoint)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::request(format!("invalid response body: {e}")))?;

        Ok(AuthToken::new(body.token))
    }
}

#[async_trait]
impl SentinelApi for HttpApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        self.authenticate("login", credentials).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        self.authenticate("register", credentials).await
    }

    async fn list_websites(&self, token: &AuthToken) -> Result<Vec<Website>, ApiError> {
        let response = self
            .client
            .get(self.url("websites"))
            .header(reqwest::header::AUTHORIZATION, token.authorization_header())
            .send()
            .await?;

        let body: WebsitesResponse = Self::check(response, "websites")
            .await?
            .json()
            .await
            .map_err(|e| ApiError::request(format!("invalid response body: {e}")))?;

        Ok(body.websites)
    }

    async fn add_website(&self, token: &AuthToken, url: &str) -> Result<Website, ApiError> {
        let response = self
            .client
            .post(self.url("websites"))
            .header(reqwest::header::AUTHORIZATION, token.authorization_header())
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;

        let body: WebsiteResponse = Self::check(response, "websites")
            .await?
            .json()
            .await
            .map_err(|e| ApiError::request(format!("invalid response body: {e}")))?;

        Ok(body.website)
    }

    async fn begin_scan(
        &self,
        token: &AuthToken,
        id: &WebsiteId,
    ) -> Result<ScanStarted, ApiError> {
        let response = self
            .client
            .post(self.url(&format!("websites/{id}/scan")))
            .header(reqwest::header::AUTHORIZATION, token.authorization_header())
            .send()
            .await?;

        Self::check(response, &format!("website {id}"))
            .await?
            .json()
            .await
            .map_err(|e| ApiError::request(format!("invalid response body: {e}")))
    }

    async fn task_status(
        &self,
        token: &AuthToken,
        task_id: &str,
    ) -> Result<TaskStatus, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("tasks/{task_id}")))
            .header(reqwest::header::AUTHORIZATION, token.authorization_header())
            .send()
            .await?;

        Self::check(response, &format!("task {task_id}"))
            .await?
            .json()
            .await
            .map_err(|e| ApiError::request(format!("invalid response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = HttpConfig::new()
            .with_base_url("https://sentinel.example/api/")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.base_url, "https://sentinel.example/api/");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_url_join_trims_trailing_slash() {
        let api = HttpApi::new(HttpConfig::new().with_base_url("https://s.example/api/")).unwrap();
        assert_eq!(api.url("websites"), "https://s.example/api/websites");
    }
}
