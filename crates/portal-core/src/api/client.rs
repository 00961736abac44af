//! HTTP client for the identity backend.
//!
//! `ApiClient` owns the connection pool and base URL and performs the raw
//! auth calls (login, refresh, current user). It never looks at stored
//! tokens itself; `SessionManager` decides what to send and what to keep.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::ApiError;
use crate::models::{LoginCredentials, LoginResponse, RefreshRequest, RefreshTokenResponse, User};

/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const CURRENT_USER_PATH: &str = "/api/auth/me";

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Share an existing connection pool.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Resolve `path` against the base URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ApiError> {
        let url = self.url(LOGIN_PATH);
        debug!(email = %credentials.email, "Sending login request");

        let response = self.client.post(&url).json(credentials).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshTokenResponse, ApiError> {
        let url = self.url(REFRESH_PATH);
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    pub async fn current_user(&self, access_token: Option<&str>) -> Result<User, ApiError> {
        let url = self.url(CURRENT_USER_PATH);
        let mut request = self.client.get(&url);
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    pub async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    pub async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().to_string();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }
}
