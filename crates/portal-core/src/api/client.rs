//! API client for communicating with the backend REST API.
//!
//! `ApiClient` is the production implementation of `AuthApi`. The auth
//! service only depends on the trait, so tests can substitute a fake.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{AuthResponse, LoginRequest, MeResponse};
use super::ApiError;
use crate::cache::QueryKey;

// ============================================================================
// Constants
// ============================================================================

const LOGIN_PATH: &str = "/auth/login";
const CURRENT_USER_PATH: &str = "/auth/me";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Cache key of the current-user query.
pub fn get_current_user_query_key() -> QueryKey {
    QueryKey::new([CURRENT_USER_PATH])
}

/// Operations the auth service needs from the backend.
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a session token.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = std::result::Result<AuthResponse, ApiError>> + Send;

    /// Look up the user the token belongs to.
    fn current_user(
        &self,
        token: &str,
    ) -> impl Future<Output = std::result::Result<MeResponse, ApiError>> + Send;
}

/// API client for the backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error built from the body if not.
    async fn check_response(response: Response) -> std::result::Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            body = %ApiError::truncate_body(&body),
            "Request failed"
        );
        Err(ApiError::from_status(status, &body))
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        url: &str,
    ) -> std::result::Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }
}

impl AuthApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> std::result::Result<AuthResponse, ApiError> {
        let url = self.url(LOGIN_PATH);
        debug!(url = %url, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::decode(response, &url).await
    }

    async fn current_user(&self, token: &str) -> std::result::Result<MeResponse, ApiError> {
        let url = self.url(CURRENT_USER_PATH);
        debug!(url = %url, "Fetching current user");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::decode(response, &url).await
    }
}
