//! reqwest-backed implementation of [`AuthApi`].
//!
//! Thin HTTP wrapper; status/body interpretation lives in `parse_response`
//! so it can be tested without a server.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::AuthApi;
use super::types::{ApiError, Envelope, LoginRequest, ResetPasswordRequest};
use crate::config::Timeouts;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const GOOGLE_AUTH_PATH: &str = "/auth/google";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";
const PROFILE_PATH: &str = "/auth/profile";

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Build a client rooted at `base_url` (no trailing slash needed).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the reqwest client fails to build.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Envelope, ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(classify_transport_error)?;
        read_envelope(response).await
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpApi {
    async fn login(&self, credentials: &LoginRequest) -> Result<Envelope, ApiError> {
        self.post_json(LOGIN_PATH, credentials).await
    }

    async fn register(&self, user_data: &Value) -> Result<Envelope, ApiError> {
        self.post_json(REGISTER_PATH, user_data).await
    }

    async fn google_auth(&self, google_data: &Value) -> Result<Envelope, ApiError> {
        self.post_json(GOOGLE_AUTH_PATH, google_data).await
    }

    async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<Envelope, ApiError> {
        self.post_json(RESET_PASSWORD_PATH, request).await
    }

    async fn get_profile(&self, token: &str) -> Result<Envelope, ApiError> {
        let response = self
            .http
            .get(self.url(PROFILE_PATH))
            .bearer_auth(token)
            .send()
            .await
            .map_err(classify_transport_error)?;
        read_envelope(response).await
    }
}

async fn read_envelope(response: reqwest::Response) -> Result<Envelope, ApiError> {
    let status = response.status().as_u16();
    let text = response.text().await.map_err(classify_transport_error)?;
    parse_response(status, &text)
}

fn classify_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_decode() {
        ApiError::Parse(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn parse_response(status: u16, body: &str) -> Result<Envelope, ApiError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.error));
        return Err(ApiError::Status { status, message });
    }
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
