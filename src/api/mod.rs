//! API gateway — the REST surface the session store depends on.
//!
//! DESIGN
//! ======
//! `AuthApi` is the seam: the session store only sees this trait, so tests
//! drive it with scripted mocks and the binary plugs in [`HttpApi`].

pub mod http;
pub mod types;

pub use http::HttpApi;
pub use types::{ApiError, Envelope, LoginRequest, ResetPasswordRequest, User};

use serde_json::Value;

/// Remote authentication endpoints.
///
/// Every method resolves to the server envelope, or to an [`ApiError`] when
/// the request failed at the transport or HTTP-status level.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &LoginRequest) -> Result<Envelope, ApiError>;

    async fn register(&self, user_data: &Value) -> Result<Envelope, ApiError>;

    async fn google_auth(&self, google_data: &Value) -> Result<Envelope, ApiError>;

    async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<Envelope, ApiError>;

    /// Fetch the profile belonging to `token`.
    async fn get_profile(&self, token: &str) -> Result<Envelope, ApiError>;
}
