//! Display text for session notices and the error → message mapping.

use tracing::error;

use crate::api::ApiError;

pub const MISSING_CREDENTIALS: &str = "Please enter both email and password";
pub const MISSING_RESET_FIELDS: &str = "Please provide the reset token and a new password";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const USER_NOT_FOUND: &str = "User not found";
pub const INVALID_REQUEST: &str = "Invalid request. Please check your details.";
pub const SERVER_ERROR: &str = "Server error. Please try again later.";
pub const NETWORK_ERROR: &str = "Network error. Please check your internet connection.";
pub const TIMEOUT_ERROR: &str = "Request timed out. Please try again.";
pub const INVALID_RESPONSE: &str = "Unexpected response from server. Please try again.";
pub const STORAGE_FAILED: &str = "Could not save your session on this device.";
pub const LOGIN_FAILED: &str = "Login failed. Please try again.";
pub const REGISTER_FAILED: &str = "Registration failed. Please try again.";
pub const GOOGLE_FAILED: &str = "Google sign-in failed. Please try again.";
pub const RESET_FAILED: &str = "Password reset failed. Please try again.";
pub const RESET_SUCCEEDED: &str = "Password reset successful. Please log in with your new password.";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
pub const SESSION_VERIFY_FAILED: &str = "We could not verify your session. Please log in again.";
pub const SESSION_VERIFY_TIMEOUT: &str = "Session check timed out. Please log in again.";
pub const LOGOUT_INCOMPLETE: &str = "You were signed out, but this device still holds saved login data.";

/// Credential flow a notice belongs to; selects titles and fallback text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    Login,
    Register,
    Google,
    ResetPassword,
}

impl AuthFlow {
    #[must_use]
    pub fn failure_title(self) -> &'static str {
        match self {
            Self::Login => "Login Failed",
            Self::Register => "Registration Failed",
            Self::Google => "Google Sign-In Failed",
            Self::ResetPassword => "Reset Failed",
        }
    }

    #[must_use]
    pub fn success_title(self) -> &'static str {
        match self {
            Self::Login | Self::Google => "Welcome Back",
            Self::Register => "Welcome",
            Self::ResetPassword => "Password Updated",
        }
    }

    #[must_use]
    pub fn fallback_message(self) -> &'static str {
        match self {
            Self::Login => LOGIN_FAILED,
            Self::Register => REGISTER_FAILED,
            Self::Google => GOOGLE_FAILED,
            Self::ResetPassword => RESET_FAILED,
        }
    }

    /// Whether 401/404 mean "wrong credentials" for this flow.
    fn maps_credential_statuses(self) -> bool {
        matches!(self, Self::Login | Self::Google)
    }
}

/// Convert a gateway error into one display-ready sentence.
#[must_use]
pub fn describe_error(err: &ApiError, flow: AuthFlow) -> String {
    match err {
        ApiError::Status { status: 401, .. } if flow.maps_credential_statuses() => INVALID_CREDENTIALS.to_owned(),
        ApiError::Status { status: 404, .. } if flow.maps_credential_statuses() => USER_NOT_FOUND.to_owned(),
        ApiError::Status { status, .. } if *status >= 500 => SERVER_ERROR.to_owned(),
        ApiError::Status { status: 400, .. } => err
            .server_message()
            .unwrap_or(INVALID_REQUEST)
            .to_owned(),
        ApiError::Status { .. } => err
            .server_message()
            .unwrap_or(flow.fallback_message())
            .to_owned(),
        ApiError::Network(_) => NETWORK_ERROR.to_owned(),
        ApiError::Timeout => TIMEOUT_ERROR.to_owned(),
        ApiError::Parse(_) | ApiError::HttpClientBuild(_) => {
            error!(error = %err, ?flow, "unclassified gateway error");
            SERVER_ERROR.to_owned()
        }
    }
}

#[cfg(test)]
#[path = "messages_test.rs"]
mod tests;
