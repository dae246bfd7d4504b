use super::*;

fn status(status: u16, message: Option<&str>) -> ApiError {
    ApiError::Status { status, message: message.map(str::to_owned) }
}

#[test]
fn login_401_is_invalid_credentials() {
    assert_eq!(describe_error(&status(401, Some("nope")), AuthFlow::Login), INVALID_CREDENTIALS);
}

#[test]
fn login_404_is_user_not_found() {
    assert_eq!(describe_error(&status(404, None), AuthFlow::Login), USER_NOT_FOUND);
    assert_eq!(describe_error(&status(404, None), AuthFlow::Google), USER_NOT_FOUND);
}

#[test]
fn status_400_uses_server_message() {
    assert_eq!(describe_error(&status(400, Some("Email is required")), AuthFlow::Login), "Email is required");
    assert_eq!(describe_error(&status(400, None), AuthFlow::Login), INVALID_REQUEST);
    assert_eq!(describe_error(&status(400, Some("  ")), AuthFlow::Register), INVALID_REQUEST);
}

#[test]
fn server_errors_are_generic() {
    for code in [500, 502, 503] {
        assert_eq!(describe_error(&status(code, Some("stack trace")), AuthFlow::Login), SERVER_ERROR);
    }
}

#[test]
fn network_and_timeout_have_dedicated_text() {
    assert_eq!(describe_error(&ApiError::Network("refused".into()), AuthFlow::Login), NETWORK_ERROR);
    assert_eq!(describe_error(&ApiError::Timeout, AuthFlow::Register), TIMEOUT_ERROR);
}

#[test]
fn register_401_uses_server_message_or_fallback() {
    assert_eq!(describe_error(&status(409, Some("Email already registered")), AuthFlow::Register), "Email already registered");
    assert_eq!(describe_error(&status(401, None), AuthFlow::Register), REGISTER_FAILED);
}

#[test]
fn parse_errors_degrade_to_server_error() {
    assert_eq!(describe_error(&ApiError::Parse("eof".into()), AuthFlow::ResetPassword), SERVER_ERROR);
}

#[test]
fn flow_titles_are_distinct() {
    assert_ne!(AuthFlow::Login.failure_title(), AuthFlow::Register.failure_title());
    assert_eq!(AuthFlow::Google.success_title(), AuthFlow::Login.success_title());
    assert_eq!(AuthFlow::ResetPassword.fallback_message(), RESET_FAILED);
}
