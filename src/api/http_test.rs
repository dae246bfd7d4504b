use super::*;

fn api() -> HttpApi {
    HttpApi::new("http://localhost:5000/api/", Timeouts { request_secs: 1, connect_secs: 1 }).unwrap()
}

// =============================================================================
// parse_response
// =============================================================================

#[test]
fn parse_success_envelope() {
    let body = serde_json::json!({
        "success": true,
        "token": "abc",
        "user": { "id": 1, "name": "Ann" }
    })
    .to_string();
    let env = parse_response(200, &body).unwrap();
    assert!(env.success);
    assert_eq!(env.token.as_deref(), Some("abc"));
    assert_eq!(env.user.unwrap().get_str("name"), Some("Ann"));
}

#[test]
fn parse_failure_envelope_with_ok_status() {
    let body = r#"{"success":false,"message":"bad creds"}"#;
    let env = parse_response(200, body).unwrap();
    assert!(!env.success);
    assert_eq!(env.message(), Some("bad creds"));
    assert!(env.user.is_none());
}

#[test]
fn parse_null_user_is_none() {
    let env = parse_response(200, r#"{"success":true,"user":null}"#).unwrap();
    assert!(env.user.is_none());
}

#[test]
fn parse_error_status_extracts_message() {
    let err = parse_response(400, r#"{"success":false,"message":"Email already exists"}"#).unwrap_err();
    assert_eq!(err, ApiError::Status { status: 400, message: Some("Email already exists".into()) });
    assert_eq!(err.server_message(), Some("Email already exists"));
}

#[test]
fn parse_error_status_falls_back_to_error_field() {
    let err = parse_response(401, r#"{"error":"unauthorized"}"#).unwrap_err();
    assert_eq!(err.server_message(), Some("unauthorized"));
}

#[test]
fn parse_error_status_with_html_body_has_no_message() {
    let err = parse_response(502, "<html>Bad Gateway</html>").unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.server_message(), None);
}

#[test]
fn parse_malformed_success_body_is_parse_error() {
    let err = parse_response(200, "not json").unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

// =============================================================================
// client construction
// =============================================================================

#[test]
fn base_url_trailing_slash_trimmed() {
    let api = api();
    assert_eq!(api.base_url(), "http://localhost:5000/api");
    assert_eq!(api.url(LOGIN_PATH), "http://localhost:5000/api/auth/login");
}

#[test]
fn error_predicates() {
    assert!(ApiError::Timeout.is_timeout());
    assert!(ApiError::Network("refused".into()).is_network_error());
    assert!(!ApiError::Timeout.is_network_error());
    assert_eq!(ApiError::Timeout.status(), None);
}
