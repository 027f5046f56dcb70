use routebind::config::AppConfig;
use routebind::demo::build_app;
use routebind::security::SignedTokenDecoder;
use routebind::{Dispatcher, RawRequest};
use serde_json::json;

const SIGNATURE: &str = "integration-signature";

fn secured_app() -> Dispatcher {
    let mut config = AppConfig::default();
    config.security.bearer.signature = SIGNATURE.to_string();
    build_app(&config).unwrap()
}

fn with_auth(target: &str, authorization: &str) -> RawRequest {
    RawRequest::new("GET", target).header("Authorization", authorization)
}

#[test]
fn test_missing_token_is_unauthorized() {
    let app = secured_app();
    for target in ["/items-secure/", "/users/me"] {
        let outcome = app.dispatch(RawRequest::new("GET", target));
        assert_eq!(outcome.response.status, 401, "{target}");
        assert_eq!(outcome.response.get_header("www-authenticate"), Some("Bearer"));
        assert_eq!(outcome.response.body["detail"], "Not authenticated");
    }
}

#[test]
fn test_wrong_scheme_is_unauthorized() {
    let app = secured_app();
    let outcome = app.dispatch(with_auth("/items-secure/", "Basic dXNlcjpwYXNz"));
    assert_eq!(outcome.response.status, 401);
    let empty = app.dispatch(with_auth("/items-secure/", "Bearer "));
    assert_eq!(empty.response.status, 401);
}

#[test]
fn test_bearer_token_is_passed_through() {
    let app = secured_app();
    let outcome = app.dispatch(with_auth("/items-secure/", "bearer abc123"));
    assert_eq!(outcome.response.status, 200);
    assert_eq!(outcome.response.body, json!({"token": "abc123"}));
}

#[test]
fn test_current_user_from_signed_token() {
    let app = secured_app();
    let token = SignedTokenDecoder::new(SIGNATURE).encode(&json!({
        "sub": "johndoe",
        "email": "john@example.com",
        "full_name": "John Doe",
        "scope": "ignored"
    }));
    let outcome = app.dispatch(with_auth("/users/me", &format!("Bearer {token}")));
    assert_eq!(outcome.response.status, 200);
    assert_eq!(
        outcome.response.body,
        json!({
            "username": "johndoe",
            "email": "john@example.com",
            "full_name": "John Doe",
            "disabled": null
        })
    );
}

#[test]
fn test_forged_or_malformed_tokens_rejected() {
    let app = secured_app();
    let forged = SignedTokenDecoder::new("someone-else").encode(&json!({"sub": "mallory"}));
    for token in [forged.as_str(), "not-a-token", "a.b.c"] {
        let outcome = app.dispatch(with_auth("/users/me", &format!("Bearer {token}")));
        assert_eq!(outcome.response.status, 401, "{token}");
        assert_eq!(outcome.response.body["detail"], "Could not validate credentials");
        assert_eq!(outcome.response.get_header("www-authenticate"), Some("Bearer"));
    }
}

#[test]
fn test_token_without_subject_rejected() {
    let app = secured_app();
    let token = SignedTokenDecoder::new(SIGNATURE).encode(&json!({"email": "x@example.com"}));
    let outcome = app.dispatch(with_auth("/users/me", &format!("Bearer {token}")));
    assert_eq!(outcome.response.status, 401);
}
