//! HTTP client for the identity API's login endpoint.

use std::time::Duration;

use curator_auth::LoginResponse;
use curator_core::{DomainError, DomainResult};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Path of the email/password login endpoint, relative to the API base URL.
pub const LOGIN_PATH: &str = "/api/user/v1/login/";

/// Path of the federated (Google) login endpoint, which takes an ID token.
pub const ID_TOKEN_LOGIN_PATH: &str = "/api/user/v1/google/login/";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    InvalidInput(#[from] DomainError),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("account is inactive")]
    Inactive,

    #[error("account not found")]
    AccountNotFound,

    #[error("invalid input format: {0}")]
    Rejected(String),

    #[error("API error ({0}): {1}")]
    Api(u16, String),

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize)]
struct IdTokenCredentials<'a> {
    id_token: &'a str,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Client for authenticating against the admin API.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    api_url: String,
}

impl IdentityClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Network(e.to_string()))?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Exchange email/password for a login response.
    ///
    /// Input is validated before any request is sent. The response body is
    /// returned untouched; deciding whether it establishes a session is the
    /// session store's job.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<LoginResponse, IdentityError> {
        validate_credentials(email, password)?;
        self.post_login(LOGIN_PATH, &Credentials { email, password }).await
    }

    /// Exchange an identity provider's ID token for a login response.
    ///
    /// The endpoint may wrap the payload as `{"message", "data": {...}}`;
    /// the wrapper is removed before parsing.
    pub async fn authenticate_with_id_token(&self, id_token: &str) -> Result<LoginResponse, IdentityError> {
        if id_token.trim().is_empty() {
            return Err(DomainError::validation("missing identity provider token").into());
        }
        self.post_login(ID_TOKEN_LOGIN_PATH, &IdTokenCredentials { id_token }).await
    }

    async fn post_login<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<LoginResponse, IdentityError> {
        let url = format!("{}{}", self.api_url, path);
        tracing::info!(%url, "authenticating");

        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let err = error_for_status(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), error = %err, "login request failed");
            return Err(err);
        }

        parse_login_body(&body)
    }
}

/// Parse a success body, unwrapping a `data` envelope when the top level
/// carries no token of its own.
fn parse_login_body(body: &str) -> Result<LoginResponse, IdentityError> {
    let mut value: Value = serde_json::from_str(body).map_err(|e| IdentityError::Parse(e.to_string()))?;
    if value.get("access_token").is_none() {
        if let Some(data) = value.get_mut("data").filter(|d| d.is_object()).map(Value::take) {
            value = data;
        }
    }
    serde_json::from_value(value).map_err(|e| IdentityError::Parse(e.to_string()))
}

/// Reject empty fields and emails not shaped like `local@domain.tld`.
pub fn validate_credentials(email: &str, password: &str) -> DomainResult<()> {
    if email.is_empty() || password.is_empty() {
        return Err(DomainError::validation("please enter both email and password"));
    }
    if !looks_like_email(email) {
        return Err(DomainError::validation("please enter a valid email address"));
    }
    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Needs a dot with at least one character on each side.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Map a non-success response to a typed error.
pub fn error_for_status(status: u16, body: &str) -> IdentityError {
    match status {
        401 => IdentityError::InvalidCredentials,
        403 => IdentityError::Inactive,
        404 => IdentityError::AccountNotFound,
        422 => IdentityError::Rejected(
            server_message(body).unwrap_or_else(|| "check your email and password".to_string()),
        ),
        other => IdentityError::Api(
            other,
            server_message(body).unwrap_or_else(|| "invalid credentials, please try again".to_string()),
        ),
    }
}

/// First of `message`, `detail`, `error` present in a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "detail", "error"].iter().find_map(|field| match value.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("alice@example.com"));
        assert!(looks_like_email("a@b.c"));
        assert!(!looks_like_email("alice@example"));
        assert!(!looks_like_email("alice@.com"));
        assert!(!looks_like_email("alice@example."));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("al ice@example.com"));
        assert!(!looks_like_email("a@b@c.com"));
    }

    #[test]
    fn empty_fields_are_rejected_first() {
        let err = validate_credentials("", "pw").unwrap_err();
        assert_eq!(err, DomainError::validation("please enter both email and password"));
        assert!(validate_credentials("alice@example.com", "pw").is_ok());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(error_for_status(401, ""), IdentityError::InvalidCredentials));
        assert!(matches!(error_for_status(403, ""), IdentityError::Inactive));
        assert!(matches!(error_for_status(404, ""), IdentityError::AccountNotFound));
        assert!(matches!(error_for_status(422, "{}"), IdentityError::Rejected(_)));

        match error_for_status(400, r#"{"detail": "User has no role assigned"}"#) {
            IdentityError::Api(400, msg) => assert_eq!(msg, "User has no role assigned"),
            other => panic!("unexpected: {other:?}"),
        }
        match error_for_status(500, r#"{"message": null, "error": "boom"}"#) {
            IdentityError::Api(500, msg) => assert_eq!(msg, "boom"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn authenticate_posts_credentials_and_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({"email": "alice@example.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Login successful",
                "access_token": "t1",
                "refresh_token": "r1",
                "token_type": "bearer",
                "user": {"id": 1, "username": "alice", "role_id": 5, "role_name": "Editor"},
                "permissions": {"read_image": true}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = IdentityClient::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();
        let response = client.authenticate("alice@example.com", "pw").await.unwrap();

        assert_eq!(response.access_token.as_deref(), Some("t1"));
        assert_eq!(response.message.as_deref(), Some("Login successful"));
    }

    #[tokio::test]
    async fn authenticate_maps_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid Credentials"})))
            .mount(&server)
            .await;

        let client = IdentityClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.authenticate("alice@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[test]
    fn login_body_envelope_is_unwrapped() {
        let wrapped = parse_login_body(
            r#"{"message": "Successful", "data": {"access_token": "t1", "user": {"id": 1}}, "count": null}"#,
        )
        .unwrap();
        assert_eq!(wrapped.access_token.as_deref(), Some("t1"));
        assert!(wrapped.user.is_some());

        let flat = parse_login_body(r#"{"access_token": "t2", "data": {"access_token": "ignored"}}"#).unwrap();
        assert_eq!(flat.access_token.as_deref(), Some("t2"));

        assert!(matches!(parse_login_body("<html>"), Err(IdentityError::Parse(_))));
    }

    #[tokio::test]
    async fn id_token_login_posts_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ID_TOKEN_LOGIN_PATH))
            .and(body_json(json!({"id_token": "google-jwt"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Successful",
                "data": {
                    "access_token": "t1",
                    "refresh_token": "r1",
                    "user": {"id": 1, "email": "alice@example.com", "role_id": 5, "role_name": "Editor"},
                    "permissions": {"read_image": true}
                },
                "count": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = IdentityClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let response = client.authenticate_with_id_token("google-jwt").await.unwrap();
        assert_eq!(response.refresh_token.as_deref(), Some("r1"));
        assert_eq!(response.user.and_then(|u| u.role_name).as_deref(), Some("Editor"));

        let err = client.authenticate_with_id_token("  ").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn invalid_input_never_hits_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = IdentityClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.authenticate("not-an-email", "pw").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidInput(_)));
    }
}
