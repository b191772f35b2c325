//! Identity provider client
//!
//! Talks to a GoTrue-compatible REST API: password grant, signup, anonymous
//! signup, federated sign-in via a PKCE code exchange, and logout. Access
//! tokens are cached in the OS keyring so a restart resumes the session
//! without re-entering credentials.

use crate::auth::pkce::PkceChallenge;
use crate::auth::User;
use crate::config::AuthConfig;
use crate::error::{Result, TalviError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A successful sign-in: the bearer token plus the identity it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token for subsequent requests
    pub access_token: String,
    /// The signed-in user
    pub user: User,
}

/// Identity provider operations
///
/// Mocked in tests; implemented over HTTP for real use.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Sign in with email and password
    async fn sign_in_password(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Create an account with email and password
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Create a temporary anonymous identity
    async fn sign_in_anonymous(&self) -> Result<AuthSession>;

    /// Exchange a federated authorization code for a session
    ///
    /// The code comes back from the browser leg of the OAuth flow; the
    /// verifier is the PKCE secret generated before that leg started.
    async fn exchange_code(&self, auth_code: &str, verifier: &str) -> Result<AuthSession>;

    /// Invalidate a bearer token
    async fn sign_out(&self, access_token: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct CodeExchange<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: WireUser,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    is_anonymous: bool,
    created_at: String,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        Self {
            id: wire.id,
            // GoTrue reports anonymous users with an empty email string.
            email: wire.email.filter(|e| !e.is_empty()),
            is_anonymous: wire.is_anonymous,
            created_at: wire.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "error_description", alias = "msg")]
    message: Option<String>,
}

/// HTTP client for a GoTrue-compatible auth API
pub struct HttpAuthClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAuthClient {
    /// Create a client from configuration
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key);
        }
        builder
    }

    /// Authorization URL opening the browser leg of a federated sign-in
    ///
    /// # Arguments
    ///
    /// * `provider` - Federated provider name (e.g. "github", "google")
    /// * `pkce` - Challenge pair generated for this sign-in attempt
    /// * `redirect_to` - Where the provider sends the authorization code
    pub fn authorize_url(
        &self,
        provider: &str,
        pkce: &PkceChallenge,
        redirect_to: &str,
    ) -> Result<String> {
        let mut url = url::Url::parse(&format!("{}/authorize", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "S256");
        Ok(url.to_string())
    }

    async fn parse_session(&self, response: reqwest::Response) -> Result<AuthSession> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("auth API returned {}", status));
            return Err(TalviError::Authentication(message).into());
        }

        let token = response.json::<TokenResponse>().await?;
        Ok(AuthSession {
            access_token: token.access_token,
            user: token.user.into(),
        })
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn sign_in_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .json(&PasswordGrant { email, password })
            .send()
            .await?;
        self.parse_session(response).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&PasswordGrant { email, password })
            .send()
            .await?;
        self.parse_session(response).await
    }

    async fn sign_in_anonymous(&self) -> Result<AuthSession> {
        // Anonymous signup is a signup with an empty body.
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&serde_json::json!({}))
            .send()
            .await?;
        self.parse_session(response).await
    }

    async fn exchange_code(&self, auth_code: &str, verifier: &str) -> Result<AuthSession> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=pkce")
            .json(&CodeExchange {
                auth_code,
                code_verifier: verifier,
            })
            .send()
            .await?;
        self.parse_session(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                TalviError::Authentication(format!("Logout failed with {}", status)).into(),
            );
        }
        Ok(())
    }
}

/// Keyring-backed cache for the current auth session
pub struct TokenStore {
    service: String,
    account: String,
}

impl TokenStore {
    /// Create a store under the default service name
    pub fn new() -> Self {
        Self {
            service: "talvi".to_string(),
            account: "session".to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        let entry = keyring::Entry::new(&self.service, &self.account)?;
        Ok(entry)
    }

    /// Persist a session
    pub fn save(&self, session: &AuthSession) -> Result<()> {
        let encoded = serde_json::to_string(session)?;
        self.entry()?.set_password(&encoded)?;
        Ok(())
    }

    /// Load the cached session, if one exists
    pub fn load(&self) -> Result<Option<AuthSession>> {
        match self.entry()?.get_password() {
            Ok(encoded) => Ok(Some(serde_json::from_str(&encoded)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the cached session
    pub fn clear(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpAuthClient {
        HttpAuthClient::new(&AuthConfig {
            base_url: server.uri(),
            api_key: Some("anon-key".to_string()),
            ..AuthConfig::default()
        })
    }

    fn session_body(id: &str, email: Option<&str>, anonymous: bool) -> serde_json::Value {
        serde_json::json!({
            "access_token": "token-123",
            "token_type": "bearer",
            "user": {
                "id": id,
                "email": email.unwrap_or(""),
                "is_anonymous": anonymous,
                "created_at": "2026-01-01T00:00:00+00:00"
            }
        })
    }

    #[tokio::test]
    async fn test_password_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("apikey", "anon-key"))
            .and(body_string_contains("user@example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(session_body("u1", Some("user@example.com"), false)),
            )
            .mount(&server)
            .await;

        let session = client_for(&server)
            .sign_in_password("user@example.com", "hunter2")
            .await
            .unwrap();

        assert_eq!(session.access_token, "token-123");
        assert_eq!(session.user.id, "u1");
        assert_eq!(session.user.email.as_deref(), Some("user@example.com"));
        assert!(!session.user.is_anonymous);
    }

    #[tokio::test]
    async fn test_rejected_credentials_surface_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .sign_in_password("user@example.com", "wrong")
            .await;

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_anonymous_sign_in_has_no_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signup"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(session_body("anon-1", None, true)),
            )
            .mount(&server)
            .await;

        let session = client_for(&server).sign_in_anonymous().await.unwrap();
        assert!(session.user.is_anonymous);
        assert!(session.user.email.is_none());
        assert_eq!(session.user.created_at, "2026-01-01T00:00:00+00:00");
    }

    #[tokio::test]
    async fn test_sign_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signup"))
            .and(body_string_contains("new@example.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(session_body("u2", Some("new@example.com"), false)),
            )
            .mount(&server)
            .await;

        let session = client_for(&server)
            .sign_up("new@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(session.user.id, "u2");
    }

    #[test]
    fn test_authorize_url_carries_pkce_challenge() {
        let client = HttpAuthClient::new(&AuthConfig {
            base_url: "https://auth.example.com".to_string(),
            ..AuthConfig::default()
        });
        let pkce = crate::auth::pkce::generate();

        let url = client
            .authorize_url("github", &pkce, "http://localhost:3000/auth/callback")
            .unwrap();
        let parsed = url::Url::parse(&url).unwrap();

        assert_eq!(parsed.path(), "/authorize");
        let pairs: Vec<_> = parsed.query_pairs().collect();
        assert!(pairs.iter().any(|(k, v)| k == "provider" && v == "github"));
        assert!(pairs
            .iter()
            .any(|(k, v)| k == "code_challenge" && *v == pkce.challenge));
        assert!(pairs
            .iter()
            .any(|(k, v)| k == "code_challenge_method" && v == "S256"));
    }

    #[tokio::test]
    async fn test_exchange_code_sends_verifier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("\"auth_code\":\"code-abc\""))
            .and(body_string_contains("\"code_verifier\":\"verifier-xyz\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(session_body("u3", Some("fed@example.com"), false)),
            )
            .mount(&server)
            .await;

        let session = client_for(&server)
            .exchange_code("code-abc", "verifier-xyz")
            .await
            .unwrap();
        assert_eq!(session.user.id, "u3");
        assert_eq!(session.user.email.as_deref(), Some("fed@example.com"));
    }

    #[tokio::test]
    async fn test_exchange_rejected_code_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "msg": "Invalid authorization code"
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).exchange_code("stale", "verifier").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sign_out_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/logout"))
            .and(header("authorization", "Bearer token-123"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        assert!(client_for(&server).sign_out("token-123").await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_out_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert!(client_for(&server).sign_out("stale").await.is_err());
    }
}
