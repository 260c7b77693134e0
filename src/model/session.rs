//! Session state machine and credential lifecycle.
//!
//! Phases: Bootstrapping (checking stored credentials at startup), Anonymous
//! and Authenticated. Login/register transition to Authenticated and persist
//! the token to the tier chosen by the "remember me" flag; logout and any
//! unauthorized response transition back to Anonymous.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::TokenStore;
use super::api_client::{ApiClient, ApiError, ApiResult};
use super::types::User;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Bootstrapping,
    Anonymous,
    Authenticated,
}

#[derive(Clone, Debug)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub phase: SessionPhase,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            phase: SessionPhase::Bootstrapping,
        }
    }
}

/// The single session instance, shared by clone.
#[derive(Clone)]
pub struct Session {
    api: ApiClient,
    store: TokenStore,
    state: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new(api: ApiClient, store: TokenStore) -> Self {
        Self {
            api,
            store,
            state: Arc::new(RwLock::new(SessionState::default())),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    /// Resolve the stored credential once at startup.
    ///
    /// A token found in either storage tier is validated against the server;
    /// validation failure clears the stored credential and lands Anonymous.
    pub async fn bootstrap(&self) {
        let Some(token) = self.store.load() else {
            tracing::info!("No stored token, starting anonymous");
            *self.state.write().await = SessionState {
                user: None,
                token: None,
                phase: SessionPhase::Anonymous,
            };
            return;
        };

        self.api.set_token(Some(token.clone())).await;
        match self.api.me().await {
            Ok(user) => {
                tracing::info!(username = %user.username, "Restored session from stored token");
                *self.state.write().await = SessionState {
                    user: Some(user),
                    token: Some(token),
                    phase: SessionPhase::Authenticated,
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored token rejected, starting anonymous");
                self.store.clear();
                self.api.set_token(None).await;
                *self.state.write().await = SessionState {
                    user: None,
                    token: None,
                    phase: SessionPhase::Anonymous,
                };
            }
        }
    }

    /// Exchange credentials for a session. On failure the state is left
    /// unchanged and the error is returned for the form to display.
    pub async fn login(&self, email: &str, password: &str, remember: bool) -> ApiResult<()> {
        let auth = self.api.login(email, password).await?;

        if let Err(e) = self.store.save(&auth.access_token, remember) {
            tracing::warn!(error = %e, "Failed to persist token");
        }
        *self.state.write().await = SessionState {
            user: Some(auth.user),
            token: Some(auth.access_token),
            phase: SessionPhase::Authenticated,
        };
        Ok(())
    }

    /// Create an account and start a session. The token lands in the
    /// session-scoped tier.
    pub async fn register(&self, email: &str, username: &str, password: &str) -> ApiResult<()> {
        let auth = self.api.register(email, username, password).await?;

        if let Err(e) = self.store.save(&auth.access_token, false) {
            tracing::warn!(error = %e, "Failed to persist token");
        }
        *self.state.write().await = SessionState {
            user: Some(auth.user),
            token: Some(auth.access_token),
            phase: SessionPhase::Authenticated,
        };
        Ok(())
    }

    /// Clear the credential from every persistence location and go
    /// Anonymous. Cannot fail.
    pub async fn logout(&self) {
        tracing::info!("Logging out");
        self.store.clear();
        self.api.set_token(None).await;
        *self.state.write().await = SessionState {
            user: None,
            token: None,
            phase: SessionPhase::Anonymous,
        };
    }

    /// React to an unauthorized response from any authenticated request by
    /// forcing a logout.
    pub async fn handle_unauthorized(&self) {
        if self.state.read().await.phase == SessionPhase::Authenticated {
            tracing::warn!("Server rejected our token, forcing logout");
            self.logout().await;
        }
    }

    /// Refresh the access token (coalesced across concurrent callers) and
    /// keep the stored credential in step. A failed refresh ends the session.
    pub async fn refresh_token(&self) -> Result<String, Arc<ApiError>> {
        match self.api.refresh_token().await {
            Ok(token) => {
                if let Err(e) = self.store.update(&token) {
                    tracing::warn!(error = %e, "Failed to persist refreshed token");
                }
                self.state.write().await.token = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, logging out");
                self.logout().await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_with(server_uri: &str, dir: &TempDir) -> Session {
        let api = ApiClient::new(server_uri).unwrap();
        let store = TokenStore::with_paths(
            dir.path().join("session-token"),
            dir.path().join("durable-token"),
        );
        Session::new(api, store)
    }

    fn auth_body(token: &str, username: &str) -> serde_json::Value {
        serde_json::json!({
            "access_token": token,
            "user": {
                "id": "u1",
                "email": format!("{}@example.com", username),
                "username": username,
            }
        })
    }

    #[tokio::test]
    async fn bootstrap_without_a_token_lands_anonymous() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let session = session_with(&server.uri(), &dir);

        assert_eq!(session.phase().await, SessionPhase::Bootstrapping);
        session.bootstrap().await;

        let state = session.snapshot().await;
        assert_eq!(state.phase, SessionPhase::Anonymous);
        assert!(!state.is_authenticated());
    }

    #[tokio::test]
    async fn bootstrap_restores_a_valid_stored_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("Authorization", "Bearer stored-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "u1",
                "email": "a@b.com",
                "username": "alice",
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = session_with(&server.uri(), &dir);
        std::fs::write(dir.path().join("durable-token"), "stored-tok").unwrap();

        session.bootstrap().await;

        let state = session.snapshot().await;
        assert_eq!(state.phase, SessionPhase::Authenticated);
        assert_eq!(state.token.as_deref(), Some("stored-tok"));
        assert_eq!(state.user.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn bootstrap_clears_a_rejected_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": "Could not validate credentials"
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = session_with(&server.uri(), &dir);
        std::fs::write(dir.path().join("durable-token"), "expired-tok").unwrap();

        session.bootstrap().await;

        assert_eq!(session.phase().await, SessionPhase::Anonymous);
        assert!(!dir.path().join("durable-token").exists());
        assert!(session.api().token().await.is_none());
    }

    #[tokio::test]
    async fn login_with_remember_stores_the_durable_tier() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("tok-d", "alice")))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = session_with(&server.uri(), &dir);

        session.login("a@b.com", "secret", true).await.unwrap();

        let state = session.snapshot().await;
        assert!(state.is_authenticated());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("durable-token")).unwrap(),
            "tok-d"
        );
        assert!(!dir.path().join("session-token").exists());
    }

    #[tokio::test]
    async fn login_without_remember_stores_the_session_tier() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("tok-s", "alice")))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = session_with(&server.uri(), &dir);

        session.login("a@b.com", "secret", false).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("session-token")).unwrap(),
            "tok-s"
        );
        assert!(!dir.path().join("durable-token").exists());
    }

    #[tokio::test]
    async fn failed_login_leaves_the_session_untouched() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": "Incorrect email or password"
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = session_with(&server.uri(), &dir);
        session.bootstrap().await;

        let result = session.login("a@b.com", "wrong", true).await;

        assert!(result.is_err());
        let state = session.snapshot().await;
        assert_eq!(state.phase, SessionPhase::Anonymous);
        assert!(!state.is_authenticated());
        assert!(!dir.path().join("durable-token").exists());
        assert!(!dir.path().join("session-token").exists());
    }

    #[tokio::test]
    async fn logout_clears_every_persistence_location() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("tok-x", "alice")))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = session_with(&server.uri(), &dir);
        session.login("a@b.com", "secret", true).await.unwrap();

        session.logout().await;

        let state = session.snapshot().await;
        assert_eq!(state.phase, SessionPhase::Anonymous);
        assert!(state.token.is_none());
        assert!(!dir.path().join("durable-token").exists());
        assert!(session.api().token().await.is_none());
    }

    #[tokio::test]
    async fn unauthorized_response_forces_logout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("tok-y", "alice")))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = session_with(&server.uri(), &dir);
        session.login("a@b.com", "secret", false).await.unwrap();
        assert_eq!(session.phase().await, SessionPhase::Authenticated);

        session.handle_unauthorized().await;

        assert_eq!(session.phase().await, SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn refresh_updates_the_stored_credential_in_place() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("tok-old", "alice")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-new"
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = session_with(&server.uri(), &dir);
        session.login("a@b.com", "secret", true).await.unwrap();

        let token = session.refresh_token().await.unwrap();

        assert_eq!(token, "tok-new");
        assert_eq!(session.snapshot().await.token.as_deref(), Some("tok-new"));
        // The refreshed token stays in the tier the login chose.
        assert_eq!(
            std::fs::read_to_string(dir.path().join("durable-token")).unwrap(),
            "tok-new"
        );
    }

    #[tokio::test]
    async fn failed_refresh_ends_the_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("tok-z", "alice")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Token expired"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let session = session_with(&server.uri(), &dir);
        session.login("a@b.com", "secret", false).await.unwrap();

        let result = session.refresh_token().await;

        assert!(result.is_err());
        assert_eq!(session.phase().await, SessionPhase::Anonymous);
        assert!(!dir.path().join("session-token").exists());
    }
}
