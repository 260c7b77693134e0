//! HTTP client for the music server API.
//!
//! Thin request/response mapping over the server's endpoints — no retries,
//! no caching. The one exception is token refresh, which is coalesced: all
//! concurrent callers share a single in-flight request.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use super::types::{Playlist, Song, User};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors surfaced by the remote data layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    Parse(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Response of the login and register endpoints.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Error body the server produces (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: Option<String>,
}

type SharedRefresh = Shared<BoxFuture<'static, Result<String, Arc<ApiError>>>>;

/// Build the streamable resource locator for a song.
pub fn stream_url(base_url: &str, song_id: &str) -> String {
    format!("{}/songs/stream/{}", base_url, song_id)
}

/// API client with bearer auth and coalesced token refresh.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
    refresh_in_flight: Arc<Mutex<Option<SharedRefresh>>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
            refresh_in_flight: Arc::new(Mutex::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Streamable resource locator for a song; the transport fetches it with
    /// the shared bearer token.
    pub fn stream_url(&self, song_id: &str) -> String {
        stream_url(&self.base_url, song_id)
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Shared token cell, handed to collaborators that attach bearer auth
    /// themselves (the audio transport).
    pub fn token_cell(&self) -> Arc<RwLock<Option<String>>> {
        self.token.clone()
    }

    // ========================================================================
    // Auth endpoints
    // ========================================================================

    /// Exchange credentials for a token and user profile.
    ///
    /// The wire contract is form-encoded with the email in the `username`
    /// field. The token is kept on the client for subsequent requests.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let url = format!("{}/auth/login", self.base_url);
        tracing::debug!(url = %url, "API: login");

        let form = [("username", email), ("password", password)];
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let auth: AuthResponse = Self::parse_response(response).await?;
        self.set_token(Some(auth.access_token.clone())).await;
        tracing::info!(username = %auth.user.username, "Login successful");
        Ok(auth)
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> ApiResult<AuthResponse> {
        let url = format!("{}/auth/register", self.base_url);
        tracing::debug!(url = %url, username, "API: register");

        let body = serde_json::json!({
            "email": email,
            "username": username,
            "password": password,
        });
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let auth: AuthResponse = Self::parse_response(response).await?;
        self.set_token(Some(auth.access_token.clone())).await;
        tracing::info!(username = %auth.user.username, "Registration successful");
        Ok(auth)
    }

    pub async fn me(&self) -> ApiResult<User> {
        let url = format!("{}/auth/me", self.base_url);
        tracing::debug!(url = %url, "API: me");
        let response = self.get_authed(&url).await?;
        Self::parse_response(response).await
    }

    /// Refresh the access token, coalescing concurrent callers.
    ///
    /// The in-flight refresh is held as a shared future: whoever arrives
    /// while one is pending awaits the same result, and exactly one HTTP
    /// request is issued. The slot is released when the request settles.
    pub async fn refresh_token(&self) -> Result<String, Arc<ApiError>> {
        let shared = {
            let mut in_flight = self.refresh_in_flight.lock().await;
            if let Some(pending) = in_flight.as_ref() {
                tracing::debug!("Token refresh already in flight, joining it");
                pending.clone()
            } else {
                let client = self.clone();
                let fut = async move {
                    let result = client.do_refresh().await.map_err(Arc::new);
                    *client.refresh_in_flight.lock().await = None;
                    result
                }
                .boxed()
                .shared();
                *in_flight = Some(fut.clone());
                fut
            }
        };
        shared.await
    }

    async fn do_refresh(&self) -> ApiResult<String> {
        let url = format!("{}/auth/refresh", self.base_url);
        tracing::debug!(url = %url, "API: refresh token");

        let mut request = self.http.post(&url);
        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let refreshed: RefreshResponse = Self::parse_response(response).await?;
        self.set_token(Some(refreshed.access_token.clone())).await;
        tracing::info!("Token refreshed");
        Ok(refreshed.access_token)
    }

    // ========================================================================
    // Song endpoints
    // ========================================================================

    pub async fn get_songs(&self) -> ApiResult<Vec<Song>> {
        let url = format!("{}/songs/", self.base_url);
        tracing::debug!(url = %url, "API: get_songs");
        let response = self.get_authed(&url).await?;
        Self::parse_response(response).await
    }

    pub async fn search_songs(&self, query: &str) -> ApiResult<Vec<Song>> {
        let url = format!("{}/songs/search", self.base_url);
        tracing::debug!(url = %url, query, "API: search_songs");

        let mut request = self.http.get(&url).query(&[("q", query)]);
        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::parse_response(response).await
    }

    // ========================================================================
    // Playlist endpoints
    // ========================================================================

    pub async fn get_playlists(&self) -> ApiResult<Vec<Playlist>> {
        let url = format!("{}/playlists/", self.base_url);
        tracing::debug!(url = %url, "API: get_playlists");
        let response = self.get_authed(&url).await?;
        Self::parse_response(response).await
    }

    pub async fn create_playlist(&self, name: &str) -> ApiResult<Playlist> {
        let url = format!("{}/playlists/", self.base_url);
        tracing::debug!(url = %url, name, "API: create_playlist");

        let body = serde_json::json!({ "name": name });
        let mut request = self.http.post(&url).json(&body);
        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::parse_response(response).await
    }

    pub async fn add_song_to_playlist(&self, playlist_id: &str, song_id: &str) -> ApiResult<()> {
        let url = format!("{}/playlists/{}/songs/{}", self.base_url, playlist_id, song_id);
        tracing::debug!(url = %url, "API: add_song_to_playlist");

        let mut request = self.http.post(&url);
        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check_status(response).await?;
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn get_authed(&self, url: &str) -> ApiResult<reqwest::Response> {
        let mut request = self.http.get(url);
        if let Some(token) = self.token().await {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.as_u16() == 401 {
            return Err(ApiError::Unauthorized);
        }

        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| {
                serde_json::from_str::<ApiErrorBody>(&body)
                    .ok()
                    .and_then(|parsed| parsed.detail)
                    .or_else(|| (!body.is_empty()).then_some(body))
            })
            .unwrap_or_else(|| format!("HTTP {}", status));

        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user_json(username: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "u1",
            "email": format!("{}@example.com", username),
            "username": username,
        })
    }

    #[test]
    fn stream_url_is_derived_from_song_id() {
        assert_eq!(
            stream_url("http://localhost:8000", "17"),
            "http://localhost:8000/songs/stream/17"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.stream_url("9"),
            "http://localhost:8000/songs/stream/9"
        );
    }

    #[tokio::test]
    async fn login_sends_form_credentials_and_keeps_the_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_string_contains("username=a%40b.com"))
            .and(body_string_contains("password=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-1",
                "user": user_json("alice"),
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let auth = client.login("a@b.com", "secret").await.unwrap();

        assert_eq!(auth.access_token, "tok-1");
        assert_eq!(auth.user.username, "alice");
        assert_eq!(client.token().await.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn login_with_bad_credentials_is_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "detail": "Incorrect email or password"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let result = client.login("a@b.com", "wrong").await;

        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert!(client.token().await.is_none());
    }

    #[tokio::test]
    async fn register_posts_json_and_keeps_the_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-2",
                "user": user_json("bob"),
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let auth = client.register("b@c.com", "bob", "hunter2").await.unwrap();

        assert_eq!(auth.user.username, "bob");
        assert_eq!(client.token().await.as_deref(), Some("tok-2"));
    }

    #[tokio::test]
    async fn songs_request_carries_the_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/songs/"))
            .and(header("Authorization", "Bearer tok-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "1", "title": "One", "artist": "A", "album": "Alpha", "duration": 180},
                {"id": "2", "title": "Two", "artist": "B", "duration": 200},
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        client.set_token(Some("tok-3".to_string())).await;

        let songs = client.get_songs().await.unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].album.as_deref(), Some("Alpha"));
        assert_eq!(songs[1].album, None);
        assert_eq!(songs[1].duration, 200);
    }

    #[tokio::test]
    async fn search_passes_the_query_parameter() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/songs/search"))
            .and(query_param("q", "night drive"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "7", "title": "Night Drive", "artist": "C", "duration": 240},
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let songs = client.search_songs("night drive").await.unwrap();

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Night Drive");
    }

    #[tokio::test]
    async fn error_detail_is_extracted_from_the_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/playlists/9/songs/1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "detail": "Playlist not found"
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let result = client.add_song_to_playlist("9", "1").await;

        match result.unwrap_err() {
            ApiError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Playlist not found");
            }
            e => panic!("Expected Api error, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn playlist_create_and_list_round_trip() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/playlists/"))
            .and(body_string_contains("Road trip"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "p1", "name": "Road trip", "songs_count": 0
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/playlists/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "p1", "name": "Road trip", "songs_count": 3}
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        let created = client.create_playlist("Road trip").await.unwrap();
        assert_eq!(created.name, "Road trip");

        let playlists = client.get_playlists().await.unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].songs_count, 3);
    }

    #[tokio::test]
    async fn concurrent_refreshes_coalesce_into_one_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_millis(100))
                    .set_body_json(serde_json::json!({"access_token": "tok-fresh"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        client.set_token(Some("tok-stale".to_string())).await;

        let (a, b) = tokio::join!(client.refresh_token(), client.refresh_token());

        assert_eq!(a.unwrap(), "tok-fresh");
        assert_eq!(b.unwrap(), "tok-fresh");
        assert_eq!(client.token().await.as_deref(), Some("tok-fresh"));
        // The expect(1) on the mock verifies a single request on drop.
    }

    #[tokio::test]
    async fn refresh_can_run_again_after_the_first_settles() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-a"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri()).unwrap();
        client.set_token(Some("tok-0".to_string())).await;

        client.refresh_token().await.unwrap();
        client.refresh_token().await.unwrap();
    }
}
