#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;
use tracklens::config::Config;

pub const TRACK_ID: &str = "4uLU6hMCjMI75M1A2tKUQC";

/// In-process stand-in for the platform's token endpoint and web API.
///
/// Authorization codes of the form `code-*` are accepted once each. Issued
/// tokens stay valid until [`FakeUpstream::revoke_all`].
#[derive(Clone, Default)]
pub struct FakeUpstream {
    inner: Arc<Mutex<UpstreamState>>,
}

#[derive(Default)]
struct UpstreamState {
    issued: u32,
    valid_tokens: HashSet<String>,
    used_codes: HashSet<String>,
    verifiers: Vec<String>,
    track_status: Option<u16>,
    features_status: Option<u16>,
    delay: Duration,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, token: &str) {
        self.state().valid_tokens.insert(token.to_string());
    }

    pub fn revoke_all(&self) {
        self.state().valid_tokens.clear();
    }

    pub fn fail_track(&self, status: u16) {
        self.state().track_status = Some(status);
    }

    pub fn fail_features(&self, status: u16) {
        self.state().features_status = Some(status);
    }

    pub fn delay_responses(&self, delay: Duration) {
        self.state().delay = delay;
    }

    /// Verifiers received by the token endpoint, in order.
    pub fn verifiers(&self) -> Vec<String> {
        self.state().verifiers.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, UpstreamState> {
        self.inner.lock().unwrap()
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| self.state().valid_tokens.contains(token))
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/token", post(token))
            .route("/v1/tracks/{id}", get(track))
            .route("/v1/audio-features/{id}", get(features))
            .with_state(self.clone())
    }

    /// Serves the fake and returns its base URL.
    pub async fn spawn(&self) -> String {
        spawn_router(self.router()).await
    }
}

pub async fn spawn_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Config pointing every endpoint at `base`.
pub fn config(base: &str) -> Config {
    let mut config = Config::new("test-client");
    config.auth_url = format!("{}/authorize", base);
    config.token_url = format!("{}/api/token", base);
    config.api_url = format!("{}/v1", base);
    config.features_url = format!("{}/v1", base);
    config.redirect_uri = "http://127.0.0.1:8888/callback".to_string();
    config
}

pub fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn temp_dir(name: &str) -> std::path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("tracklens-it-{}-{}", name, std::process::id()));
    dir
}

fn invalid_grant() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "invalid_grant", "error_description": "Invalid authorization code"})),
    )
        .into_response()
}

async fn token(
    State(upstream): State<FakeUpstream>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if form.get("grant_type").map(String::as_str) != Some("authorization_code")
        || form.get("client_id").map(String::as_str) != Some("test-client")
        || form.contains_key("client_secret")
    {
        return invalid_grant();
    }

    let verifier = form.get("code_verifier").cloned().unwrap_or_default();
    let code = form.get("code").cloned().unwrap_or_default();

    let mut state = upstream.state();
    state.verifiers.push(verifier.clone());
    if verifier.len() < 43 || !code.starts_with("code-") || !state.used_codes.insert(code) {
        return invalid_grant();
    }

    state.issued += 1;
    let access_token = format!("token-{}", state.issued);
    state.valid_tokens.insert(access_token.clone());

    Json(json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600
    }))
    .into_response()
}

async fn track(
    State(upstream): State<FakeUpstream>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let (status, delay) = {
        let state = upstream.state();
        (state.track_status, state.delay)
    };
    tokio::time::sleep(delay).await;

    if !upstream.authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"status": 401, "message": "The access token expired"}})),
        )
            .into_response();
    }
    if let Some(status) = status {
        let status = StatusCode::from_u16(status).unwrap();
        return (
            status,
            Json(json!({"error": {"status": status.as_u16(), "message": "Non existing id"}})),
        )
            .into_response();
    }

    Json(json!({
        "id": id,
        "name": "Bohemian Rhapsody",
        "artists": [{"id": "1dfeR4HaWDbWqFHLkxsg1d", "name": "Queen"}],
        "album": {
            "name": "A Night at the Opera",
            "images": [{"url": "https://i.example.com/cover.jpg", "width": 640, "height": 640}],
            "release_date": "1975-11-21"
        },
        "duration_ms": 354320,
        "popularity": 87,
        "explicit": false,
        "preview_url": null,
        "external_urls": {"spotify": format!("https://open.example.com/track/{}", id)}
    }))
    .into_response()
}

async fn features(
    State(upstream): State<FakeUpstream>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let (status, delay) = {
        let state = upstream.state();
        (state.features_status, state.delay)
    };
    tokio::time::sleep(delay).await;

    if !upstream.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(status) = status {
        return StatusCode::from_u16(status).unwrap().into_response();
    }

    Json(json!({
        "audio_features": {
            "tempo": "120.5",
            "mode": 1,
            "key": 2,
            "time_signature": "4",
            "loudness": "-9.1",
            "energy": 1.2,
            "danceability": "0.41",
            "valence": 0.22
        }
    }))
    .into_response()
}
