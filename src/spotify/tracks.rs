use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::{
    config::Config,
    types::{Credential, RawFeatureResponse, RawTrackResponse, TrackIdentifier},
};

#[derive(Error, Debug)]
pub enum FetchError {
    /// The credential is expired or was revoked.
    #[error("credential rejected")]
    Unauthorized,

    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Authenticated lookups of track metadata and audio features.
///
/// One request per call and no retries; deciding whether to try again is up
/// to the caller.
///
/// # Endpoints
///
/// - `{api_url}/tracks/{id}` for metadata
/// - `{features_url}/audio-features/{id}` for audio features. The features
///   base defaults to the API base and may point at an analysis proxy
///
/// Both requests carry the credential as a bearer token.
///
/// # Failure Classes
///
/// - [`FetchError::Unauthorized`] for a 401. The credential is no longer usable
/// - [`FetchError::Rejected`] for any other non-success status, or a body
///   that is not JSON. The message is taken from the error body when there is one
/// - [`FetchError::Transport`] when no response arrived at all
#[derive(Clone)]
pub struct TrackDataClient {
    http: Client,
    api_url: String,
    features_url: String,
}

impl TrackDataClient {
    pub fn new(config: &Config) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: &Config, http: Client) -> Self {
        Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            features_url: config.features_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetches the metadata of one track.
    ///
    /// # Arguments
    ///
    /// * `id` - The track to look up
    /// * `credential` - The active session credential
    ///
    /// # Returns
    ///
    /// The untyped `GET /tracks/{id}` payload. It is only meant to be handed
    /// to [`normalize`](crate::normalize::normalize).
    ///
    /// # Errors
    ///
    /// See the failure classes on [`TrackDataClient`].
    pub async fn fetch_track(
        &self,
        id: &TrackIdentifier,
        credential: &Credential,
    ) -> Result<RawTrackResponse, FetchError> {
        let url = format!("{uri}/tracks/{id}", uri = self.api_url, id = id);
        self.get_json(&url, credential).await.map(RawTrackResponse)
    }

    /// `GET /audio-features/{id}`, against the features proxy when one is configured.
    pub async fn fetch_features(
        &self,
        id: &TrackIdentifier,
        credential: &Credential,
    ) -> Result<RawFeatureResponse, FetchError> {
        let url = format!("{uri}/audio-features/{id}", uri = self.features_url, id = id);
        self.get_json(&url, credential).await.map(RawFeatureResponse)
    }

    async fn get_json(&self, url: &str, credential: &Credential) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&credential.access_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(FetchError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Rejected {
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Rejected {
            status: status.as_u16(),
            message: format!("response is not JSON: {}", e),
        })
    }
}

/// Pulls `error.message` (or `error` / `message`) out of a JSON error body,
/// falling back to the raw text.
fn upstream_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        json.pointer("/error/message")
            .or_else(|| json.get("message"))
            .or_else(|| json.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "no details given".to_string(),
        None => body.trim().to_string(),
    }
}
