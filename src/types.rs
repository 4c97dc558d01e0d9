use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

/// A 22-character base62 track id, the only key used for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackIdentifier(String);

impl TrackIdentifier {
    pub const LEN: usize = 22;

    /// Accepts `id` only when it follows the platform's id convention.
    pub fn parse(id: &str) -> Option<Self> {
        (id.len() == Self::LEN && id.bytes().all(|b| b.is_ascii_alphanumeric()))
            .then(|| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TrackIdentifier {
    type Error = String;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::parse(&id).ok_or_else(|| format!("'{}' is not a 22-character track id", id))
    }
}

impl From<TrackIdentifier> for String {
    fn from(id: TrackIdentifier) -> Self {
        id.0
    }
}

impl fmt::Display for TrackIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    /// Unix timestamp after which the token is no longer valid, if known.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Verifier that was exchanged for this token. Empty when the token was
    /// handed over directly.
    #[serde(default)]
    pub code_verifier: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    AwaitingConsent,
    Authenticated,
}

/// First half of the login: where to send the user agent for consent.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub authorize_url: String,
    pub code_challenge: String,
}

/// Track metadata as the upstream sent it. Not trusted past normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrackResponse(pub Value);

/// Audio features as the upstream sent it. Not trusted past normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeatureResponse(pub Value);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => f.write_str("Major"),
            Mode::Minor => f.write_str("Minor"),
        }
    }
}

/// Perceptual scores, each within `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Characteristics {
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
}

/// The canonical record of a track every consumer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedTrack {
    pub id: TrackIdentifier,
    pub title: String,
    /// Never empty.
    pub artists: Vec<String>,
    pub album: String,
    pub artwork_url: Option<String>,
    pub preview_url: Option<String>,
    pub external_url: Option<String>,
    pub release_date: Option<String>,
    pub duration_ms: u64,
    pub popularity: u8,
    pub explicit: bool,
    pub key: String,
    pub mode: Mode,
    pub tempo: f64,
    pub time_signature: u32,
    pub loudness: f64,
    pub characteristics: Characteristics,
}

impl AnalyzedTrack {
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }

    /// Display form of key and mode, e.g. `"D Major"`.
    pub fn key_signature(&self) -> String {
        format!("{} {}", self.key, self.mode)
    }
}

#[derive(Tabled)]
pub struct FeatureTableRow {
    pub feature: String,
    pub value: String,
    pub description: String,
}
