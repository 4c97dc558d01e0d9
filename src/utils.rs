use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::{AnalyzedTrack, FeatureTableRow};

/// Length of a generated PKCE verifier. The allowed range is 43..=128.
pub const CODE_VERIFIER_LEN: usize = 128;

/// Random PKCE verifier drawn from the alphanumeric part of the unreserved
/// character set.
pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_VERIFIER_LEN)
        .map(char::from)
        .collect()
}

/// `base64url(sha256(verifier))` without padding, the `S256` challenge.
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Formats milliseconds as `m:ss`.
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms.saturating_add(500) / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

pub fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

pub fn describe_energy(energy: f64) -> &'static str {
    match energy {
        e if e > 0.8 => "Very High Energy",
        e if e > 0.6 => "High Energy",
        e if e > 0.4 => "Moderate Energy",
        e if e > 0.2 => "Low Energy",
        _ => "Very Low Energy",
    }
}

pub fn describe_danceability(danceability: f64) -> &'static str {
    match danceability {
        d if d > 0.8 => "Extremely Danceable",
        d if d > 0.6 => "Very Danceable",
        d if d > 0.4 => "Moderately Danceable",
        d if d > 0.2 => "Slightly Danceable",
        _ => "Not Danceable",
    }
}

pub fn describe_valence(valence: f64) -> &'static str {
    match valence {
        v if v > 0.8 => "Very Positive/Happy",
        v if v > 0.6 => "Positive/Upbeat",
        v if v > 0.4 => "Neutral",
        v if v > 0.2 => "Melancholic",
        _ => "Very Sad/Dark",
    }
}

/// Rows for the feature table printed by `tracklens analyze`.
pub fn feature_rows(track: &AnalyzedTrack) -> Vec<FeatureTableRow> {
    let c = &track.characteristics;
    let row = |feature: &str, value: String, description: &str| FeatureTableRow {
        feature: feature.to_string(),
        value,
        description: description.to_string(),
    };

    vec![
        row("Key", track.key_signature(), ""),
        row("Tempo", format!("{:.0} BPM", track.tempo), ""),
        row("Time Signature", format!("{}/4", track.time_signature), ""),
        row("Loudness", format!("{:.1} dB", track.loudness), ""),
        row("Energy", percent(c.energy), describe_energy(c.energy)),
        row(
            "Danceability",
            percent(c.danceability),
            describe_danceability(c.danceability),
        ),
        row("Valence", percent(c.valence), describe_valence(c.valence)),
        row("Acousticness", percent(c.acousticness), ""),
        row("Instrumentalness", percent(c.instrumentalness), ""),
        row("Liveness", percent(c.liveness), ""),
        row("Speechiness", percent(c.speechiness), ""),
    ]
}
