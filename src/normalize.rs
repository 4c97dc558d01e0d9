//! Shapes raw upstream payloads into an [`AnalyzedTrack`].
//!
//! Providers disagree on field types: numbers come as JSON numbers or as
//! text, the key as a pitch-class index or as a note name, artists as
//! objects or plain strings. Each field goes through one small untagged
//! decode step here and nowhere else. Missing or unreadable fields get their
//! documented default, so [`normalize`] never fails.

use serde::Deserialize;
use serde_json::Value;

use crate::types::{
    AnalyzedTrack, Characteristics, Mode, RawFeatureResponse, RawTrackResponse, TrackIdentifier,
};

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const DEFAULT_TIME_SIGNATURE: u32 = 4;

/// Pitch classes by index, enharmonic pairs shown together.
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C♯/D♭", "D", "D♯/E♭", "E", "F", "F♯/G♭", "G", "G♯/A♭", "A", "A♯/B♭", "B",
];

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Flag(bool),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeyField {
    Index(i64),
    Decimal(f64),
    Name(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArtistEntry {
    Plain(String),
    Named { name: Option<String> },
}

/// Builds the canonical record from a track payload and a features payload.
///
/// Total over any JSON input: fields that are missing or cannot be read fall
/// back to their defaults instead of failing the whole record.
///
/// # Arguments
///
/// * `id` - The identifier the payloads were fetched for. It is kept as is,
///   whatever `id` the payload itself claims
/// * `raw_track` - The `/tracks/{id}` response, or an empty default
/// * `raw_features` - The `/audio-features/{id}` response, bare or wrapped in
///   an `audio_features` object or array
///
/// # Defaults
///
/// - Text fields: `"Unknown"`. An empty artist list becomes `["Unknown Artist"]`
/// - Continuous numbers (tempo, loudness, duration, popularity): `0`
/// - Characteristic scores: `0`, and clamped to `[0, 1]` when present
/// - Time signature: `4`
/// - Key: `"Unknown"` for `-1` or anything outside the pitch-class table
/// - Mode: `Major` only for a mode flag of `1`, otherwise `Minor`
/// - Artwork, preview and release date: `None`, never an empty string
///
/// # Example
///
/// ```
/// let track = normalize(&id, &RawTrackResponse::default(), &RawFeatureResponse(json!({
///     "tempo": "120.5", "mode": 1, "key": 2
/// })));
/// assert_eq!(track.key_signature(), "D Major");
/// ```
pub fn normalize(
    id: &TrackIdentifier,
    raw_track: &RawTrackResponse,
    raw_features: &RawFeatureResponse,
) -> AnalyzedTrack {
    let track = &raw_track.0;
    let features = unwrap_features(&raw_features.0);
    let album = track.get("album");

    AnalyzedTrack {
        id: id.clone(),
        title: text(track.get("name"))
            .or_else(|| text(track.get("title")))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        artists: artists(track.get("artists")),
        album: album
            .and_then(|a| text(a.get("name")).or_else(|| text(Some(a))))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        artwork_url: album
            .and_then(|a| first_image(a.get("images")))
            .or_else(|| first_image(track.get("images"))),
        preview_url: text(track.get("preview_url")),
        external_url: external_url(track.get("external_urls")),
        release_date: album
            .and_then(|a| text(a.get("release_date")))
            .or_else(|| text(track.get("release_date")))
            .filter(|d| d != UNKNOWN),
        duration_ms: number(track.get("duration_ms"))
            .map(|ms| ms.max(0.0).round() as u64)
            .unwrap_or(0),
        popularity: number(track.get("popularity"))
            .map(|p| p.clamp(0.0, 100.0).round() as u8)
            .unwrap_or(0),
        explicit: flag(track.get("explicit")).unwrap_or(false),
        key: key_name(features.get("key")),
        mode: mode(features.get("mode")),
        tempo: number(features.get("tempo")).map(|t| t.max(0.0)).unwrap_or(0.0),
        time_signature: number(features.get("time_signature"))
            .map(|n| n.round())
            .filter(|n| *n >= 1.0)
            .map(|n| n as u32)
            .unwrap_or(DEFAULT_TIME_SIGNATURE),
        loudness: number(features.get("loudness")).unwrap_or(0.0),
        characteristics: Characteristics {
            energy: score(features.get("energy")),
            danceability: score(features.get("danceability")),
            valence: score(features.get("valence")),
            acousticness: score(features.get("acousticness")),
            instrumentalness: score(features.get("instrumentalness")),
            liveness: score(features.get("liveness")),
            speechiness: score(features.get("speechiness")),
        },
    }
}

/// Canonical name for a pitch-class index, `"Unknown"` outside `0..=11`.
pub fn pitch_class_name(index: i64) -> &'static str {
    usize::try_from(index)
        .ok()
        .and_then(|i| PITCH_CLASSES.get(i))
        .copied()
        .unwrap_or(UNKNOWN)
}

/// Index of a note name such as `"D"`, `"C#"`, `"Db"`, `"F♯"` or `"A♯/B♭"`.
/// A trailing quality (`"Am"`, `"C major"`) is ignored.
pub fn pitch_class_index(name: &str) -> Option<i64> {
    let name = name.trim();
    if let Some(i) = PITCH_CLASSES.iter().position(|p| *p == name) {
        return Some(i as i64);
    }

    let name = name.split('/').next()?.trim();
    let mut chars = name.chars();
    let base: i64 = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let shift: i64 = match chars.clone().next() {
        Some('#' | '♯') => 1,
        Some('b' | '♭') => -1,
        _ => 0,
    };
    if shift != 0 {
        chars.next();
    }

    let quality = chars.as_str().trim().to_ascii_lowercase();
    if !matches!(quality.as_str(), "" | "m" | "min" | "minor" | "maj" | "major") {
        return None;
    }

    Some((base + shift).rem_euclid(12))
}

fn unwrap_features(raw: &Value) -> &Value {
    match raw.get("audio_features") {
        Some(inner @ Value::Object(_)) => inner,
        Some(Value::Array(items)) => items.first().unwrap_or(raw),
        _ => raw,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match Numeric::deserialize(value?).ok()? {
        Numeric::Number(n) => n,
        Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
        Numeric::Flag(_) => return None,
    };
    parsed.is_finite().then_some(parsed)
}

fn flag(value: Option<&Value>) -> Option<bool> {
    match Numeric::deserialize(value?).ok()? {
        Numeric::Flag(b) => Some(b),
        Numeric::Number(n) => Some(n != 0.0),
        Numeric::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
    }
}

fn score(value: Option<&Value>) -> f64 {
    number(value).map(|s| s.clamp(0.0, 1.0)).unwrap_or(0.0)
}

fn mode(value: Option<&Value>) -> Mode {
    let major = value
        .and_then(|v| Numeric::deserialize(v).ok())
        .is_some_and(|m| match m {
            Numeric::Number(n) => n == 1.0,
            Numeric::Flag(b) => b,
            Numeric::Text(s) => {
                let s = s.trim().to_ascii_lowercase();
                s.parse::<f64>().map(|n| n == 1.0).unwrap_or(false) || s.starts_with("maj")
            }
        });

    if major { Mode::Major } else { Mode::Minor }
}

fn key_name(value: Option<&Value>) -> String {
    let index = value
        .and_then(|v| KeyField::deserialize(v).ok())
        .and_then(|key| match key {
            KeyField::Index(i) => Some(i),
            KeyField::Decimal(f) => (f.fract() == 0.0).then_some(f as i64),
            KeyField::Name(name) => name
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| pitch_class_index(&name)),
        });

    index.map(pitch_class_name).unwrap_or(UNKNOWN).to_string()
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn artists(value: Option<&Value>) -> Vec<String> {
    let names: Vec<String> = match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match ArtistEntry::deserialize(entry).ok()? {
                ArtistEntry::Plain(name) => Some(name),
                ArtistEntry::Named { name } => name,
            })
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect(),
        other => text(other).into_iter().collect(),
    };

    if names.is_empty() {
        vec![UNKNOWN_ARTIST.to_string()]
    } else {
        names
    }
}

fn first_image(images: Option<&Value>) -> Option<String> {
    images?
        .as_array()?
        .iter()
        .find_map(|image| text(image.get("url")))
}

fn external_url(urls: Option<&Value>) -> Option<String> {
    let urls = urls?.as_object()?;
    urls.get("spotify")
        .and_then(|u| text(Some(u)))
        .or_else(|| urls.values().find_map(|u| text(Some(u))))
}
