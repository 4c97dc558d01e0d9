//! Turns user-pasted text into a [`TrackIdentifier`].
//!
//! Three shapes are recognised, tried in this order:
//! 1. a web URL with a `track/<id>` path segment
//!    (`https://open.spotify.com/intl-de/track/<id>?si=...`)
//! 2. a platform URI, `<scheme>:track:<id>`
//! 3. the bare 22-character id

use crate::types::TrackIdentifier;

pub fn resolve(input: &str) -> Option<TrackIdentifier> {
    let input = input.trim();
    from_web_url(input)
        .or_else(|| from_uri(input))
        .or_else(|| TrackIdentifier::parse(input))
}

fn from_web_url(input: &str) -> Option<TrackIdentifier> {
    input
        .match_indices("track/")
        .find_map(|(at, marker)| id_prefix(&input[at + marker.len()..]))
}

fn from_uri(input: &str) -> Option<TrackIdentifier> {
    let (scheme, rest) = input.split_once(":track:")?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    id_prefix(rest)
}

/// Leading id of `rest`, which must be exactly 22 base62 characters long.
fn id_prefix(rest: &str) -> Option<TrackIdentifier> {
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    TrackIdentifier::parse(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "4uLU6hMCjMI75M1A2tKUQC";

    #[test]
    fn test_web_url() {
        let id = resolve("https://open.example.com/track/4uLU6hMCjMI75M1A2tKUQC").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_web_url_with_locale_and_query() {
        let id =
            resolve("https://open.spotify.com/intl-de/track/4uLU6hMCjMI75M1A2tKUQC?si=abc123")
                .unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_uri() {
        let id = resolve("spotify:track:4uLU6hMCjMI75M1A2tKUQC").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_bare_id_with_whitespace() {
        let id = resolve("  4uLU6hMCjMI75M1A2tKUQC\n").unwrap();
        assert_eq!(id.as_str(), ID);
    }

    #[test]
    fn test_all_shapes_agree() {
        let inputs = [
            "https://open.example.com/track/4uLU6hMCjMI75M1A2tKUQC",
            "spotify:track:4uLU6hMCjMI75M1A2tKUQC",
            "4uLU6hMCjMI75M1A2tKUQC",
        ];
        let ids: Vec<_> = inputs.iter().map(|i| resolve(i)).collect();
        assert!(ids.iter().all(|id| id == &ids[0]));
        assert!(ids[0].is_some());
    }

    #[test]
    fn test_rejects_inputs_without_an_id() {
        for input in [
            "",
            "   ",
            "hello world",
            "https://open.example.com/album/4uLU6hMCjMI75M1A2tKUQC",
            "https://open.example.com/track/tooShort",
            "https://open.example.com/track/4uLU6hMCjMI75M1A2tKUQCextra",
            "spotify:track:",
            "4uLU6hMCjMI75M1A2tKUQ",
            "4uLU6hMCjMI75M1A2tKUQC1",
            "4uLU6hMCjMI75M1A2tK-QC",
        ] {
            assert_eq!(resolve(input), None, "input: {:?}", input);
        }
    }

    #[test]
    fn test_idempotent() {
        let first = resolve("spotify:track:4uLU6hMCjMI75M1A2tKUQC").unwrap();
        let second = resolve(first.as_str()).unwrap();
        assert_eq!(first, second);
    }
}
