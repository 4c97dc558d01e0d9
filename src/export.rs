use std::{fmt::Write, path::{Path, PathBuf}};

use chrono::Local;

use crate::{Res, types::AnalyzedTrack, utils};

const RULE: &str = "═══════════════════════════════════════════";

/// Plain-text summary of a track.
///
/// The short form lists title, artist, key and mode, and tempo. `extended`
/// adds album, release date, duration, popularity, explicit flag, time
/// signature, loudness and every characteristic score.
pub fn render(track: &AnalyzedTrack, extended: bool) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_report(&mut out, track, extended);
    out
}

fn write_report(out: &mut String, track: &AnalyzedTrack, extended: bool) -> std::fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "    TRACK INFORMATION")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out)?;
    writeln!(out, "Title: {}", track.title)?;
    writeln!(out, "Artist: {}", track.artist_line())?;
    writeln!(out, "Key: {}", track.key_signature())?;
    writeln!(out, "Tempo: {:.0} BPM", track.tempo)?;
    writeln!(out, "Track ID: {}", track.id)?;
    if let Some(url) = &track.external_url {
        writeln!(out, "Track URL: {}", url)?;
    }

    if extended {
        let c = &track.characteristics;
        writeln!(out)?;
        writeln!(out, "Track Details:")?;
        writeln!(out, "-------------")?;
        writeln!(out, "Album: {}", track.album)?;
        writeln!(
            out,
            "Release Date: {}",
            track.release_date.as_deref().unwrap_or("Unknown")
        )?;
        writeln!(out, "Duration: {}", utils::format_duration(track.duration_ms))?;
        writeln!(out, "Popularity: {}/100", track.popularity)?;
        writeln!(out, "Explicit: {}", if track.explicit { "Yes" } else { "No" })?;
        writeln!(out, "Time Signature: {}/4", track.time_signature)?;
        writeln!(out, "Loudness: {:.1} dB", track.loudness)?;
        writeln!(out)?;
        writeln!(out, "Musical Characteristics:")?;
        writeln!(out, "-----------------------")?;
        writeln!(
            out,
            "Energy: {} - {}",
            utils::percent(c.energy),
            utils::describe_energy(c.energy)
        )?;
        writeln!(
            out,
            "Danceability: {} - {}",
            utils::percent(c.danceability),
            utils::describe_danceability(c.danceability)
        )?;
        writeln!(
            out,
            "Valence: {} - {}",
            utils::percent(c.valence),
            utils::describe_valence(c.valence)
        )?;
        writeln!(out, "Acousticness: {}", utils::percent(c.acousticness))?;
        writeln!(out, "Instrumentalness: {}", utils::percent(c.instrumentalness))?;
        writeln!(out, "Liveness: {}", utils::percent(c.liveness))?;
        writeln!(out, "Speechiness: {}", utils::percent(c.speechiness))?;
    }

    writeln!(out)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Exported: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "{}", RULE)?;
    Ok(())
}

/// `<first artist> - <title> - Info.txt`, with path separators and other
/// characters most filesystems reject replaced by `_`.
pub fn file_name(track: &AnalyzedTrack) -> String {
    let artist = track.artists.first().map(String::as_str).unwrap_or("Unknown Artist");
    let name = format!("{} - {} - Info.txt", artist, track.title);
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Writes the export into `dir` and returns the file's path.
pub async fn write_export(track: &AnalyzedTrack, dir: &Path, extended: bool) -> Res<PathBuf> {
    async_fs::create_dir_all(dir).await?;
    let path = dir.join(file_name(track));
    async_fs::write(&path, render(track, extended)).await?;
    Ok(path)
}
