use std::path::PathBuf;

use tabled::{Table, settings::Style};

use crate::{
    analyzer::Analyzer,
    cli::session::{open_session, spinner},
    config::Config,
    error,
    error::Error,
    export, info, link, success,
    types::AnalyzedTrack,
    utils, warning,
};

pub async fn analyze(config: &Config, input: &str, export_dir: Option<PathBuf>, extended: bool) {
    let analyzer = Analyzer::new(config, open_session(config).await);

    let pb = spinner("Analyzing track...");
    let result = analyzer.analyze(input).await;
    pb.finish_and_clear();

    let track = match result {
        Ok(track) => track,
        Err(e @ Error::AuthenticationRequired { authorize_url: Some(_), .. }) => {
            warning!("{}", e);
            error!(
                "After authorizing, finish with: tracklens auth --callback-url '<redirected address>'"
            );
        }
        Err(e) => error!("{}", e),
    };

    print_track(&track);

    if let Some(dir) = export_dir {
        match export::write_export(&track, &dir, extended).await {
            Ok(path) => success!("Saved {}", path.display()),
            Err(e) => error!("Cannot write export. Err: {}", e),
        }
    }
}

pub fn resolve(input: &str) {
    match link::resolve(input) {
        Some(id) => println!("{}", id),
        None => error!("{}", Error::InvalidLink),
    }
}

fn print_track(track: &AnalyzedTrack) {
    info!("{} - {}", track.artist_line(), track.title);
    info!(
        "{} | {} | popularity {}/100{}",
        track.album,
        utils::format_duration(track.duration_ms),
        track.popularity,
        if track.explicit { " | explicit" } else { "" }
    );
    if let Some(date) = &track.release_date {
        info!("Released {}", date);
    }
    if let Some(artwork) = &track.artwork_url {
        info!("Artwork: {}", artwork);
    }
    if let Some(preview) = &track.preview_url {
        info!("Preview: {}", preview);
    }

    let mut table = Table::new(utils::feature_rows(track));
    table.with(Style::rounded());
    println!("{}", table);
}
