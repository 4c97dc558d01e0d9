use std::{sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

use crate::{
    config::Config, error, management::FileSessionStore, spotify::auth::PkceAuthenticator,
};

pub type SharedAuth = Arc<Mutex<PkceAuthenticator<FileSessionStore>>>;

/// Authenticator over the on-disk session, with any stored credential restored.
pub async fn open_session(config: &Config) -> SharedAuth {
    let mut auth = PkceAuthenticator::new(config.clone(), FileSessionStore::default_location());
    if let Err(e) = auth.restore_session().await {
        error!("Cannot restore session. Err: {}", e);
    }
    Arc::new(Mutex::new(auth))
}

pub fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
