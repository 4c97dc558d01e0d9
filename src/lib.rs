//! tracklens library
//!
//! Resolves a pasted streaming-platform track link, authenticates with the
//! platform through OAuth 2.0 PKCE, fetches track metadata and audio features
//! and normalizes them into one [`types::AnalyzedTrack`].
//!
//! # Modules
//!
//! - `link` - link parsing into a track identifier
//! - `spotify` - PKCE authenticator and track data client
//! - `normalize` - raw payloads to the canonical record
//! - `analyzer` - runs resolve, authenticate, fetch and normalize in sequence
//! - `management` - session storage (file and in-memory)
//! - `export` - plain-text export of an analyzed track
//! - `api` / `server` - local HTTP server for the OAuth callback
//! - `cli` - command-line interface implementations
//! - `config` - configuration from the environment and `.env`
//! - `error` - error taxonomy
//! - `types` - data structures
//! - `utils` - PKCE helpers and display formatting
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//! use tracklens::{analyzer::Analyzer, config::Config, management::FileSessionStore,
//!     spotify::auth::PkceAuthenticator};
//!
//! #[tokio::main]
//! async fn main() -> tracklens::Res<()> {
//!     let config = Config::from_env()?;
//!     let auth = Arc::new(Mutex::new(PkceAuthenticator::new(
//!         config.clone(),
//!         FileSessionStore::default_location(),
//!     )));
//!     auth.lock().await.restore_session().await?;
//!
//!     let analyzer = Analyzer::new(&config, auth);
//!     let track = analyzer.analyze("spotify:track:4uLU6hMCjMI75M1A2tKUQC").await?;
//!     println!("{} - {}", track.artist_line(), track.title);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod link;
pub mod management;
pub mod normalize;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::{Error, Result};

/// A convenient Result type alias for I/O plumbing that may fail.
///
/// Used where errors only need to be reported, not classified: session
/// storage, export files, the callback server. Classified failures use
/// [`Result`] instead.
///
/// # Example
///
/// ```
/// use tracklens::Res;
///
/// async fn read_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Status line with a blue `o` prefix.
///
/// ```
/// info!("Waiting for authorization...");
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Completion line with a green check mark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red `!` line to stderr and exits with status 1.
///
/// Only for failures the binary cannot continue from. Library code returns
/// errors instead of calling this.
///
/// ```
/// error!("Cannot load configuration: {}", e);
/// // not reached
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Yellow `!` line for problems the user should notice but that do not end
/// the program.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
