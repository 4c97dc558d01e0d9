//! # CLI Module
//!
//! Implementations of the `tracklens` subcommands. Each function prints its
//! outcome with the crate's output macros and exits through `error!` on
//! failure, so `main` only has to dispatch.
//!
//! - [`auth`] runs the PKCE login, through the local callback server or from
//!   a pasted redirect address
//! - [`logout`] forgets the stored credential
//! - [`analyze`] prints the analysis of a track link and optionally exports it
//! - [`resolve`] prints the track id a link resolves to
//!
//! ```bash
//! tracklens auth
//! tracklens analyze https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC --export . --extended
//! tracklens resolve spotify:track:4uLU6hMCjMI75M1A2tKUQC
//! ```

mod analyze;
mod auth;
mod session;

pub use analyze::analyze;
pub use analyze::resolve;
pub use auth::auth;
pub use auth::logout;
