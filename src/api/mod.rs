//! # API Module
//!
//! HTTP endpoints of the local server that receives the OAuth redirect.
//!
//! - [`callback`] completes the PKCE login with the parameters the provider
//!   redirected back with, then redirects to [`authorized`].
//! - [`authorized`] is the page the user ends up on after a successful login.
//!   Its URL carries no authorization code.
//! - [`health`] reports status and version.
//!
//! Routing lives in [`crate::server`].

mod callback;
mod health;

pub use callback::authorized;
pub use callback::callback;
pub use health::health;
