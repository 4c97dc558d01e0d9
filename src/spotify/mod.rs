//! # Streaming platform integration
//!
//! Everything that talks to the platform over HTTP lives here.
//!
//! ```text
//! Analyzer
//!    ↓
//! auth (OAuth 2.0 PKCE)      tracks (metadata + audio features)
//!    ↓                           ↓
//! token endpoint             /tracks/{id}, /audio-features/{id}
//! ```
//!
//! [`auth`] holds the [`PkceAuthenticator`](auth::PkceAuthenticator), the
//! single owner of the access credential. The login is two-phase: the user
//! agent leaves for the consent page after `begin_login` and comes back with
//! the parameters `complete_login` consumes.
//!
//! [`tracks`] holds the [`TrackDataClient`](tracks::TrackDataClient). It
//! classifies every failure as `Unauthorized`, `Rejected` or `Transport` and
//! never retries on its own.
//!
//! Responses are returned untyped; shaping them into an
//! [`AnalyzedTrack`](crate::types::AnalyzedTrack) is the job of
//! [`normalize`](crate::normalize).

pub mod auth;
pub mod tracks;
