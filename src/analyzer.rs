use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::Mutex;

use crate::{
    config::Config,
    error::{Error, Result},
    link,
    management::SessionStore,
    normalize,
    spotify::{
        auth::PkceAuthenticator,
        tracks::{FetchError, TrackDataClient},
    },
    types::{AnalyzedTrack, RawTrackResponse},
};

/// Runs one analysis end to end: resolve, check the session, fetch, normalize.
///
/// Only the most recent call to [`analyze`](Self::analyze) may deliver a
/// result. An earlier call still in flight ends in [`Error::Superseded`] and
/// leaves the session untouched.
pub struct Analyzer<S> {
    auth: Arc<Mutex<PkceAuthenticator<S>>>,
    client: TrackDataClient,
    placeholder_metadata: bool,
    generation: AtomicU64,
}

impl<S: SessionStore> Analyzer<S> {
    pub fn new(config: &Config, auth: Arc<Mutex<PkceAuthenticator<S>>>) -> Self {
        Self::with_client(config, auth, TrackDataClient::new(config))
    }

    pub fn with_client(
        config: &Config,
        auth: Arc<Mutex<PkceAuthenticator<S>>>,
        client: TrackDataClient,
    ) -> Self {
        Self {
            auth,
            client,
            placeholder_metadata: config.placeholder_metadata,
            generation: AtomicU64::new(0),
        }
    }

    pub fn authenticator(&self) -> Arc<Mutex<PkceAuthenticator<S>>> {
        Arc::clone(&self.auth)
    }

    /// Analyzes the track behind a pasted link.
    ///
    /// Runs the whole pipeline: the link is resolved, the active credential is
    /// taken from the authenticator, track metadata and audio features are
    /// fetched concurrently, and both payloads are normalized into one record.
    /// Nothing is retried. Any failing step ends the call.
    ///
    /// # Arguments
    ///
    /// * `input` - A track URL, a `<scheme>:track:<id>` URI or a bare track id
    ///
    /// # Returns
    ///
    /// The normalized [`AnalyzedTrack`], never a partial one.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLink`] when `input` holds no track id. No request is made.
    /// - [`Error::AuthenticationRequired`] when there is no session. A login is
    ///   started and its authorization URL is carried in the error.
    /// - [`Error::SessionExpired`] when either fetch answers 401. The
    ///   credential is dropped before returning.
    /// - [`Error::UpstreamRejected`] / [`Error::TransportError`] for other
    ///   fetch failures.
    /// - [`Error::Superseded`] when a later call started before this one got
    ///   the session or before its responses arrived. Such a call neither
    ///   starts a login nor drops the credential.
    ///
    /// # Example
    ///
    /// ```
    /// let track = analyzer.analyze("spotify:track:4uLU6hMCjMI75M1A2tKUQC").await?;
    /// println!("{} in {} at {:.0} BPM", track.title, track.key_signature(), track.tempo);
    /// ```
    pub async fn analyze(&self, input: &str) -> Result<AnalyzedTrack> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let id = link::resolve(input).ok_or(Error::InvalidLink)?;

        let credential = {
            let mut auth = self.auth.lock().await;
            if self.is_stale(generation) {
                return Err(Error::Superseded);
            }
            let active = auth.current_credential().cloned();
            match active {
                Some(credential) => credential,
                None => {
                    let login = auth.begin_login().await?;
                    return Err(Error::AuthenticationRequired {
                        authorize_url: Some(login.authorize_url),
                        reason: "no active session".to_string(),
                    });
                }
            }
        };

        let (track, features) = tokio::join!(
            self.client.fetch_track(&id, &credential),
            self.client.fetch_features(&id, &credential),
        );

        if self.is_stale(generation) {
            return Err(Error::Superseded);
        }

        if matches!(track, Err(FetchError::Unauthorized))
            || matches!(features, Err(FetchError::Unauthorized))
        {
            self.expire_session(&credential.access_token).await?;
            return Err(Error::SessionExpired);
        }

        let features = features.map_err(classify)?;
        let track = match track {
            Ok(track) => track,
            Err(FetchError::Rejected { .. }) if self.placeholder_metadata => {
                RawTrackResponse::default()
            }
            Err(e) => return Err(classify(e)),
        };

        Ok(normalize::normalize(&id, &track, &features))
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    /// Drops the credential the upstream refused, unless a new login
    /// already replaced it.
    async fn expire_session(&self, rejected_token: &str) -> Result<()> {
        let mut auth = self.auth.lock().await;
        let still_current = auth
            .current_credential()
            .is_some_and(|c| c.access_token == rejected_token);
        if still_current {
            auth.invalidate().await?;
        }
        Ok(())
    }
}

fn classify(e: FetchError) -> Error {
    match e {
        FetchError::Unauthorized => Error::SessionExpired,
        FetchError::Rejected { status, message } => Error::UpstreamRejected { status, message },
        FetchError::Transport(e) => Error::TransportError(e.to_string()),
    }
}
