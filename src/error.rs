use thiserror::Error;

/// Every failure an analysis can end in. Each variant is classified where it
/// is detected and carries a message fit for showing to the user.
#[derive(Error, Debug)]
pub enum Error {
    #[error("That doesn't look like a track link. Paste a track URL, a track URI or a 22-character track id.")]
    InvalidLink,

    #[error("{}", auth_required_message(.authorize_url))]
    AuthenticationRequired {
        /// Where the user has to go to grant consent, when a login was started.
        authorize_url: Option<String>,
        reason: String,
    },

    #[error("Your session has expired. Log in again to continue.")]
    SessionExpired,

    #[error("The music service rejected the request ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Could not reach the music service: {0}. Check your connection and try again.")]
    TransportError(String),

    #[error("A newer analysis replaced this one")]
    Superseded,

    #[error("Session storage failed: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn auth_required_message(authorize_url: &Option<String>) -> String {
    match authorize_url {
        Some(url) => format!("Login required. Open {} to authorize access.", url),
        None => "Login required. Run `tracklens auth` to authorize access.".to_string(),
    }
}

impl Error {
    pub(crate) fn auth_required(reason: impl Into<String>) -> Self {
        Error::AuthenticationRequired {
            authorize_url: None,
            reason: reason.into(),
        }
    }

    /// Whether repeating the same request unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TransportError(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
