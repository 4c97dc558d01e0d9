use std::collections::HashMap;

use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::{
    config::Config,
    error::{Error, Result},
    management::{ACCESS_TOKEN_KEY, SessionStore, VERIFIER_KEY},
    types::{AuthState, Credential, LoginRequest},
    utils,
};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Owns the session credential and drives the PKCE login.
///
/// The consent step happens outside the process, so the login is split into
/// [`begin_login`](Self::begin_login), which yields the URL to send the user
/// agent to, and [`complete_login`](Self::complete_login), which consumes the
/// parameters the provider redirected back with. Everything that must outlive
/// the redirect goes through the injected [`SessionStore`].
///
/// This is the only writer of the credential. Every change is persisted
/// before the in-memory state reflects it.
pub struct PkceAuthenticator<S> {
    config: Config,
    store: S,
    http: Client,
    state: AuthState,
    credential: Option<Credential>,
}

impl<S: SessionStore> PkceAuthenticator<S> {
    pub fn new(config: Config, store: S) -> Self {
        Self::with_client(config, store, Client::new())
    }

    pub fn with_client(config: Config, store: S, http: Client) -> Self {
        Self {
            config,
            store,
            http,
            state: AuthState::Unauthenticated,
            credential: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn current_credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Adopts a previously persisted credential without prompting.
    ///
    /// A stored bare token string (no JSON envelope) is accepted as well.
    /// With no token but a pending verifier, the session is waiting for the
    /// provider to redirect back.
    pub async fn restore_session(&mut self) -> Result<Option<&Credential>> {
        if let Some(stored) = self.store.get(ACCESS_TOKEN_KEY).await.map_err(storage)? {
            let stored = stored.trim();
            if !stored.is_empty() {
                let credential = serde_json::from_str::<Credential>(stored).unwrap_or_else(|_| {
                    Credential {
                        access_token: stored.to_string(),
                        expires_at: None,
                        code_verifier: String::new(),
                    }
                });
                self.credential = Some(credential);
                self.state = AuthState::Authenticated;
                return Ok(self.credential.as_ref());
            }
        }

        if self.store.get(VERIFIER_KEY).await.map_err(storage)?.is_some() {
            self.state = AuthState::AwaitingConsent;
        }
        Ok(None)
    }

    /// Starts a login: creates and stores a fresh verifier and returns the
    /// authorization URL carrying its challenge.
    ///
    /// An active credential stays in use until a completed login replaces it.
    pub async fn begin_login(&mut self) -> Result<LoginRequest> {
        let code_verifier = utils::generate_code_verifier();
        let code_challenge = utils::generate_code_challenge(&code_verifier);

        let authorize_url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", code_challenge.as_str()),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid authorization url: {}", e)))?;

        // Store verifier before redirect
        self.store
            .set(VERIFIER_KEY, &code_verifier)
            .await
            .map_err(storage)?;

        if self.state != AuthState::Authenticated {
            self.state = AuthState::AwaitingConsent;
        }

        Ok(LoginRequest {
            authorize_url: authorize_url.to_string(),
            code_challenge,
        })
    }

    /// Finishes a login from the parameters of the provider's redirect.
    ///
    /// A directly supplied `access_token` is adopted as is. A `code` is
    /// exchanged together with the stored verifier. The verifier is erased
    /// before the exchange, so each verifier backs at most one attempt and a
    /// replayed callback fails.
    ///
    /// # Arguments
    ///
    /// * `query` - The redirect's parameters, e.g. from [`parse_callback_url`]
    ///   or the callback server's query string. `error`, `access_token`
    ///   (with optional `expires_in`) and `code` are recognised, in that order
    ///
    /// # Errors
    ///
    /// - [`Error::AuthenticationRequired`] when consent was denied, no login
    ///   is in progress, or the token endpoint refused the code (400/401/403)
    /// - [`Error::UpstreamRejected`] for other token endpoint failures
    /// - [`Error::TransportError`] when the token endpoint is unreachable
    /// - [`Error::Storage`] when the session store fails
    ///
    /// On failure an earlier credential stays active. Without one, the state
    /// returns to `Unauthenticated`.
    ///
    /// # Example
    ///
    /// ```
    /// let login = auth.begin_login().await?;
    /// // user agent visits login.authorize_url and is redirected back
    /// let params = parse_callback_url("http://127.0.0.1:8888/callback?code=AQB...")?;
    /// let credential = auth.complete_login(&params).await?;
    /// ```
    pub async fn complete_login(&mut self, query: &HashMap<String, String>) -> Result<Credential> {
        let result = self.complete_login_inner(query).await;
        if result.is_err() && self.credential.is_none() {
            self.state = AuthState::Unauthenticated;
        }
        result
    }

    async fn complete_login_inner(&mut self, query: &HashMap<String, String>) -> Result<Credential> {
        if let Some(err) = query.get("error") {
            self.store.clear(VERIFIER_KEY).await.map_err(storage)?;
            return Err(Error::auth_required(format!(
                "authorization was denied: {}",
                err
            )));
        }

        if let Some(access_token) = query.get("access_token") {
            let expires_in = query.get("expires_in").and_then(|v| v.parse::<i64>().ok());
            let credential = Credential {
                access_token: access_token.clone(),
                expires_at: expires_at(expires_in),
                code_verifier: String::new(),
            };
            self.adopt(credential.clone()).await?;
            self.store.clear(VERIFIER_KEY).await.map_err(storage)?;
            return Ok(credential);
        }

        let Some(code) = query.get("code") else {
            self.store.clear(VERIFIER_KEY).await.map_err(storage)?;
            return Err(Error::auth_required(
                "the callback carried neither an authorization code nor a token",
            ));
        };

        let verifier = self.store.get(VERIFIER_KEY).await.map_err(storage)?;
        self.store.clear(VERIFIER_KEY).await.map_err(storage)?;
        let Some(verifier) = verifier else {
            return Err(Error::auth_required("no login is in progress"));
        };

        let credential = self.exchange_code_pkce(code, &verifier).await?;
        self.adopt(credential.clone()).await?;
        Ok(credential)
    }

    /// Whether a login was started and has not been completed yet.
    ///
    /// Every `complete_login`, successful or not, erases the verifier, so
    /// this turns false as soon as the callback was handled.
    pub async fn login_pending(&self) -> Result<bool> {
        Ok(self.store.get(VERIFIER_KEY).await.map_err(storage)?.is_some())
    }

    /// Drops a credential the upstream refused. The session has to log in
    /// again afterwards.
    pub async fn invalidate(&mut self) -> Result<()> {
        self.store.clear(ACCESS_TOKEN_KEY).await.map_err(storage)?;
        self.credential = None;
        self.state = AuthState::Unauthenticated;
        Ok(())
    }

    /// Forgets the credential and any pending login.
    pub async fn logout(&mut self) -> Result<()> {
        self.store.clear(VERIFIER_KEY).await.map_err(storage)?;
        self.invalidate().await
    }

    async fn adopt(&mut self, credential: Credential) -> Result<()> {
        let json = serde_json::to_string(&credential)
            .map_err(|e| Error::Storage(format!("cannot encode credential: {}", e)))?;
        self.store
            .set(ACCESS_TOKEN_KEY, &json)
            .await
            .map_err(storage)?;

        self.credential = Some(credential);
        self.state = AuthState::Authenticated;
        Ok(())
    }

    /// Exchanges an authorization code for a token. The verifier takes the
    /// place of a client secret.
    async fn exchange_code_pkce(&self, code: &str, verifier: &str) -> Result<Credential> {
        let res = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("code_verifier", verifier),
            ])
            .send()
            .await
            .map_err(|e| Error::TransportError(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Error::auth_required(format!("token exchange was refused: {}", body.trim()))
                }
                _ => Error::UpstreamRejected {
                    status: status.as_u16(),
                    message: body.trim().to_string(),
                },
            });
        }

        let token: TokenResponse = res.json().await.map_err(|e| Error::UpstreamRejected {
            status: status.as_u16(),
            message: format!("malformed token response: {}", e),
        })?;

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::auth_required("the token response carried no access token"))?;

        Ok(Credential {
            access_token,
            expires_at: expires_at(token.expires_in),
            code_verifier: verifier.to_string(),
        })
    }
}

/// Collects the parameters of a redirect URL, from both the query and the
/// fragment (some providers hand tokens back in `#access_token=...`).
pub fn parse_callback_url(url: &str) -> Result<HashMap<String, String>> {
    let url = Url::parse(url.trim())
        .map_err(|e| Error::auth_required(format!("not a callback url: {}", e)))?;

    let mut params: HashMap<String, String> = url.query_pairs().into_owned().collect();
    if let Some(fragment) = url.fragment() {
        let mut fragment_url = url.clone();
        fragment_url.set_query(Some(fragment));
        params.extend(fragment_url.query_pairs().into_owned());
    }
    Ok(params)
}

fn expires_at(expires_in: Option<i64>) -> Option<i64> {
    expires_in.map(|secs| Utc::now().timestamp() + secs)
}

fn storage(e: Box<dyn std::error::Error + Send + Sync>) -> Error {
    Error::Storage(e.to_string())
}
