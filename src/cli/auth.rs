use std::{sync::Arc, time::Duration};

use tokio::time::{Instant, sleep};

use crate::{
    cli::session::{SharedAuth, open_session, spinner},
    config::Config,
    error, info, server,
    spotify::auth::parse_callback_url,
    success,
    types::Credential,
    warning,
};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the PKCE login.
///
/// Without `callback_url`, a local server is started for the redirect and
/// the authorization page is opened in the browser. With `callback_url`,
/// the login started earlier is completed from the address the browser was
/// redirected to.
pub async fn auth(config: &Config, callback_url: Option<String>) {
    let shared = open_session(config).await;

    if let Some(url) = callback_url {
        let params = match parse_callback_url(&url) {
            Ok(params) => params,
            Err(e) => error!("{}", e),
        };
        match shared.lock().await.complete_login(&params).await {
            Ok(_) => success!("Authentication successful!"),
            Err(e) => error!("{}", e),
        }
        return;
    }

    let previous = shared.lock().await.current_credential().cloned();

    let login = match shared.lock().await.begin_login().await {
        Ok(login) => login,
        Err(e) => error!("Cannot start login. Err: {}", e),
    };

    let server_state = Arc::clone(&shared);
    let addr = config.server_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = server::start_api_server(&addr, server_state).await {
            warning!(
                "Callback server unavailable: {}\nFinish with: tracklens auth --callback-url '<redirected address>'",
                e
            );
        }
    });

    if webbrowser::open(&login.authorize_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            login.authorize_url
        );
    }

    match wait_for_login(&shared, previous.as_ref()).await {
        Some(_) => success!("Authentication successful!"),
        None => error!("Authentication failed or timed out."),
    }
}

/// Polls until the callback was handled or the timeout passed. Returns the
/// new credential, or `None` when the login failed or timed out.
async fn wait_for_login(shared: &SharedAuth, previous: Option<&Credential>) -> Option<Credential> {
    let pb = spinner("Waiting for authorization in the browser...");
    let start = Instant::now();

    let outcome = loop {
        {
            let auth = shared.lock().await;
            let pending = match auth.login_pending().await {
                Ok(pending) => pending,
                Err(e) => {
                    warning!("Cannot read login state: {}", e);
                    break None;
                }
            };
            match login_outcome(auth.current_credential(), previous, pending) {
                LoginOutcome::Pending => {}
                LoginOutcome::Completed(credential) => break Some(credential),
                LoginOutcome::Failed => break None,
            }
        }
        if start.elapsed() >= LOGIN_TIMEOUT {
            break None;
        }
        sleep(Duration::from_secs(1)).await;
    };

    pb.finish_and_clear();
    outcome
}

#[derive(Debug, PartialEq)]
enum LoginOutcome {
    Pending,
    Completed(Credential),
    Failed,
}

/// A credential other than `previous` means the login went through. Once the
/// verifier is gone without one, the callback was handled and failed, even
/// when an older session is still active.
fn login_outcome(
    current: Option<&Credential>,
    previous: Option<&Credential>,
    pending: bool,
) -> LoginOutcome {
    match current {
        Some(current) if Some(current) != previous => LoginOutcome::Completed(current.clone()),
        _ if !pending => LoginOutcome::Failed,
        _ => LoginOutcome::Pending,
    }
}

pub async fn logout(config: &Config) {
    let shared = open_session(config).await;
    if let Err(e) = shared.lock().await.logout().await {
        error!("Cannot clear session. Err: {}", e);
    }
    info!("Stored credentials removed.");
}
