use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension,
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tokio::sync::Mutex;

use crate::{error::Error, management::SessionStore, spotify::auth::PkceAuthenticator, warning};

/// Where the provider sends the user agent back after consent.
///
/// On success the browser is redirected to `/authorized`, so the used code
/// does not stay in the address bar.
pub async fn callback<S: SessionStore + 'static>(
    Query(params): Query<HashMap<String, String>>,
    Extension(auth): Extension<Arc<Mutex<PkceAuthenticator<S>>>>,
) -> Response {
    let result = auth.lock().await.complete_login(&params).await;

    match result {
        Ok(_) => Redirect::to("/authorized").into_response(),
        Err(e) => {
            warning!("Login failed: {}", e);
            let status = match &e {
                Error::TransportError(_) | Error::UpstreamRejected { .. } => StatusCode::BAD_GATEWAY,
                Error::Storage(_) | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            };
            (status, Html(format!("<h4>Login failed.</h4><p>{}</p>", e))).into_response()
        }
    }
}

pub async fn authorized() -> Html<&'static str> {
    Html("<h2>Authentication successful.</h2><p>You can close this window.</p>")
}
