use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{Res, api, management::SessionStore, spotify::auth::PkceAuthenticator};

pub fn router<S: SessionStore + 'static>(auth: Arc<Mutex<PkceAuthenticator<S>>>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback::<S>))
        .route("/authorized", get(api::authorized))
        .layer(Extension(auth))
}

/// Serves the callback endpoints on an already bound listener.
pub async fn serve<S: SessionStore + 'static>(
    listener: TcpListener,
    auth: Arc<Mutex<PkceAuthenticator<S>>>,
) -> Res<()> {
    axum::serve(listener, router(auth)).await?;
    Ok(())
}

pub async fn start_api_server<S: SessionStore + 'static>(
    addr: &str,
    auth: Arc<Mutex<PkceAuthenticator<S>>>,
) -> Res<()> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| format!("Failed to parse server address '{}': {}", addr, e))?;
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, auth).await
}
