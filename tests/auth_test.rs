mod common;

use std::sync::Arc;

use reqwest::Url;
use tokio::{net::TcpListener, sync::Mutex};
use tracklens::{
    Error,
    management::{ACCESS_TOKEN_KEY, FileSessionStore, MemorySessionStore, SessionStore, VERIFIER_KEY},
    server,
    spotify::auth::PkceAuthenticator,
    types::AuthState,
    utils::generate_code_challenge,
};

use common::{FakeUpstream, config, query, temp_dir};

#[tokio::test]
async fn test_login_exchanges_code_with_stored_verifier() {
    let upstream = FakeUpstream::new();
    let base = upstream.spawn().await;
    let store = MemorySessionStore::new();
    let mut auth = PkceAuthenticator::new(config(&base), store.clone());

    let login = auth.begin_login().await.unwrap();
    assert_eq!(auth.state(), AuthState::AwaitingConsent);

    let url = Url::parse(&login.authorize_url).unwrap();
    let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(params["client_id"], "test-client");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(params["code_challenge"], login.code_challenge);

    let credential = auth
        .complete_login(&query(&[("code", "code-1")]))
        .await
        .unwrap();
    assert_eq!(credential.access_token, "token-1");
    assert!(credential.expires_at.is_some());
    assert_eq!(auth.state(), AuthState::Authenticated);

    // The exchange carried the verifier behind the challenge
    let verifiers = upstream.verifiers();
    assert_eq!(verifiers.len(), 1);
    assert_eq!(generate_code_challenge(&verifiers[0]), login.code_challenge);
    assert_eq!(credential.code_verifier, verifiers[0]);

    // Verifier consumed, credential persisted
    assert_eq!(store.get(VERIFIER_KEY).await.unwrap(), None);
    assert!(store.get(ACCESS_TOKEN_KEY).await.unwrap().unwrap().contains("token-1"));
}

#[tokio::test]
async fn test_replayed_callback_is_rejected() {
    let upstream = FakeUpstream::new();
    let base = upstream.spawn().await;
    let mut auth = PkceAuthenticator::new(config(&base), MemorySessionStore::new());

    auth.begin_login().await.unwrap();
    let callback = query(&[("code", "code-1")]);
    auth.complete_login(&callback).await.unwrap();

    // Same callback again, verifier already gone
    let err = auth.complete_login(&callback).await.unwrap_err();
    assert!(matches!(err, Error::AuthenticationRequired { .. }));
    assert_eq!(upstream.verifiers().len(), 1);

    // Fresh verifier, but the code was already redeemed upstream
    auth.begin_login().await.unwrap();
    let err = auth.complete_login(&callback).await.unwrap_err();
    assert!(matches!(err, Error::AuthenticationRequired { .. }));
    assert_eq!(upstream.verifiers().len(), 2);

    // The earlier login is still in effect
    assert_eq!(auth.state(), AuthState::Authenticated);
    assert_eq!(auth.current_credential().unwrap().access_token, "token-1");
}

#[tokio::test]
async fn test_failed_login_without_prior_session_is_unauthenticated() {
    let upstream = FakeUpstream::new();
    let base = upstream.spawn().await;
    let store = MemorySessionStore::new();
    let mut auth = PkceAuthenticator::new(config(&base), store.clone());

    auth.begin_login().await.unwrap();
    let err = auth
        .complete_login(&query(&[("code", "bogus")]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::AuthenticationRequired { .. }));
    assert_eq!(auth.state(), AuthState::Unauthenticated);
    assert!(auth.current_credential().is_none());
    assert_eq!(store.get(VERIFIER_KEY).await.unwrap(), None);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_unreachable_token_endpoint_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut auth = PkceAuthenticator::new(config(&base), MemorySessionStore::new());
    auth.begin_login().await.unwrap();

    let err = auth
        .complete_login(&query(&[("code", "code-1")]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TransportError(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_session_survives_restart() {
    let upstream = FakeUpstream::new();
    let base = upstream.spawn().await;
    let dir = temp_dir("restart");

    {
        let mut auth = PkceAuthenticator::new(config(&base), FileSessionStore::new(&dir));
        auth.begin_login().await.unwrap();
        auth.complete_login(&query(&[("code", "code-7")]))
            .await
            .unwrap();
    }

    let mut auth = PkceAuthenticator::new(config(&base), FileSessionStore::new(&dir));
    let restored = auth.restore_session().await.unwrap().cloned();
    assert_eq!(restored.unwrap().access_token, "token-1");
    assert_eq!(auth.state(), AuthState::Authenticated);

    auth.logout().await.unwrap();
    let mut auth = PkceAuthenticator::new(config(&base), FileSessionStore::new(&dir));
    assert!(auth.restore_session().await.unwrap().is_none());
    assert_eq!(auth.state(), AuthState::Unauthenticated);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_pending_login_survives_restart() {
    let upstream = FakeUpstream::new();
    let base = upstream.spawn().await;
    let dir = temp_dir("pending");

    let login = {
        let mut auth = PkceAuthenticator::new(config(&base), FileSessionStore::new(&dir));
        auth.begin_login().await.unwrap()
    };

    let mut auth = PkceAuthenticator::new(config(&base), FileSessionStore::new(&dir));
    assert!(auth.restore_session().await.unwrap().is_none());
    assert_eq!(auth.state(), AuthState::AwaitingConsent);

    auth.complete_login(&query(&[("code", "code-2")]))
        .await
        .unwrap();
    assert_eq!(
        generate_code_challenge(&upstream.verifiers()[0]),
        login.code_challenge
    );

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_callback_server_strips_code_from_address() {
    let upstream = FakeUpstream::new();
    let base = upstream.spawn().await;
    let auth = Arc::new(Mutex::new(PkceAuthenticator::new(
        config(&base),
        MemorySessionStore::new(),
    )));
    auth.lock().await.begin_login().await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let callback_base = format!("http://{}", listener.local_addr().unwrap());
    let server_auth = Arc::clone(&auth);
    tokio::spawn(async move {
        server::serve(listener, server_auth).await.unwrap();
    });

    let http = reqwest::Client::new();
    let res = http
        .get(format!("{}/callback?code=code-3&state=x", callback_base))
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    assert_eq!(res.url().path(), "/authorized");
    assert_eq!(res.url().query(), None);
    assert_eq!(auth.lock().await.state(), AuthState::Authenticated);

    // Reloading the redirect target is harmless
    let res = http
        .get(format!("{}/authorized", callback_base))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());

    // Replaying the callback itself is not
    let res = http
        .get(format!("{}/callback?code=code-3", callback_base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(
        auth.lock().await.current_credential().unwrap().access_token,
        "token-1"
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let auth = Arc::new(Mutex::new(PkceAuthenticator::new(
        config("http://127.0.0.1:1"),
        MemorySessionStore::new(),
    )));
    let base = common::spawn_router(server::router(auth)).await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["name"], "tracklens");
}
