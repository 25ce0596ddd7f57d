use super::*;
use axum::Json;
use axum::routing::post;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stand-in token endpoint returning a canned JSON body.
async fn spawn_token_server(
    body: serde_json::Value,
    calls: Arc<AtomicUsize>,
) -> (String, tokio::task::JoinHandle<()>) {
    let app = Router::new().route(
        "/oauth/token",
        post(move || {
            let calls = Arc::clone(&calls);
            let body = body.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Json(body)
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{}/oauth/token", addr);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (url, handle)
}

// Initialize crypto provider once for all tests
fn init_crypto() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

fn test_options(token_url: String) -> OAuthOptions {
    init_crypto();
    OAuthOptions {
        auth_url: "https://auth.example.com/oauth/authorize".to_string(),
        token_url,
        port: 0,
        open_browser: false,
        timeout: Duration::from_secs(5),
    }
}

fn state_param(flow: &OAuthFlow) -> String {
    reqwest::Url::parse(flow.authorize_url())
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("authorize URL carries a state parameter")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_authorize_url_carries_required_parameters() {
    let flow = OAuthFlow::bind("cid", "secret", test_options("http://unused/".to_string()))
        .await
        .unwrap();

    let url = reqwest::Url::parse(flow.authorize_url()).unwrap();
    let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

    assert_eq!(pairs["client_id"], "cid");
    assert_eq!(pairs["redirect_uri"], flow.redirect_uri());
    assert_eq!(pairs["scope"], OAUTH_SCOPE);
    assert_eq!(pairs["response_type"], "code");
    // The state is random and URL-safe; 32 bytes base64 without padding
    assert_eq!(pairs["state"].len(), 43);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_successful_flow_exchanges_code() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (token_url, _token_server) = spawn_token_server(
        json!({
            "access_token": "at-123",
            "refresh_token": "rt-456",
            "expires_in": 7200,
            "token_type": "bearer",
        }),
        Arc::clone(&calls),
    )
    .await;

    let flow = OAuthFlow::bind("cid", "secret", test_options(token_url))
        .await
        .unwrap();
    let state = state_param(&flow);
    let callback = format!("{}?code=authcode&state={}", flow.redirect_uri(), state);

    let response = reqwest::get(&callback).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Authorization Successful")
    );

    let tokens = flow.finish().await.unwrap();
    assert_eq!(tokens.access_token, "at-123");
    assert_eq!(tokens.refresh_token, "rt-456");
    assert_eq!(tokens.expires_in, 7200);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expires_in_defaults_to_an_hour() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (token_url, _token_server) = spawn_token_server(
        json!({"access_token": "at", "refresh_token": "rt"}),
        Arc::clone(&calls),
    )
    .await;

    let flow = OAuthFlow::bind("cid", "secret", test_options(token_url))
        .await
        .unwrap();
    let state = state_param(&flow);
    reqwest::get(format!(
        "{}?code=authcode&state={}",
        flow.redirect_uri(),
        state
    ))
    .await
    .unwrap();

    let tokens = flow.finish().await.unwrap();
    assert_eq!(tokens.expires_in, 3600);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_state_mismatch_never_reaches_exchange() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (token_url, _token_server) =
        spawn_token_server(json!({"access_token": "at"}), Arc::clone(&calls)).await;

    let flow = OAuthFlow::bind("cid", "secret", test_options(token_url))
        .await
        .unwrap();
    let callback = format!("{}?code=authcode&state=forged", flow.redirect_uri());

    let response = reqwest::get(&callback).await.unwrap();
    assert_eq!(response.status(), 400);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("Authorization Failed")
    );

    let err = flow.finish().await.unwrap_err();
    assert!(matches!(err, AuthError::StateMismatch));
    assert_eq!(calls.load(Ordering::SeqCst), 0, "exchange must not run");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_provider_error_fails_the_flow() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (token_url, _token_server) =
        spawn_token_server(json!({"access_token": "at"}), Arc::clone(&calls)).await;

    let flow = OAuthFlow::bind("cid", "secret", test_options(token_url))
        .await
        .unwrap();
    let callback = format!(
        "{}?error=access_denied&error_description=user%20said%20no",
        flow.redirect_uri()
    );

    let response = reqwest::get(&callback).await.unwrap();
    assert_eq!(response.status(), 400);

    match flow.finish().await.unwrap_err() {
        AuthError::Provider { code, description } => {
            assert_eq!(code, "access_denied");
            assert_eq!(description, "user said no");
        }
        other => panic!("expected Provider error, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_code_fails_the_flow() {
    let flow = OAuthFlow::bind("cid", "secret", test_options("http://unused/".to_string()))
        .await
        .unwrap();
    let state = state_param(&flow);

    let response = reqwest::get(format!("{}?state={}", flow.redirect_uri(), state))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    assert!(matches!(
        flow.finish().await.unwrap_err(),
        AuthError::MissingCode
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_token_response_error_field_fails_the_flow() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (token_url, _token_server) = spawn_token_server(
        json!({"error": "invalid_grant", "error_description": "code expired"}),
        Arc::clone(&calls),
    )
    .await;

    let flow = OAuthFlow::bind("cid", "secret", test_options(token_url))
        .await
        .unwrap();
    let state = state_param(&flow);
    reqwest::get(format!("{}?code=stale&state={}", flow.redirect_uri(), state))
        .await
        .unwrap();

    match flow.finish().await.unwrap_err() {
        AuthError::Provider { code, .. } => assert_eq!(code, "invalid_grant"),
        other => panic!("expected Provider error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_token_response_without_access_token_fails() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (token_url, _token_server) =
        spawn_token_server(json!({"token_type": "bearer"}), Arc::clone(&calls)).await;

    let flow = OAuthFlow::bind("cid", "secret", test_options(token_url))
        .await
        .unwrap();
    let state = state_param(&flow);
    reqwest::get(format!("{}?code=ok&state={}", flow.redirect_uri(), state))
        .await
        .unwrap();

    assert!(matches!(
        flow.finish().await.unwrap_err(),
        AuthError::MissingToken
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_settles_and_releases_the_port() {
    let mut options = test_options("http://unused/".to_string());
    options.timeout = Duration::from_millis(200);

    let flow = OAuthFlow::bind("cid", "secret", options).await.unwrap();
    let port = reqwest::Url::parse(flow.redirect_uri())
        .unwrap()
        .port()
        .unwrap();

    assert!(matches!(flow.finish().await.unwrap_err(), AuthError::Timeout));

    // The listener must be gone on the timeout path too
    let rebound = TcpListener::bind(("127.0.0.1", port)).await;
    assert!(rebound.is_ok(), "port {} should be free again", port);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_callback_received_before_timeout_wins() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (token_url, _token_server) =
        spawn_token_server(json!({"access_token": "at"}), Arc::clone(&calls)).await;

    let mut options = test_options(token_url);
    options.timeout = Duration::from_secs(10);

    let flow = OAuthFlow::bind("cid", "secret", options).await.unwrap();
    let state = state_param(&flow);
    reqwest::get(format!("{}?code=fast&state={}", flow.redirect_uri(), state))
        .await
        .unwrap();

    let tokens = flow.finish().await.unwrap();
    assert_eq!(tokens.access_token, "at");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bind_failure_is_a_listener_error() {
    let holder = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = holder.local_addr().unwrap().port();

    let mut options = test_options("http://unused/".to_string());
    options.port = port;

    match OAuthFlow::bind("cid", "secret", options).await {
        Err(AuthError::ListenerBind { port: p, .. }) => assert_eq!(p, port),
        other => panic!("expected ListenerBind error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_successful_flow_releases_the_port() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (token_url, _token_server) =
        spawn_token_server(json!({"access_token": "at"}), Arc::clone(&calls)).await;

    let flow = OAuthFlow::bind("cid", "secret", test_options(token_url))
        .await
        .unwrap();
    let port = reqwest::Url::parse(flow.redirect_uri())
        .unwrap()
        .port()
        .unwrap();
    let state = state_param(&flow);
    reqwest::get(format!("{}?code=ok&state={}", flow.redirect_uri(), state))
        .await
        .unwrap();

    flow.finish().await.unwrap();

    let rebound = TcpListener::bind(("127.0.0.1", port)).await;
    assert!(rebound.is_ok(), "port {} should be free again", port);
}

#[test]
fn test_generated_state_is_url_safe_and_unique() {
    let a = generate_state();
    let b = generate_state();
    assert_ne!(a, b);
    assert_eq!(a.len(), 43);
    assert!(
        a.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    );
}
