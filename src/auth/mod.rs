//! OAuth2 authorization-code flow.
//!
//! A transient HTTP listener on localhost receives the provider redirect,
//! the authorization code is exchanged for tokens server-to-server, and the
//! listener is torn down on every exit path so the port never leaks across
//! login attempts.
//!
//! Three paths race to settle the flow: the callback handler (error or
//! successful exchange), and the overall timeout. Settlement is exactly-once
//! through a capacity-1 channel; whichever path sends first wins and later
//! sends are no-ops.

mod pages;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use miette::Diagnostic;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const AUTH_URL: &str = "https://ticktick.com/oauth/authorize";
pub const TOKEN_URL: &str = "https://ticktick.com/oauth/token";
pub const CALLBACK_PORT: u16 = 8080;
pub const OAUTH_SCOPE: &str = "tasks:read tasks:write";

const OAUTH_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Diagnostic, Debug)]
pub enum AuthError {
    #[error("Failed to start the callback listener on port {port}")]
    #[diagnostic(
        code(ticktick::auth::listener),
        help("Another process may be holding the port. Stop it and try again.")
    )]
    ListenerBind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("OAuth error: {code} - {description}")]
    #[diagnostic(code(ticktick::auth::provider))]
    Provider { code: String, description: String },

    #[error("Invalid state parameter (possible CSRF attack)")]
    #[diagnostic(code(ticktick::auth::state_mismatch))]
    StateMismatch,

    #[error("No authorization code received")]
    #[diagnostic(code(ticktick::auth::missing_code))]
    MissingCode,

    #[error("No access token in the token response")]
    #[diagnostic(code(ticktick::auth::missing_token))]
    MissingToken,

    #[error("Token exchange failed: {message}")]
    #[diagnostic(code(ticktick::auth::exchange))]
    Exchange { message: String },

    #[error("Invalid OAuth endpoint: {message}")]
    #[diagnostic(code(ticktick::auth::endpoint))]
    InvalidEndpoint { message: String },

    #[error("OAuth flow timed out after 5 minutes")]
    #[diagnostic(
        code(ticktick::auth::timeout),
        help("Complete the browser authorization within the timeout, then retry.")
    )]
    Timeout,
}

/// Tokens returned by a completed flow.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until expiry; defaults to 3600 when the provider omits it.
    pub expires_in: u64,
}

/// Flow knobs. The defaults target the production endpoints; tests point the
/// URLs at local fixtures and bind port 0 for an ephemeral listener.
#[derive(Debug, Clone)]
pub struct OAuthOptions {
    pub auth_url: String,
    pub token_url: String,
    pub port: u16,
    pub open_browser: bool,
    pub timeout: Duration,
}

impl Default for OAuthOptions {
    fn default() -> Self {
        Self {
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            port: CALLBACK_PORT,
            open_browser: true,
            timeout: OAUTH_TIMEOUT,
        }
    }
}

type FlowOutcome = Result<TokenSet, AuthError>;

struct CallbackContext {
    expected_state: String,
    client_id: String,
    client_secret: String,
    token_url: String,
    redirect_uri: String,
    tx: mpsc::Sender<FlowOutcome>,
    http: reqwest::Client,
}

impl CallbackContext {
    /// First writer wins; everyone else is a no-op.
    fn settle(&self, outcome: FlowOutcome) {
        let _ = self.tx.try_send(outcome);
    }
}

/// A bound, not-yet-finished flow. Splitting bind from finish lets callers
/// (and tests) observe the authorization URL before the wait begins.
pub struct OAuthFlow {
    options: OAuthOptions,
    authorize_url: String,
    redirect_uri: String,
    rx: mpsc::Receiver<FlowOutcome>,
    shutdown: CancellationToken,
    server: JoinHandle<std::io::Result<()>>,
}

/// Run the whole login flow against the production endpoints.
pub async fn login(client_id: &str, client_secret: &str) -> FlowOutcome {
    let flow = OAuthFlow::bind(client_id, client_secret, OAuthOptions::default()).await?;
    flow.finish().await
}

impl OAuthFlow {
    /// Generate the state token, bind the callback listener, and start
    /// serving. Fails if the port is taken.
    pub async fn bind(
        client_id: &str,
        client_secret: &str,
        options: OAuthOptions,
    ) -> Result<Self, AuthError> {
        let state = generate_state();

        let listener = TcpListener::bind(("127.0.0.1", options.port))
            .await
            .map_err(|source| AuthError::ListenerBind {
                port: options.port,
                source,
            })?;
        let port = listener
            .local_addr()
            .map_err(|source| AuthError::ListenerBind {
                port: options.port,
                source,
            })?
            .port();
        let redirect_uri = format!("http://localhost:{port}/callback");

        let authorize_url = reqwest::Url::parse_with_params(
            &options.auth_url,
            &[
                ("client_id", client_id),
                ("redirect_uri", redirect_uri.as_str()),
                ("state", state.as_str()),
                ("scope", OAUTH_SCOPE),
                ("response_type", "code"),
            ],
        )
        .map_err(|e| AuthError::InvalidEndpoint {
            message: e.to_string(),
        })?
        .to_string();

        let http = reqwest::Client::builder()
            .timeout(EXCHANGE_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Exchange {
                message: e.to_string(),
            })?;

        let (tx, rx) = mpsc::channel(1);
        let ctx = Arc::new(CallbackContext {
            expected_state: state,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_url: options.token_url.clone(),
            redirect_uri: redirect_uri.clone(),
            tx,
            http,
        });

        let app = Router::new()
            .route("/callback", get(handle_callback))
            .with_state(ctx);

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone().cancelled_owned();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(signal)
                .await
        });

        tracing::debug!(port, "OAuth callback listener started");

        Ok(Self {
            options,
            authorize_url,
            redirect_uri,
            rx,
            shutdown,
            server,
        })
    }

    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Send the user to the provider and wait for the flow to settle.
    pub async fn finish(mut self) -> FlowOutcome {
        println!("Opening browser for authorization...");
        println!(
            "If the browser doesn't open, visit this URL:\n{}\n",
            self.authorize_url
        );
        if self.options.open_browser {
            if let Err(e) = open::that(&self.authorize_url) {
                tracing::warn!("failed to open browser automatically: {e}");
                println!("Failed to open browser automatically: {e}");
            }
        }

        let outcome = match tokio::time::timeout(self.options.timeout, self.rx.recv()).await {
            Ok(Some(outcome)) => {
                self.close(false).await;
                outcome
            }
            // All senders dropped without settling; treat like a timeout
            Ok(None) => {
                self.close(true).await;
                Err(AuthError::Timeout)
            }
            Err(_) => {
                self.close(true).await;
                Err(AuthError::Timeout)
            }
        };
        outcome
    }

    /// Tear the listener down. A settled flow gets a brief graceful drain;
    /// the timeout path destroys open connections immediately. The port is
    /// free again by the time this returns.
    async fn close(&mut self, force: bool) {
        self.shutdown.cancel();
        if force {
            self.server.abort();
            let _ = (&mut self.server).await;
        } else if tokio::time::timeout(Duration::from_secs(1), &mut self.server)
            .await
            .is_err()
        {
            self.server.abort();
            let _ = (&mut self.server).await;
        }
        tracing::debug!("OAuth callback listener closed");
    }
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn handle_callback(
    State(ctx): State<Arc<CallbackContext>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(code) = params.error {
        let description = params.error_description.unwrap_or_default();
        ctx.settle(Err(AuthError::Provider {
            code: code.clone(),
            description: description.clone(),
        }));
        return page(
            StatusCode::BAD_REQUEST,
            pages::failure_page(&code, &description),
        );
    }

    if params.state.as_deref() != Some(ctx.expected_state.as_str()) {
        ctx.settle(Err(AuthError::StateMismatch));
        return page(
            StatusCode::BAD_REQUEST,
            pages::failure_page("Invalid state", "Possible CSRF attack"),
        );
    }

    let Some(code) = params.code else {
        ctx.settle(Err(AuthError::MissingCode));
        return page(
            StatusCode::BAD_REQUEST,
            pages::failure_page("No code", "No authorization code received"),
        );
    };

    // Respond to the browser right away; the exchange settles the flow from
    // a separate task, and the listener stays up until it does.
    let ctx = Arc::clone(&ctx);
    tokio::spawn(async move {
        tracing::info!("exchanging authorization code for access token");
        let outcome = exchange_code(&ctx, &code).await;
        ctx.settle(outcome);
    });

    page(StatusCode::OK, pages::success_page())
}

fn page(status: StatusCode, body: String) -> Response {
    // The listener serves at most one real exchange; ask the browser not to
    // hold the connection open.
    (status, [(header::CONNECTION, "close")], Html(body)).into_response()
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn exchange_code(ctx: &CallbackContext, code: &str) -> FlowOutcome {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", ctx.client_id.as_str()),
        ("client_secret", ctx.client_secret.as_str()),
        ("redirect_uri", ctx.redirect_uri.as_str()),
    ];

    let response = ctx
        .http
        .post(&ctx.token_url)
        .header(header::ACCEPT, "application/json")
        .form(&params)
        .send()
        .await
        .map_err(|e| AuthError::Exchange {
            message: e.to_string(),
        })?;

    let body: TokenResponse = response.json().await.map_err(|e| AuthError::Exchange {
        message: e.to_string(),
    })?;

    if let Some(error) = body.error {
        return Err(AuthError::Provider {
            code: error,
            description: body.error_description.unwrap_or_default(),
        });
    }

    let access_token = body
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    Ok(TokenSet {
        access_token,
        refresh_token: body.refresh_token.unwrap_or_default(),
        expires_in: body.expires_in.unwrap_or(3600),
    })
}

fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
#[path = "flow_test.rs"]
mod flow_test;
