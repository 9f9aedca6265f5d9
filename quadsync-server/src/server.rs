//! The webhook HTTP server.
//!
//! One POST handler at the root: verify the HMAC signature over the raw
//! body, filter by event type and ref, then hand the trigger to the
//! debouncer. The debounced callback funnels into the single-flight gate,
//! which runs engine passes on the blocking pool.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use quadsync_core::Config;
use quadsync_engine::Engine;
use quadsync_git::GitClient;
use quadsync_systemd::SystemdUser;

use crate::debounce::Debouncer;
use crate::error::ServeError;
use crate::signature;
use crate::single_flight::SingleFlight;

/// Quiet window before an accepted event triggers a pass.
const DEBOUNCE_DELAY: Duration = Duration::from_secs(2);

/// Maximum accepted request body.
const MAX_BODY_BYTES: usize = 1 << 20;

/// The fields quadsync reads from a GitHub push payload.
#[derive(Debug, Deserialize, Default)]
struct PushEvent {
    #[serde(rename = "ref", default)]
    git_ref: String,
    #[serde(default)]
    after: String,
    #[serde(default)]
    repository: Repository,
}

#[derive(Debug, Deserialize, Default)]
struct Repository {
    #[serde(default)]
    full_name: String,
}

struct AppState<G, S> {
    cfg: Config,
    git: G,
    systemd: S,
    secret: Vec<u8>,
    debounce: Debouncer,
    gate: SingleFlight,
    cancel: CancellationToken,
}

impl<G: GitClient, S: SystemdUser> AppState<G, S> {
    /// Run one engine pass through the single-flight gate, logging the
    /// outcome. Used by the debounce callback; pass failures keep the
    /// server alive.
    fn run_gated_pass(&self) {
        self.gate.run(&self.cancel, || {
            tracing::info!("performing sync operation");
            let engine = Engine::new(&self.cfg, &self.git, &self.systemd, false);
            match engine.run(&self.cancel) {
                Ok(_) => tracing::info!("sync completed successfully"),
                Err(err) => tracing::error!(error = %err, "sync failed"),
            }
        });
    }
}

/// The webhook server. Owns the HTTP listener, the debounce timer, the
/// single-flight state, and the initial-pass duty; the engine collaborators
/// are moved in at construction and shared with every pass.
pub struct WebhookServer<G, S> {
    state: Arc<AppState<G, S>>,
}

impl<G, S> WebhookServer<G, S>
where
    G: GitClient + 'static,
    S: SystemdUser + 'static,
{
    /// Build the server, loading the webhook secret from the configured
    /// file. Surrounding whitespace in the secret file is trimmed.
    pub fn new(
        cfg: Config,
        git: G,
        systemd: S,
        cancel: CancellationToken,
    ) -> Result<Self, ServeError> {
        let secret_path = cfg
            .serve
            .github_webhook_secret_file
            .clone()
            .ok_or_else(|| ServeError::Secret {
                path: Default::default(),
                source: std::io::Error::other("serve.github_webhook_secret_file is not set"),
            })?;
        let secret = std::fs::read_to_string(&secret_path).map_err(|source| ServeError::Secret {
            path: secret_path,
            source,
        })?;

        Ok(Self {
            state: Arc::new(AppState {
                cfg,
                git,
                systemd,
                secret: secret.trim().as_bytes().to_vec(),
                debounce: Debouncer::new(DEBOUNCE_DELAY),
                gate: SingleFlight::default(),
                cancel,
            }),
        })
    }

    /// The HTTP application. Exposed separately from [`Self::serve`] so
    /// handler behavior can be exercised without a listener.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", any(handle::<G, S>))
            .with_state(self.state.clone())
    }

    /// Perform one synchronous pass, then bind and serve until the
    /// cancellation token fires.
    ///
    /// A failed initial pass aborts startup: acknowledging webhooks that
    /// cannot be serviced would be worse than not starting.
    pub async fn serve(self) -> Result<(), ServeError> {
        tracing::info!("performing initial sync before starting webhook server");
        let state = self.state.clone();
        let initial = tokio::task::spawn_blocking(move || {
            let engine = Engine::new(&state.cfg, &state.git, &state.systemd, false);
            engine.run(&state.cancel)
        })
        .await
        .map_err(|e| ServeError::Serve {
            source: std::io::Error::other(e),
        })?;
        initial?;

        let addr = self.state.cfg.serve.listen_addr.clone();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| ServeError::Bind {
                addr: addr.clone(),
                source,
            })?;
        tracing::info!(addr = %addr, "webhook server starting");

        let cancel = self.state.cancel.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .map_err(|source| ServeError::Serve { source })?;

        tracing::info!("webhook server stopped");
        Ok(())
    }
}

async fn handle<G, S>(State(state): State<Arc<AppState<G, S>>>, request: Request) -> Response
where
    G: GitClient + 'static,
    S: SystemdUser + 'static,
{
    if request.method() != Method::POST {
        tracing::warn!(method = %request.method(), "rejecting non-POST request");
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed\n").into_response();
    }

    let content_type = header_str(&request, header::CONTENT_TYPE);
    if content_type != Some("application/json") {
        tracing::warn!(content_type, "rejecting request with invalid content type");
        return (StatusCode::BAD_REQUEST, "Invalid content type\n").into_response();
    }

    let declared_len = header_str(&request, header::CONTENT_LENGTH)
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > MAX_BODY_BYTES) {
        tracing::warn!(content_length = declared_len, "rejecting oversized request body");
        return (StatusCode::PAYLOAD_TOO_LARGE, "Body too large\n").into_response();
    }

    let event_type = header_str(&request, "X-GitHub-Event").map(str::to_owned);
    let sig_header = header_str(&request, "X-Hub-Signature-256").map(str::to_owned);

    let body = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "failed to read request body");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read body\n").into_response();
        }
    };

    if !signature::verify(&state.secret, &body, sig_header.as_deref()) {
        tracing::warn!("rejecting request with invalid signature");
        return (StatusCode::FORBIDDEN, "Invalid signature\n").into_response();
    }

    let event_type = event_type.unwrap_or_default();
    tracing::info!(event = %event_type, "received webhook");

    if !allowed(&state.cfg.serve.allowed_event_types, &event_type) {
        tracing::info!(event = %event_type, "ignoring disallowed event type");
        return (StatusCode::OK, "Event type not configured for sync\n").into_response();
    }

    let event: PushEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            tracing::error!(error = %err, "failed to parse webhook payload");
            return (StatusCode::BAD_REQUEST, "Invalid payload\n").into_response();
        }
    };

    if !allowed(&state.cfg.serve.allowed_refs, &event.git_ref) {
        tracing::info!(git_ref = %event.git_ref, "ignoring disallowed ref");
        return (StatusCode::OK, "Ref not configured for sync\n").into_response();
    }

    tracing::info!(
        event = %event_type,
        git_ref = %event.git_ref,
        commit = %event.after,
        repo = %event.repository.full_name,
        "webhook accepted",
    );

    let trigger_state = state.clone();
    state.debounce.trigger(move || {
        let state = trigger_state.clone();
        tokio::task::spawn_blocking(move || state.run_gated_pass());
    });

    (StatusCode::OK, "Sync triggered\n").into_response()
}

/// An empty allow-list admits everything.
fn allowed(allow_list: &[String], value: &str) -> bool {
    allow_list.is_empty() || allow_list.iter().any(|a| a == value)
}

fn header_str<'a>(request: &'a Request<Body>, name: impl header::AsHeaderName) -> Option<&'a str> {
    request.headers().get(name).and_then(|v| v.to_str().ok())
}
