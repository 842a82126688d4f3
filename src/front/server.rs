//! HTTP front end setup and handlers.
//!
//! # Responsibilities
//! - Serve a fixed set of static pages from the static directory
//! - Turn `POST /message` forms into relay submissions
//! - Answer everything else with the error page (404)
//! - Wire up middleware (tracing, request ID, body limit, timeout)
//!
//! # Design Decisions
//! - Request paths never reach the filesystem; only listed file names are read
//! - A successful submission redirects to `/`; any failure shows the error page

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Form, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::FrontConfig;
use crate::front::relay::RelayClient;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

const FALLBACK_ERROR_BODY: &str = "<h1>404 Not Found</h1>";

/// Error type for the front end.
#[derive(Debug, thiserror::Error)]
pub enum FrontError {
    #[error("static directory {} does not exist", .0.display())]
    MissingStaticDir(PathBuf),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
struct FrontState {
    static_dir: Arc<PathBuf>,
    relay: RelayClient,
}

#[derive(Debug, Deserialize)]
struct Submission {
    #[serde(default)]
    username: String,
    #[serde(default)]
    message: String,
}

/// HTTP server for the front end.
pub struct FrontServer {
    router: Router,
    static_dir: PathBuf,
}

impl FrontServer {
    /// Build the server. Fails if the static directory is missing.
    pub fn new(config: &FrontConfig) -> Result<Self, FrontError> {
        let static_dir = PathBuf::from(&config.static_dir);
        if !static_dir.is_dir() {
            return Err(FrontError::MissingStaticDir(static_dir));
        }

        let state = FrontState {
            static_dir: Arc::new(static_dir.clone()),
            relay: RelayClient::new(
                config.relay_address.clone(),
                Duration::from_millis(config.connect_timeout_ms),
            ),
        };

        Ok(Self {
            router: build_router(config, state),
            static_dir,
        })
    }

    /// Bind the configured HTTP address.
    pub async fn bind(config: &FrontConfig) -> Result<TcpListener, FrontError> {
        let address = config.bind_address();
        TcpListener::bind(&address)
            .await
            .map_err(|source| FrontError::Bind { address, source })
    }

    /// The router with all middleware applied.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` is triggered, then finish in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), FrontError> {
        let addr = listener.local_addr().map_err(FrontError::Serve)?;
        tracing::info!(
            address = %addr,
            static_dir = %self.static_dir.display(),
            "HTTP front end starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(FrontError::Serve)?;

        tracing::info!("HTTP front end stopped");
        Ok(())
    }
}

fn build_router(config: &FrontConfig, state: FrontState) -> Router {
    Router::new()
        .route("/", page("index.html"))
        .route("/index.html", page("index.html"))
        .route("/message.html", page("message.html"))
        .route("/style.css", page("style.css"))
        .route("/logo.png", page("logo.png"))
        .route("/message", post(submit).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_millis(config.request_timeout_ms),
                )),
        )
}

/// `GET` route serving one file; other methods get the error page.
fn page(file: &'static str) -> MethodRouter<FrontState> {
    get(move |State(state): State<FrontState>| async move {
        serve_file(&state.static_dir, file).await
    })
    .fallback(not_found)
}

async fn not_found(State(state): State<FrontState>) -> Response {
    error_page(&state.static_dir).await
}

async fn submit(
    State(state): State<FrontState>,
    form: Result<Form<Submission>, FormRejection>,
) -> Response {
    let submission = match form {
        Ok(Form(submission)) => submission,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Rejected form submission");
            metrics::record_front_submission("rejected");
            return error_page(&state.static_dir).await;
        }
    };

    if submission.username.is_empty() || submission.message.is_empty() {
        tracing::debug!("Submission with empty fields");
        metrics::record_front_submission("rejected");
        return error_page(&state.static_dir).await;
    }

    match state
        .relay
        .send(&submission.username, &submission.message)
        .await
    {
        Ok(()) => {
            metrics::record_front_submission("relayed");
            (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
        }
        Err(e) => {
            tracing::error!(relay = %state.relay.address(), error = %e, "Failed to relay submission");
            metrics::record_front_submission("relay-error");
            error_page(&state.static_dir).await
        }
    }
}

async fn serve_file(dir: &Path, file: &str) -> Response {
    let path = dir.join(file);
    match tokio::fs::read(&path).await {
        Ok(body) if !body.is_empty() => {
            ([(header::CONTENT_TYPE, content_type(file))], body).into_response()
        }
        Ok(_) => error_page(dir).await,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Static file unavailable");
            error_page(dir).await
        }
    }
}

async fn error_page(dir: &Path) -> Response {
    match tokio::fs::read(dir.join("error.html")).await {
        Ok(body) if !body.is_empty() => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/html")],
            body,
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, Html(FALLBACK_ERROR_BODY)).into_response(),
    }
}

fn content_type(file: &str) -> &'static str {
    match Path::new(file).extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("png") => "image/png",
        Some("js") => "text/javascript",
        Some("ico") => "image/vnd.microsoft.icon",
        _ => "text/plain",
    }
}
