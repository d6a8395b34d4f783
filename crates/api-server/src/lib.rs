pub mod config;
mod filereader_routes;
mod fundamental_routes;
mod health_routes;
mod news_routes;
mod timeseries_routes;

pub use config::Config;

use alphavantage_client::{AlphaVantageClient, AlphaVantageError};
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use file_reader::FileReaderError;
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use filereader_routes::filereader_routes;
use fundamental_routes::fundamental_routes;
use health_routes::health_routes;
use news_routes::news_routes;
use timeseries_routes::timeseries_routes;

/// Uploads above this size are rejected before reaching a handler.
pub const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: AlphaVantageClient,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = AlphaVantageClient::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.upstream_timeout,
        )
        .context("failed to build Alpha Vantage client")?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Wrap `data` in a response envelope stamped with the configured version.
    pub fn envelope<T>(&self, data: T) -> Envelope<T> {
        Envelope::new(&self.config.default_version, data)
    }
}

/// Success body shared by every data route.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub version: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(version: &str, data: T) -> Self {
        Self {
            version: version.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            symbol: None,
            interval: None,
            data,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }
}

/// Handler error rendered as `{"error": message}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn with_status(status: StatusCode, message: impl fmt::Display) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    pub fn bad_request(message: impl fmt::Display) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl fmt::Display) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "Request failed: {}", self.message);
        } else {
            tracing::warn!(status = %self.status, "Request rejected: {}", self.message);
        }

        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<AlphaVantageError> for AppError {
    fn from(err: AlphaVantageError) -> Self {
        Self::internal(err)
    }
}

impl From<FileReaderError> for AppError {
    fn from(err: FileReaderError) -> Self {
        match err {
            FileReaderError::UnsupportedFileType(_) => Self::bad_request(err),
            other => Self::internal(other),
        }
    }
}

/// Data routes, mounted under every API prefix.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(timeseries_routes())
        .merge(fundamental_routes())
        .merge(news_routes())
        .merge(filereader_routes())
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    // Leave room for the upstream call to time out first.
    let request_timeout = state.config.upstream_timeout + Duration::from_secs(5);

    Router::new()
        .merge(health_routes())
        .nest("/api/v1", api_routes())
        .nest("/v1", api_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        version = %config.default_version,
        upstream = %config.base_url,
        timeout_secs = config.upstream_timeout.as_secs(),
        "Loaded configuration"
    );

    let state = AppState::new(config)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
