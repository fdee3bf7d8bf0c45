//! HTTP API Server
//!
//! REST API for image upload and listing. `POST /img` reads the request
//! from a JSON body, `GET /img` from the query string; both dispatch on
//! the `action` field and answer with the same envelope.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        DefaultBodyLimit, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::request::{guard_payload, parse_body};
use super::{ApiError, Envelope, ImageAction, RequestEnvelope, MAX_PAYLOAD_BYTES};
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::images::ImageService;
use crate::service_request::{self, ServiceRequestDraft};

/// lambda_http switch that keeps the API Gateway stage out of the path
const IGNORE_STAGE_ENV: &str = "AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Upload and list paths over the content store
    pub images: ImageService,
    /// Payload guard limit for POST bodies
    pub max_payload_bytes: usize,
}

impl AppState {
    pub fn new(images: ImageService, max_payload_bytes: usize) -> Self {
        Self {
            images,
            max_payload_bytes,
        }
    }
}

/// HTTP API server
pub struct HttpServer {
    config: ServerConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: ServerConfig, images: ImageService) -> Self {
        let state = AppState::new(images, MAX_PAYLOAD_BYTES);
        Self { config, state }
    }

    /// Get the state for sharing with other components
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router for this server
    pub fn router(&self) -> Router {
        create_router(self.state.clone(), self.config.cors_enabled)
    }

    /// Serve on the configured address until Ctrl+C
    pub async fn start(&self) -> Result<()> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(&self.config.bind_address).await?;
        tracing::info!("HTTP API listening on {}", self.config.bind_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        tracing::info!("HTTP API stopped");
        Ok(())
    }

    /// Serve API Gateway proxy events through the Lambda runtime
    pub async fn run_lambda(&self) -> Result<()> {
        // Routes are mounted at the root; REST API stage names must not
        // show up in the request path.
        if std::env::var_os(IGNORE_STAGE_ENV).is_none() {
            std::env::set_var(IGNORE_STAGE_ENV, "true");
        }
        tracing::info!("Starting Lambda runtime");

        lambda_http::run(self.router())
            .await
            .map_err(|e| Error::Internal(format!("Lambda runtime error: {}", e)))
    }
}

/// Create the router
pub fn create_router(state: AppState, cors_enabled: bool) -> Router {
    // One byte past the guard so oversized bodies reach the guard and get
    // the envelope instead of a bare 413.
    let body_limit = state.max_payload_bytes.saturating_add(1);

    let router = Router::new()
        .route(
            "/img",
            get(handle_img_get)
                .post(handle_img_post)
                .fallback(handle_img_method_not_allowed),
        )
        .route("/service-requests/validate", post(handle_validate_service_request))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    let router = if cors_enabled {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// ============ Response Types ============

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub bucket: String,
}

// ============ Handlers ============

async fn handle_img_post(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let envelope = match body {
        Ok(body) => parse_body(&body, state.max_payload_bytes),
        Err(rejection) => {
            tracing::warn!("Failed to read request body: {}", rejection);
            Err(ApiError::InvalidInput)
        }
    };

    respond(&state, envelope).await
}

async fn handle_img_get(
    State(state): State<AppState>,
    query: std::result::Result<Query<RequestEnvelope>, QueryRejection>,
) -> Response {
    let envelope = query.map(|Query(q)| q).map_err(|rejection| {
        tracing::debug!("Unparseable query string: {}", rejection);
        ApiError::InvalidInput
    });

    respond(&state, envelope).await
}

async fn respond(state: &AppState, envelope: std::result::Result<RequestEnvelope, ApiError>) -> Response {
    match dispatch(state, envelope).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn dispatch(
    state: &AppState,
    envelope: std::result::Result<RequestEnvelope, ApiError>,
) -> std::result::Result<Response, ApiError> {
    let envelope = envelope?;
    tracing::info!(
        action = ?envelope.action,
        file_name = ?envelope.file_name,
        "Request data parsed"
    );

    match ImageAction::try_from(envelope)? {
        ImageAction::Upload { file_name, image } => {
            state.images.upload(&file_name, image).await?;
            Ok(Envelope::message(StatusCode::OK, "Image uploaded successfully.").into_response())
        }
        ImageAction::List => {
            let urls = state.images.list().await?;
            Ok(Envelope::ok("Images listed successfully", urls).into_response())
        }
    }
}

async fn handle_img_method_not_allowed() -> Response {
    Envelope::message(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed.").into_response()
}

async fn handle_validate_service_request(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let draft = body
        .map_err(|_| ApiError::InvalidInput)
        .and_then(|body| {
            guard_payload(&body, state.max_payload_bytes)?;
            serde_json::from_slice::<ServiceRequestDraft>(&body).map_err(|_| ApiError::InvalidInput)
        });

    let draft = match draft {
        Ok(draft) => draft,
        Err(e) => return e.into_response(),
    };

    match service_request::normalize(draft, chrono::Utc::now()) {
        Ok(record) => {
            tracing::info!(id = %record.id, "Service request validated");
            Envelope::ok("Service request is valid", record).into_response()
        }
        Err(errors) => {
            tracing::info!(fields = ?errors.fields().collect::<Vec<_>>(), "Service request rejected");
            Envelope::new(StatusCode::BAD_REQUEST, "Invalid service request", Some(errors)).into_response()
        }
    }
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        bucket: state.images.store().bucket().to_string(),
    })
}
