//! JSON HTTP API.
//!
//! Exposes the report pipeline for a web front end: profiles are created at
//! registration time and reports generated on request. Profiles and reports
//! are returned to the caller, which owns their persistence.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (version and corpus state) |
//! | `GET`  | `/categories` | Known categories with article counts |
//! | `POST` | `/profiles` | Vectorize categories + free text into a profile |
//! | `POST` | `/reports` | Rank the corpus for a profile and assemble a report |
//! | `POST` | `/corpus/reload` | Rebuild the corpus and swap it in |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "unknown category `cocina`" } }
//! ```
//!
//! Error codes: `bad_request` (400), `corpus_load` (500), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use news_report_core::{render_text, CorpusLoadError, Profile, Report, VectorizationError};

use crate::service::{ReloadOutcome, ReportRequest, ReportService};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    service: Arc<ReportService>,
}

/// Build the router with all routes and the CORS layer.
pub fn router(service: Arc<ReportService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/categories", get(handle_categories))
        .route("/profiles", post(handle_create_profile))
        .route("/reports", post(handle_create_report))
        .route("/corpus/reload", post(handle_reload))
        .layer(cors)
        .with_state(AppState { service })
}

/// Bind to `[server].bind` and serve until the process is terminated.
pub async fn run_server(service: Arc<ReportService>) -> anyhow::Result<()> {
    let bind_addr = service.config().server.bind.clone();
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"corpus_load"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Map pipeline errors to HTTP responses by their concrete type.
fn classify(err: anyhow::Error) -> AppError {
    if let Some(e) = err.downcast_ref::<VectorizationError>() {
        return bad_request(e.to_string());
    }
    let message = format!("{:#}", err);
    error!(error = %message, "request failed");
    if err.downcast_ref::<CorpusLoadError>().is_some() {
        return AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "corpus_load".to_string(),
            message,
        };
    }
    // AssemblyError and anything unexpected
    internal(message)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    corpus_version: u64,
    articles: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let corpus = state.service.snapshot();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        corpus_version: corpus.version(),
        articles: corpus.len(),
    })
}

// ============ GET /categories ============

#[derive(Serialize)]
struct CategoryInfo {
    name: String,
    articles: usize,
}

#[derive(Serialize)]
struct CategoriesResponse {
    corpus_version: u64,
    categories: Vec<CategoryInfo>,
}

async fn handle_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let corpus = state.service.snapshot();
    let categories = corpus
        .category_counts()
        .into_iter()
        .map(|(name, articles)| CategoryInfo { name, articles })
        .collect();
    Json(CategoriesResponse {
        corpus_version: corpus.version(),
        categories,
    })
}

// ============ POST /profiles ============

#[derive(Deserialize)]
struct ProfileRequest {
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default, alias = "interests")]
    free_text: String,
}

async fn handle_create_profile(
    State(state): State<AppState>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    let profile = state
        .service
        .create_profile(&req.categories, &req.free_text)
        .map_err(classify)?;
    Ok(Json(profile))
}

// ============ POST /reports ============

/// Either a stored `profile` or raw `categories` + `free_text`.
#[derive(Deserialize)]
struct ReportBody {
    #[serde(default)]
    profile: Option<Profile>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default, alias = "interests")]
    free_text: String,
    #[serde(default)]
    recipient: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    introduction: Option<String>,
    #[serde(default)]
    closing: Option<String>,
    /// Also return the plain-text rendering.
    #[serde(default)]
    include_text: bool,
}

#[derive(Serialize)]
struct ReportResponse {
    #[serde(flatten)]
    report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

async fn handle_create_report(
    State(state): State<AppState>,
    Json(req): Json<ReportBody>,
) -> Result<Json<ReportResponse>, AppError> {
    if req.limit == Some(0) {
        return Err(bad_request("limit must be >= 1"));
    }

    let profile = match req.profile {
        Some(profile) => profile,
        None => state
            .service
            .create_profile(&req.categories, &req.free_text)
            .map_err(classify)?,
    };

    let request = ReportRequest {
        recipient: req.recipient,
        limit: req.limit,
        introduction: req.introduction,
        closing: req.closing,
    };
    let report = state
        .service
        .generate_report(&profile, request)
        .map_err(classify)?;
    let text = req.include_text.then(|| render_text(&report));

    Ok(Json(ReportResponse { report, text }))
}

// ============ POST /corpus/reload ============

#[derive(Deserialize, Default)]
struct ReloadRequest {
    #[serde(default)]
    force: bool,
}

async fn handle_reload(
    State(state): State<AppState>,
    body: Option<Json<ReloadRequest>>,
) -> Result<Json<ReloadOutcome>, AppError> {
    let force = body.map(|Json(b)| b.force).unwrap_or_default();
    let service = Arc::clone(&state.service);
    let outcome = tokio::task::spawn_blocking(move || service.reload(force))
        .await
        .map_err(|e| internal(format!("reload task failed: {}", e)))?
        .map_err(classify)?;
    Ok(Json(outcome))
}
