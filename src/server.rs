//! HTTP API.
//!
//! Stateless JSON handlers over a shared, read-only [`TableStore`] and the
//! SQLite regulation index.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/checklists` | Norm identifiers, in definition order |
//! | `POST` | `/checklists/items` | Questions of one checklist (`{name}`) |
//! | `POST` | `/search` | Keyword search (`{term}`) |
//! | `POST` | `/brigade` | Fire-brigade sizing (`{headcount, divisionCode}`) |
//! | `POST` | `/cipa` | CIPA sizing (`{activityCode, headcount, riskGrade?}`) |
//! | `POST` | `/sesmt` | SESMT sizing (`{activityCode, headcount, riskGrade?}`) |
//! | `POST` | `/report` | PDF report (`{kind, metadata, payload}`) |
//! | `GET`  | `/health` | Status, version and indexed record count |
//! | `GET`  | `<static_prefix>/*` | Source documents, read-only |
//!
//! # Error Contract
//!
//! ```json
//! { "kind": "invalid_input", "message": "headcount must be a positive integer, got 0" }
//! ```
//!
//! `invalid_input` (400), `configuration_error` (422),
//! `external_resource_unavailable` (503), `rendering_failure` (500),
//! `internal` (500). Malformed JSON bodies are `invalid_input`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser form can
//! be served from anywhere.

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::error::SstError;
use crate::ingest::{record_count, run_ingest, IngestMode};
use crate::migrate::run_migrations;
use crate::models::{BrigadeResult, CipaResult, ReportRequest, SearchHit, SesmtResult};
use crate::report::render_report;
use crate::search::search_documents;
use crate::sizing::{size_brigade, size_cipa, size_sesmt, RiskClassifier};
use crate::tables::TableStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tables: Arc<TableStore>,
    pub classifier: Arc<RiskClassifier>,
    pub pool: SqlitePool,
}

impl AppState {
    /// Load tables, open the database and apply migrations. Table validation
    /// failures are fatal here.
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        let tables = TableStore::from_config(&config.tables)
            .context("Regulatory tables failed validation")?;
        let pool = db::connect(config).await?;
        run_migrations(&pool).await?;

        Ok(Self {
            config: Arc::new(config.clone()),
            tables: Arc::new(tables),
            classifier: Arc::new(RiskClassifier::new(&config.risk)),
            pool,
        })
    }
}

/// Build the application router. Exposed for in-process tests.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_prefix = state
        .config
        .server
        .static_prefix
        .trim_end_matches('/')
        .to_string();
    let documents = ServeDir::new(&state.config.index.pdf_dir);

    let mut app = Router::new()
        .route("/checklists", get(handle_list_checklists))
        .route("/checklists/items", post(handle_checklist_items))
        .route("/search", post(handle_search))
        .route("/brigade", post(handle_brigade))
        .route("/cipa", post(handle_cipa))
        .route("/sesmt", post(handle_sesmt))
        .route("/report", post(handle_report))
        .route("/health", get(handle_health));
    if !static_prefix.is_empty() {
        app = app.nest_service(&static_prefix, documents);
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind`.
///
/// When `ingest_on_startup` is set, the document index is built in a
/// background task; searches issued before it finishes may come back empty.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::build(config).await?;

    if config.index.ingest_on_startup {
        let config = state.config.clone();
        let pool = state.pool.clone();
        tokio::spawn(async move {
            match run_ingest(&config, &pool, IngestMode::Incremental).await {
                Ok(report) if report.skipped => {}
                Ok(report) => info!(records = report.records_written, "background ingest done"),
                Err(e) => error!(error = %e, "background ingest failed"),
            }
        });
    }

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("SST server listening on http://{}", bind_addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

/// Handler error, rendered as `{kind, message}`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl AppError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_input",
            message: message.into(),
        }
    }
}

impl From<SstError> for AppError {
    fn from(err: SstError) -> Self {
        let status = match err {
            SstError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            SstError::Configuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SstError::ExternalResourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SstError::Rendering(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %err, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            kind: self.kind,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, reporting malformed input as `invalid_input`.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::invalid(rejection.body_text()))
}

// ============ Request bodies ============

#[derive(Deserialize)]
struct ChecklistItemsRequest {
    name: String,
}

#[derive(Deserialize)]
struct SearchRequest {
    term: String,
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrigadeRequest {
    headcount: i64,
    division_code: String,
}

/// Shared by `/cipa` and `/sesmt`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StaffingRequest {
    activity_code: String,
    headcount: i64,
    #[serde(default)]
    risk_grade: Option<i64>,
}

// ============ Handlers ============

async fn handle_list_checklists(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.tables.list_checklists())
}

async fn handle_checklist_items(
    State(state): State<AppState>,
    payload: Result<Json<ChecklistItemsRequest>, JsonRejection>,
) -> Result<Json<Vec<String>>, AppError> {
    let req = body(payload)?;
    Ok(Json(state.tables.checklist_items(&req.name)))
}

async fn handle_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Vec<SearchHit>>, AppError> {
    let req = body(payload)?;
    let hits = search_documents(&state.pool, &state.config.search, &req.term, req.limit).await?;
    Ok(Json(hits))
}

async fn handle_brigade(
    State(state): State<AppState>,
    payload: Result<Json<BrigadeRequest>, JsonRejection>,
) -> Result<Json<BrigadeResult>, AppError> {
    let req = body(payload)?;
    Ok(Json(size_brigade(
        &state.tables,
        req.headcount,
        &req.division_code,
    )?))
}

async fn handle_cipa(
    State(state): State<AppState>,
    payload: Result<Json<StaffingRequest>, JsonRejection>,
) -> Result<Json<CipaResult>, AppError> {
    let req = body(payload)?;
    Ok(Json(size_cipa(
        &state.tables,
        &state.classifier,
        &req.activity_code,
        req.headcount,
        req.risk_grade,
    )?))
}

async fn handle_sesmt(
    State(state): State<AppState>,
    payload: Result<Json<StaffingRequest>, JsonRejection>,
) -> Result<Json<SesmtResult>, AppError> {
    let req = body(payload)?;
    Ok(Json(size_sesmt(
        &state.tables,
        &state.classifier,
        &req.activity_code,
        req.headcount,
        req.risk_grade,
    )?))
}

async fn handle_report(
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let req = body(payload)?;
    let today = chrono::Local::now().date_naive();
    let bytes = render_report(&req, today)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"report.pdf\"",
            ),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    indexed_records: i64,
}

async fn handle_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        indexed_records: record_count(&state.pool).await?,
    }))
}
