use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::etl::{EtlRunResult, Location};
use crate::services::{EtlService, ReportService, TicketSizeReport};

#[derive(Clone)]
pub struct AppState {
    pub etl_service: EtlService,
    pub report_service: ReportService,
    pub max_upload_bytes: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub fn create_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/locations", get(get_locations))
        .route("/locations/{code}/ticket-size", get(get_ticket_size))
        .route("/imports", post(post_import).layer(upload_limit))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[instrument(skip(state))]
async fn get_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>, StatusCode> {
    let locations = state.report_service.list_locations().await.map_err(|e| {
        error!("Failed to fetch locations: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    info!("Retrieved {} locations", locations.len());
    Ok(Json(locations))
}

#[instrument(skip(state), fields(code = %code))]
async fn get_ticket_size(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<TicketSizeReport>, StatusCode> {
    debug!("Fetching ticket size for location {}", code);

    let report = state
        .report_service
        .ticket_size(&code)
        .await
        .map_err(|e| {
            error!("Failed to fetch ticket size for location {}: {}", code, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or_else(|| {
            warn!("Location {} not found", code);
            StatusCode::NOT_FOUND
        })?;

    info!("Retrieved {} ticket size months for location {}", report.months.len(), code);
    Ok(Json(report))
}

/// Upload a workbook (raw request body) and run the ETL on it
#[instrument(skip(state, body), fields(size = body.len()))]
async fn post_import(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<EtlRunResult>), StatusCode> {
    if body.is_empty() {
        warn!("Rejected import with empty body");
        return Err(StatusCode::BAD_REQUEST);
    }

    let result = state.etl_service.run_bytes(&body).await.map_err(|e| {
        error!("Import failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };

    info!(
        "Import finished with status {}: {} errors, {} warnings",
        status,
        result.errors.len(),
        result.warnings.len()
    );
    Ok((status, Json(result)))
}
