use crate::app::{AvailabilityUseCase, BookingStore, SyncUseCase};
use crate::error::SyncError;
use crate::types::{AvailabilityModel, BookingRecord, Sport, SyncOutcome};
use axum::{
    extract::{rejection::JsonRejection, Query},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Router,
};
use chrono::Local;
use hyper::Server;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared handles for the HTTP handlers
pub struct AppState {
    pub availability: AvailabilityUseCase,
    pub sync: SyncUseCase,
    pub store: Arc<dyn BookingStore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleParams {
    pub sport: Option<String>,
    pub d: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct SyncResponse {
    #[serde(flatten)]
    outcome: SyncOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

enum ApiError {
    Sync(SyncError),
    InvalidBody(String),
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        ApiError::Sync(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidBody(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Sync(err) => {
                let status = match &err {
                    SyncError::MissingIdentity | SyncError::UnknownSport(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    SyncError::AmbiguousDate(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    _ => StatusCode::BAD_GATEWAY,
                };
                if status != StatusCode::BAD_REQUEST {
                    error!("Request failed: {}", err);
                }
                (status, err.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Missing sport means indoor tennis, the portal's landing page
fn sport_param(raw: Option<&str>) -> Result<Sport, SyncError> {
    raw.map_or(Ok(Sport::TennisIndoor), str::parse)
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "court-sync",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn availability(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<ScheduleParams>,
) -> Result<Json<AvailabilityModel>, ApiError> {
    let sport = sport_param(params.sport.as_deref())?;
    let display_name = params
        .display_name
        .as_deref()
        .or(state.availability.config().display_name.as_deref());
    let model = state
        .availability
        .availability(sport, params.d.as_deref(), display_name)
        .await?;
    Ok(Json(model))
}

async fn sync(
    Extension(state): Extension<Arc<AppState>>,
    body: Result<Json<ScheduleParams>, JsonRejection>,
) -> Result<Json<SyncResponse>, ApiError> {
    let Json(body) = body?;
    let sport = sport_param(body.sport.as_deref())?;
    let display_name = body
        .display_name
        .as_deref()
        .or(state.availability.config().display_name.as_deref());
    let outcome = state
        .sync
        .sync(
            &state.availability,
            sport,
            body.d.as_deref(),
            display_name,
            Local::now().fixed_offset(),
        )
        .await?;
    let message = (outcome.total == 0).then_some("No bookings found for your name on this day");
    Ok(Json(SyncResponse { outcome, message }))
}

async fn bookings(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<BookingRecord>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/availability", get(availability))
        .route("/api/sync", post(sync))
        .route("/api/bookings", get(bookings))
        .layer(Extension(state))
        .layer(cors)
}

pub async fn serve(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP API listening on http://{}", addr);
    Server::bind(&addr).serve(router(state).into_make_service()).await?;
    Ok(())
}
