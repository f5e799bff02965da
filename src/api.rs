use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::api_error::{ApiError, ErrorResponse};
use crate::fetcher::KmaSnowFetcher;
use crate::models::{self, ResultRow, Station};
use crate::render::{self, PageView};
use crate::services::SnowService;

/// Value of the `station` parameter that selects every configured station
pub const ALL_STATIONS: &str = "all";

#[derive(Clone)]
pub struct AppState {
    pub snow_service: SnowService<KmaSnowFetcher>,
    pub stations: Arc<Vec<Station>>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SnowQuery {
    /// Calendar day as YYYYMMDD
    pub date: Option<String>,
    /// Station code, or "all" (default)
    pub station: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, get_stations, get_snow),
    components(schemas(HealthResponse, ErrorResponse, ResultRow, Station)),
    tags((name = "snow", description = "Hourly snow depth readings"))
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/stations", get(get_stations))
        .route("/snow", get(get_snow))
        .with_state(state.clone());

    Router::new()
        .route("/", get(snow_page))
        .with_state(state)
        .nest("/api/v1", api_routes)
}

/// Resolve the `station` parameter against the configured stations
pub fn select_stations(stations: &[Station], key: Option<&str>) -> Result<Vec<Station>, ApiError> {
    match key.map(str::trim) {
        None | Some("") | Some(ALL_STATIONS) => Ok(stations.to_vec()),
        Some(code) => stations
            .iter()
            .find(|s| s.code == code)
            .map(|s| vec![s.clone()])
            .ok_or_else(|| ApiError::UnknownStation(code.to_string())),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ApiError> {
    models::parse_query_date(value).ok_or_else(|| ApiError::InvalidDate(value.to_string()))
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "snow",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/stations",
    tag = "snow",
    responses((status = 200, description = "Configured stations", body = [Station]))
)]
#[instrument(skip(state))]
async fn get_stations(State(state): State<AppState>) -> Json<Vec<Station>> {
    Json(state.stations.as_ref().clone())
}

#[utoipa::path(
    get,
    path = "/api/v1/snow",
    tag = "snow",
    params(SnowQuery),
    responses(
        (status = 200, description = "Rows grouped by station, hours ascending; empty when no data", body = [ResultRow]),
        (status = 400, description = "Missing or malformed parameter", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
async fn get_snow(
    State(state): State<AppState>,
    Query(params): Query<SnowQuery>,
) -> Result<Json<Vec<ResultRow>>, ApiError> {
    let raw_date = params.date.as_deref().ok_or_else(|| {
        warn!("Snow request without date");
        ApiError::MissingParameter("date")
    })?;
    let date = parse_date(raw_date).inspect_err(|e| warn!("Rejected snow request: {}", e))?;
    let stations = select_stations(&state.stations, params.station.as_deref())
        .inspect_err(|e| warn!("Rejected snow request: {}", e))?;

    debug!("Fetching snow readings for {} at {} stations", date, stations.len());
    let rows = state
        .snow_service
        .aggregate(date, &stations)
        .await
        .unwrap_or_default();

    info!("Returning {} snow rows for {}", rows.len(), date);
    Ok(Json(rows))
}

#[instrument(skip(state))]
async fn snow_page(
    State(state): State<AppState>,
    Query(params): Query<SnowQuery>,
) -> impl IntoResponse {
    let today = state.snow_service.today().format("%Y%m%d").to_string();
    let raw_date = params
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(today.as_str());
    let selected = params
        .station
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ALL_STATIONS);

    let request = parse_date(raw_date).and_then(|date| {
        select_stations(&state.stations, selected).map(|stations| (date, stations))
    });

    let (status, rows, error) = match request {
        Ok((date, stations)) => {
            let rows = state.snow_service.aggregate(date, &stations).await;
            (StatusCode::OK, rows, None)
        }
        Err(e) => {
            warn!("Rejected page request: {}", e);
            (e.status(), None, Some(e.to_string()))
        }
    };

    let html = render::render_page(&PageView {
        date: raw_date,
        stations: state.stations.as_slice(),
        selected,
        rows: rows.as_deref(),
        error: error.as_deref(),
    });
    (status, Html(html))
}
