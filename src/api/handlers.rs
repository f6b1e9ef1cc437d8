use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use utoipa::OpenApi;

use super::{
    dto::{ChartData, UtilizationDto},
    errors::AppError,
    AppState,
};
use crate::store::RecentReader;

const POPULARITY_PAGE: &str = include_str!("assets/popularity.html");
const NO_DATA_PAGE: &str = include_str!("assets/no_data.html");
const STYLE: &str = include_str!("assets/style.css");
const CHART_TEMPLATE: &str = include_str!("assets/chart.js");

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Dashboard page. Renders a placeholder until the first reading arrives.
pub async fn popularity_page<R: RecentReader>(
    State(state): State<AppState<R>>,
) -> Html<&'static str> {
    if state.recent.get().await.is_empty() {
        return Html(NO_DATA_PAGE);
    }
    Html(POPULARITY_PAGE)
}

/// Chart.js script with the recent readings embedded as JSON series.
pub async fn chart_script<R: RecentReader>(
    State(state): State<AppState<R>>,
) -> Result<impl IntoResponse, AppError> {
    let data = state.recent.get().await;
    let json = serde_json::to_string(&ChartData::from(data.as_slice()))?;
    let script = CHART_TEMPLATE.replace("{{DATA}}", &json);

    Ok(([(header::CONTENT_TYPE, "application/javascript")], script))
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], STYLE)
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

/// Recent utilization readings, oldest first. Empty until the first
/// reading is scraped or reloaded.
#[utoipa::path(
    get,
    path = "/api/utilization",
    responses(
        (status = 200, description = "Recent utilization readings", body = Vec<UtilizationDto>),
    ),
    tag = "utilization"
)]
pub async fn get_recent_utilization<R: RecentReader>(
    State(state): State<AppState<R>>,
) -> Json<Vec<UtilizationDto>> {
    let data = state.recent.get().await;
    Json(data.into_iter().map(Into::into).collect())
}

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(get_recent_utilization, health),
    components(schemas(UtilizationDto)),
    tags(
        (name = "utilization", description = "Gym utilization endpoints"),
        (name = "system",      description = "System endpoints"),
    ),
    info(
        title = "Sputnik Popularity API",
        version = "0.1.0",
        description = "Recent occupancy readings of the Sputnik gym"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
