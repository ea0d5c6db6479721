use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub machines: usize,
}

/// Health check endpoint
///
/// Returns 200 OK while the service is running; upstream availability is
/// reported per stream under `/api/machines/{machine}/streams`.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        machines: state.selections.machines().count(),
    })
}
