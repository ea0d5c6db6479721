use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::AppState;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    /// Report rows as returned upstream (empty on any upstream failure)
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<serde_json::Value>,
}

/// Proxy a generic report
///
/// Forwards `GET /v1/data/{option}/{date}` and returns the `data` rows.
/// Upstream failures and malformed envelopes produce an empty list rather
/// than an error. Non-empty results are cached until the TTL expires.
#[utoipa::path(
    get,
    path = "/api/reports/{option}/{date}",
    params(
        ("option" = String, Path, description = "Report selector"),
        ("date" = String, Path, description = "Report date as expected upstream"),
    ),
    responses(
        (status = 200, description = "Report rows", body = ReportResponse),
    ),
    tag = "reports"
)]
pub async fn get_report(
    State(state): State<AppState>,
    Path((option, date)): Path<(String, String)>,
) -> AppResult<Response> {
    use super::cache;

    if option.trim().is_empty() || date.trim().is_empty() {
        return Err(AppError::BadRequest("option and date are required".to_string()));
    }

    let cache_key = cache::cache_key("report", &[&option, &date]);
    if let Some(cached) = cache::get_cached(&state, &cache_key, 0).await {
        return cache::json_response((*cached).clone(), true);
    }

    let data = state.fanuc_client.get_report_data(&option, &date).await;
    let response = ReportResponse { data };

    if response.data.is_empty() {
        let body = serde_json::to_vec(&response).map_err(|e| AppError::Internal(e.to_string()))?;
        return cache::json_response(body, false);
    }

    cache::cache_and_respond(&state, cache_key, &response, 0).await
}
