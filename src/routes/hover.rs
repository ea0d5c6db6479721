use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::{wrappers::WatchStream, StreamExt};
use utoipa::ToSchema;

use crate::charts::{slot_index_at, HoverPosition};
use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::store::StreamKind;
use crate::timeline::{placeholder_grid, window, SLOT_SECONDS};

/// Hover update from a chart: either the hovered time or the column index
/// within the machine's current window.
#[derive(Debug, Deserialize, ToSchema)]
pub struct HoverRequest {
    pub time: Option<DateTime<Utc>>,
    pub index: Option<usize>,
    pub source: Option<StreamKind>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HoverResponse {
    pub machine: String,
    pub position: Option<HoverPosition>,
    /// Column to highlight in every chart of the current window
    pub index: Option<usize>,
}

fn hover_response(state: &AppState, machine: String, hours: u32) -> HoverResponse {
    let position = state.hover.current(&machine);
    let index = position.and_then(|p| {
        let (start, end) = window(Utc::now(), hours);
        slot_index_at(&placeholder_grid(start, end), p.time)
    });
    HoverResponse {
        machine,
        position,
        index,
    }
}

fn selected_hours(state: &AppState, machine: &str) -> AppResult<u32> {
    state
        .selections
        .hours(machine)
        .ok_or_else(|| AppError::NotFound(format!("Machine '{machine}' not found")))
}

/// Current shared hover position of a machine dashboard
#[utoipa::path(
    get,
    path = "/api/machines/{machine}/hover",
    params(
        ("machine" = String, Path, description = "Machine name"),
    ),
    responses(
        (status = 200, description = "Hover position retrieved", body = HoverResponse),
        (status = 404, description = "Machine not found"),
    ),
    tag = "hover"
)]
pub async fn get_hover(
    State(state): State<AppState>,
    Path(machine): Path<String>,
) -> AppResult<Json<HoverResponse>> {
    let hours = selected_hours(&state, &machine)?;
    Ok(Json(hover_response(&state, machine, hours)))
}

/// Publish the hovered column so sibling charts highlight it
#[utoipa::path(
    put,
    path = "/api/machines/{machine}/hover",
    params(
        ("machine" = String, Path, description = "Machine name"),
    ),
    request_body = HoverRequest,
    responses(
        (status = 200, description = "Hover position published", body = HoverResponse),
        (status = 400, description = "Neither time nor a valid index given"),
        (status = 404, description = "Machine not found"),
    ),
    tag = "hover"
)]
pub async fn publish_hover(
    State(state): State<AppState>,
    Path(machine): Path<String>,
    Json(request): Json<HoverRequest>,
) -> AppResult<Json<HoverResponse>> {
    let hours = selected_hours(&state, &machine)?;

    let time = match (request.time, request.index) {
        (Some(time), _) => time,
        (None, Some(index)) => {
            let (start, end) = window(Utc::now(), hours);
            let offset = i64::try_from(index)
                .ok()
                .and_then(|i| i.checked_mul(SLOT_SECONDS))
                .map(Duration::seconds)
                .filter(|offset| start + *offset <= end)
                .ok_or_else(|| {
                    AppError::BadRequest(format!("index {index} is outside the current window"))
                })?;
            start + offset
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "either time or index is required".to_string(),
            ));
        }
    };

    state.hover.publish(
        &machine,
        HoverPosition {
            time,
            source: request.source,
        },
    );

    Ok(Json(hover_response(&state, machine, hours)))
}

/// Clear the shared hover position (pointer left the charts)
#[utoipa::path(
    delete,
    path = "/api/machines/{machine}/hover",
    params(
        ("machine" = String, Path, description = "Machine name"),
    ),
    responses(
        (status = 204, description = "Hover position cleared"),
        (status = 404, description = "Machine not found"),
    ),
    tag = "hover"
)]
pub async fn clear_hover(
    State(state): State<AppState>,
    Path(machine): Path<String>,
) -> AppResult<StatusCode> {
    if state.hover.clear(&machine) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Machine '{machine}' not found")))
    }
}

/// Stream hover changes as Server-Sent Events
///
/// Emits the current position on connect and then every change. Each event
/// is named `hover` and carries a `HoverPosition` or `null`.
#[utoipa::path(
    get,
    path = "/api/machines/{machine}/hover/events",
    params(
        ("machine" = String, Path, description = "Machine name"),
    ),
    responses(
        (status = 200, description = "Event stream", body = String, content_type = "text/event-stream"),
        (status = 404, description = "Machine not found"),
    ),
    tag = "hover"
)]
pub async fn hover_events(
    State(state): State<AppState>,
    Path(machine): Path<String>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let rx = state
        .hover
        .subscribe(&machine)
        .ok_or_else(|| AppError::NotFound(format!("Machine '{machine}' not found")))?;

    tracing::debug!(machine = %machine, "Hover subscriber connected");

    let events = WatchStream::new(rx).map(|position| Event::default().event("hover").json_data(position));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
