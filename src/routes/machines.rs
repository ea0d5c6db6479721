use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::charts::HoverPosition;
use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::store::{StreamKind, StreamMap, StreamStatus};

#[derive(Debug, Serialize, ToSchema)]
pub struct MachineResponse {
    pub name: String,
    /// Selected look-back window in hours
    pub hours: u32,
    pub max_hours: u32,
    pub hover: Option<HoverPosition>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StreamStatusResponse {
    pub stream: StreamKind,
    pub status: StreamStatus,
    pub message: String,
    pub generation: u64,
    /// Hours the current data was fetched for (null before the first fetch)
    pub hours: Option<u32>,
    pub samples: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectionRequest {
    pub hours: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SelectionResponse {
    pub machine: String,
    pub hours: u32,
    /// False when the requested hours were already selected
    pub changed: bool,
}

fn ensure_machine(state: &AppState, machine: &str) -> AppResult<()> {
    if state.selections.contains(machine) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Machine '{machine}' not found")))
    }
}

fn stream_status<T>(map: &StreamMap<T>, machine: &str) -> StreamStatusResponse {
    let snapshot = map.snapshot_or_default(machine);
    StreamStatusResponse {
        stream: map.kind(),
        status: snapshot.status,
        message: snapshot.message,
        generation: snapshot.generation,
        hours: snapshot.hours,
        samples: snapshot.data.len(),
        updated_at: snapshot.updated_at,
    }
}

/// List configured machines
#[utoipa::path(
    get,
    path = "/api/machines",
    responses(
        (status = 200, description = "Machines retrieved successfully", body = Vec<MachineResponse>),
    ),
    tag = "machines"
)]
pub async fn list_machines(State(state): State<AppState>) -> Json<Vec<MachineResponse>> {
    let max_hours = state.selections.max_hours();
    let machines = state
        .selections
        .machines()
        .map(|name| MachineResponse {
            name: name.to_string(),
            hours: state.selections.hours(name).unwrap_or(state.config.default_hours),
            max_hours,
            hover: state.hover.current(name),
        })
        .collect();

    Json(machines)
}

/// Fetch status of every stream of a machine
#[utoipa::path(
    get,
    path = "/api/machines/{machine}/streams",
    params(
        ("machine" = String, Path, description = "Machine name"),
    ),
    responses(
        (status = 200, description = "Stream states retrieved successfully", body = Vec<StreamStatusResponse>),
        (status = 404, description = "Machine not found"),
    ),
    tag = "machines"
)]
pub async fn list_streams(
    State(state): State<AppState>,
    Path(machine): Path<String>,
) -> AppResult<Json<Vec<StreamStatusResponse>>> {
    ensure_machine(&state, &machine)?;

    let streams = StreamKind::ALL
        .into_iter()
        .map(|kind| match kind {
            StreamKind::Uptime => stream_status(&state.streams.uptime, &machine),
            StreamKind::Feed => stream_status(&state.streams.feed, &machine),
            StreamKind::PartTimeline => stream_status(&state.streams.part_timeline, &machine),
        })
        .collect();

    Ok(Json(streams))
}

/// Change the look-back window of a machine
///
/// A changed selection makes the machine's poller refresh all streams
/// immediately.
#[utoipa::path(
    put,
    path = "/api/machines/{machine}/selection",
    params(
        ("machine" = String, Path, description = "Machine name"),
    ),
    request_body = SelectionRequest,
    responses(
        (status = 200, description = "Selection applied", body = SelectionResponse),
        (status = 400, description = "Hours out of range"),
        (status = 404, description = "Machine not found"),
    ),
    tag = "machines"
)]
pub async fn update_selection(
    State(state): State<AppState>,
    Path(machine): Path<String>,
    Json(request): Json<SelectionRequest>,
) -> AppResult<Json<SelectionResponse>> {
    let changed = state.selections.set_hours(&machine, request.hours)?;

    Ok(Json(SelectionResponse {
        machine,
        hours: request.hours,
        changed,
    }))
}
