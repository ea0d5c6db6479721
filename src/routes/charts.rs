use axum::{
    extract::{Path, Query, State},
    http::header::{self, HeaderMap, HeaderValue},
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use utoipa::IntoParams;

use crate::charts::{feed, part_timeline, uptime, ChartContext, ChartExport};
use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::store::{StreamKind, StreamStatus};
use crate::timeline::window;

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Ndjson,
}

impl ExportFormat {
    fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Ndjson => "ndjson",
        }
    }
}

/// Resolve the response format. The query parameter takes precedence over
/// the `Accept` header.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for unknown formats.
pub fn determine_format(query_format: &str, headers: &HeaderMap) -> AppResult<ExportFormat> {
    match query_format.to_lowercase().as_str() {
        "json" => {}
        "csv" => return Ok(ExportFormat::Csv),
        "ndjson" => return Ok(ExportFormat::Ndjson),
        other => {
            return Err(AppError::BadRequest(format!(
                "Unsupported format '{other}', expected json, csv or ndjson"
            )));
        }
    }

    if let Some(accept) = headers.get(header::ACCEPT)
        && let Ok(accept_str) = accept.to_str()
    {
        if accept_str.contains("application/x-ndjson") {
            return Ok(ExportFormat::Ndjson);
        }
        if accept_str.contains("text/csv") {
            return Ok(ExportFormat::Csv);
        }
    }

    Ok(ExportFormat::Json)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ChartQuery {
    /// Response format: json (default), ndjson, csv
    #[serde(default = "default_format")]
    pub format: String,
}

fn build_csv_response<C: ChartExport>(chart: &C) -> AppResult<Response> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(C::columns())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    for bar in chart.bars() {
        writer
            .write_record(C::row(bar))
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"))
        .body(axum::body::Body::from(body))
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn build_ndjson_response<C: ChartExport>(chart: &C) -> AppResult<Response> {
    let lines = chart
        .bars()
        .iter()
        .map(|bar| serde_json::to_string(bar).map(|line| format!("{line}\n")))
        .collect::<Result<Vec<String>, _>>()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let (tx, rx) = tokio::sync::mpsc::channel::<Result<String, std::io::Error>>(100);
    tokio::spawn(async move {
        for line in lines {
            if tx.send(Ok(line)).await.is_err() {
                break;
            }
        }
    });

    let stream = ReceiverStream::new(rx);
    let body = axum::body::Body::from_stream(stream);

    Response::builder()
        .header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-ndjson"),
        )
        .body(body)
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Serve a chart in the requested format, using the JSON cache when the
/// stream has not advanced since the cached rendering.
async fn respond<C, F>(
    state: &AppState,
    format: ExportFormat,
    cache_key: String,
    generation: u64,
    render: F,
) -> AppResult<Response>
where
    C: ChartExport + Serialize,
    F: FnOnce() -> C,
{
    use super::cache;

    if format == ExportFormat::Json
        && let Some(cached) = cache::get_cached(state, &cache_key, generation).await
    {
        return cache::json_response((*cached).clone(), true);
    }

    let chart = render();
    match format {
        ExportFormat::Csv => build_csv_response(&chart),
        ExportFormat::Ndjson => build_ndjson_response(&chart),
        ExportFormat::Json => cache::cache_and_respond(state, cache_key, &chart, generation).await,
    }
}

/// Window, alignment settings and cache key shared by the chart handlers.
struct ChartRequest {
    machine: String,
    hours: u32,
    format: ExportFormat,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    hover: Option<DateTime<Utc>>,
    tolerance: Duration,
}

impl ChartRequest {
    fn new(
        state: &AppState,
        machine: String,
        query: &ChartQuery,
        headers: &HeaderMap,
    ) -> AppResult<Self> {
        let hours = state
            .selections
            .hours(&machine)
            .ok_or_else(|| AppError::NotFound(format!("Machine '{machine}' not found")))?;
        let format = determine_format(&query.format, headers)?;
        let (start, end) = window(Utc::now(), hours);
        let hover = state.hover.current(&machine).map(|position| position.time);

        Ok(Self {
            machine,
            hours,
            format,
            start,
            end,
            hover,
            tolerance: Duration::seconds(state.config.align_tolerance_seconds),
        })
    }

    fn context(&self, state: &AppState) -> ChartContext<'_> {
        ChartContext {
            machine: &self.machine,
            hours: self.hours,
            start: self.start,
            end: self.end,
            offset: state.config.display_offset,
            hover: self.hover,
        }
    }

    /// The status is part of the key: `begin` flips a stream to loading
    /// without issuing a new data generation.
    fn cache_key(&self, stream: StreamKind, status: StreamStatus) -> String {
        super::cache::cache_key(
            "chart",
            &[
                &self.machine,
                stream.as_str(),
                status.as_str(),
                &self.hours.to_string(),
                &self.end.to_rfc3339(),
                &self.hover.map(|t| t.to_rfc3339()).unwrap_or_default(),
                self.format.as_str(),
            ],
        )
    }
}

/// Get the machine uptime chart
///
/// One bar per minute of the selected window colored by run state, with a
/// productive/idle summary and an hourly idle-time trend. Supports JSON,
/// CSV, and NDJSON formats.
#[utoipa::path(
    get,
    path = "/api/machines/{machine}/charts/uptime",
    params(
        ("machine" = String, Path, description = "Machine name"),
        ChartQuery
    ),
    responses(
        (status = 200, description = "Chart rendered successfully", body = uptime::UptimeChart),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Machine not found"),
    ),
    tag = "charts"
)]
pub async fn get_uptime_chart(
    State(state): State<AppState>,
    Path(machine): Path<String>,
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let request = ChartRequest::new(&state, machine, &query, &headers)?;
    let snapshot = state.streams.uptime.snapshot_or_default(&request.machine);
    let ctx = request.context(&state);

    respond(
        &state,
        request.format,
        request.cache_key(StreamKind::Uptime, snapshot.status),
        snapshot.generation,
        || uptime::render(&ctx, &snapshot, request.tolerance),
    )
    .await
}

/// Get the feed-speed chart
///
/// Gaps between feed samples carry the last known speed forward. Supports
/// JSON, CSV, and NDJSON formats.
#[utoipa::path(
    get,
    path = "/api/machines/{machine}/charts/feed",
    params(
        ("machine" = String, Path, description = "Machine name"),
        ChartQuery
    ),
    responses(
        (status = 200, description = "Chart rendered successfully", body = feed::FeedChart),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Machine not found"),
    ),
    tag = "charts"
)]
pub async fn get_feed_chart(
    State(state): State<AppState>,
    Path(machine): Path<String>,
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let request = ChartRequest::new(&state, machine, &query, &headers)?;
    let snapshot = state.streams.feed.snapshot_or_default(&request.machine);
    let ctx = request.context(&state);

    respond(
        &state,
        request.format,
        request.cache_key(StreamKind::Feed, snapshot.status),
        snapshot.generation,
        || feed::render(&ctx, &snapshot, request.tolerance),
    )
    .await
}

/// Get the part/program timeline chart
///
/// Minutes without an observation show the `UNAVAILABLE` program. The
/// legend lists program names in first-seen order. Supports JSON, CSV, and
/// NDJSON formats.
#[utoipa::path(
    get,
    path = "/api/machines/{machine}/charts/part-timeline",
    params(
        ("machine" = String, Path, description = "Machine name"),
        ChartQuery
    ),
    responses(
        (status = 200, description = "Chart rendered successfully", body = part_timeline::PartTimelineChart),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Machine not found"),
    ),
    tag = "charts"
)]
pub async fn get_part_timeline_chart(
    State(state): State<AppState>,
    Path(machine): Path<String>,
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let request = ChartRequest::new(&state, machine, &query, &headers)?;
    let snapshot = state.streams.part_timeline.snapshot_or_default(&request.machine);
    let ctx = request.context(&state);

    respond(
        &state,
        request.format,
        request.cache_key(StreamKind::PartTimeline, snapshot.status),
        snapshot.generation,
        || part_timeline::render(&ctx, &snapshot, request.tolerance),
    )
    .await
}
