//! Chart presentation models.
//!
//! Each stream is turned into a list of bars, one per grid minute, with the
//! color, tooltip text and legend the dashboard draws. The browser never
//! needs to know the category rules.

pub mod feed;
pub mod hover;
pub mod part_timeline;
pub mod uptime;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::store::{StreamKind, StreamState, StreamStatus};
use crate::timeline::{placeholder_grid, Slot};

pub use hover::{slot_index_at, HoverHub, HoverPosition};

/// Shown instead of bars when no minute of the window has data.
pub const NO_DATA_PLACEHOLDER: &str = "Data is not available for this time period.";

/// Number of x-axis ticks shared by sibling charts.
const TICK_COUNT: usize = 6;

/// Window and display settings for one rendering.
#[derive(Debug, Clone)]
pub struct ChartContext<'a> {
    pub machine: &'a str,
    pub hours: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub offset: FixedOffset,
    /// Shared hover position published by any chart of the machine
    pub hover: Option<DateTime<Utc>>,
}

impl ChartContext<'_> {
    #[must_use]
    pub fn grid(&self) -> Vec<DateTime<Utc>> {
        placeholder_grid(self.start, self.end)
    }

    #[must_use]
    pub fn format_time(&self, time: DateTime<Utc>, pattern: &str) -> String {
        time.with_timezone(&self.offset).format(pattern).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
        }
    }
}

/// Fields shared by every chart response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChartMeta {
    pub machine: String,
    pub stream: StreamKind,
    pub hours: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: StreamStatus,
    /// Store message (empty, "no data" or fetch error)
    pub message: String,
    /// Generation of the fetch the bars were built from
    pub generation: u64,
    /// Set when the chart should show a placeholder instead of bars
    pub placeholder: Option<String>,
    /// Shared x-axis tick positions
    pub ticks: Vec<DateTime<Utc>>,
    pub legend: Vec<LegendEntry>,
    /// Column highlighted by the shared hover position, if any
    pub active_index: Option<usize>,
}

impl ChartMeta {
    pub fn new<T, V>(
        ctx: &ChartContext<'_>,
        stream: StreamKind,
        state: &StreamState<T>,
        series: &[Slot<V>],
        legend: Vec<LegendEntry>,
    ) -> Self {
        let has_data = series.iter().any(|slot| slot.matched);
        let active_index = ctx.hover.and_then(|time| {
            let times: Vec<DateTime<Utc>> = series.iter().map(|slot| slot.time).collect();
            slot_index_at(&times, time)
        });
        Self {
            machine: ctx.machine.to_string(),
            stream,
            hours: ctx.hours,
            start: ctx.start,
            end: ctx.end,
            status: state.status,
            message: state.message.clone(),
            generation: state.generation,
            placeholder: (!has_data).then(|| NO_DATA_PLACEHOLDER.to_string()),
            ticks: time_ticks(series),
            legend,
            active_index,
        }
    }
}

/// Evenly spaced tick positions taken from the series itself, so every chart
/// over the same window gets identical ticks.
#[must_use]
pub fn time_ticks<V>(series: &[Slot<V>]) -> Vec<DateTime<Utc>> {
    if series.is_empty() {
        return Vec::new();
    }
    let every = (series.len() / TICK_COUNT).max(1);
    series.iter().step_by(every).map(|slot| slot.time).collect()
}

/// Flat export of a chart for CSV and NDJSON responses.
pub trait ChartExport {
    type Bar: Serialize;

    fn bars(&self) -> &[Self::Bar];

    fn columns() -> &'static [&'static str];

    fn row(bar: &Self::Bar) -> Vec<String>;
}

pub(crate) fn opt_to_string<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}
