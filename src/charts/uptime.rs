use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::charts::{opt_to_string, ChartContext, ChartExport, ChartMeta, LegendEntry};
use crate::store::{StreamKind, StreamState};
use crate::timeline::{align, Alignment, Fill, Sample, Slot, SLOT_SECONDS};

pub const PRODUCTIVE_COLOR: &str = "#4CAF50";
pub const IDLE_COLOR: &str = "#FFFF00";
pub const NO_DATA_COLOR: &str = "#FF0000";

/// Controller run code for a productive machine.
pub const RUN_PRODUCTIVE: u8 = 3;
/// Controller run code for an idle machine.
pub const RUN_IDLE: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Productive,
    Idle,
    NoData,
}

impl RunState {
    #[must_use]
    pub fn from_run(run: Option<u8>) -> Self {
        match run {
            Some(RUN_PRODUCTIVE) => Self::Productive,
            Some(RUN_IDLE) => Self::Idle,
            _ => Self::NoData,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Productive => "Productive",
            Self::Idle => "Idle",
            Self::NoData => "No Data",
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Productive => PRODUCTIVE_COLOR,
            Self::Idle => IDLE_COLOR,
            Self::NoData => NO_DATA_COLOR,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UptimeBar {
    pub time: DateTime<Utc>,
    pub run: Option<u8>,
    pub state: RunState,
    pub color: String,
    pub tooltip: String,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct UptimeSummary {
    pub productive_seconds: u64,
    pub idle_seconds: u64,
}

/// Idle time accumulated within one clock hour of the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IdleTrendPoint {
    pub hour: DateTime<Utc>,
    pub idle_seconds: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UptimeChart {
    #[serde(flatten)]
    pub meta: ChartMeta,
    pub bars: Vec<UptimeBar>,
    pub summary: UptimeSummary,
    pub idle_trend: Vec<IdleTrendPoint>,
}

/// Align run samples: unmatched minutes stay empty.
pub fn align_uptime(
    grid: &[DateTime<Utc>],
    samples: &[Sample<u8>],
    tolerance: Duration,
) -> Vec<Slot<u8>> {
    align(grid, samples, &Alignment::new(tolerance, Fill::Empty))
}

pub fn render(
    ctx: &ChartContext<'_>,
    state: &StreamState<Sample<u8>>,
    tolerance: Duration,
) -> UptimeChart {
    let series = align_uptime(&ctx.grid(), &state.data, tolerance);

    let legend = [RunState::Productive, RunState::Idle, RunState::NoData]
        .into_iter()
        .map(|s| LegendEntry::new(s.label(), s.color()))
        .collect();
    let meta = ChartMeta::new(ctx, StreamKind::Uptime, state, &series, legend);

    let bars = series
        .iter()
        .map(|slot| {
            let run_state = RunState::from_run(slot.value);
            UptimeBar {
                time: slot.time,
                run: slot.value,
                state: run_state,
                color: run_state.color().to_string(),
                tooltip: format!(
                    "{} at {}",
                    run_state.label(),
                    ctx.format_time(slot.time, "%H:%M:%S")
                ),
                matched: slot.matched,
            }
        })
        .collect();

    UptimeChart {
        meta,
        bars,
        summary: summarize(&series),
        idle_trend: idle_trend(&series),
    }
}

/// Each productive or idle minute counts as a full slot.
#[must_use]
pub fn summarize(series: &[Slot<u8>]) -> UptimeSummary {
    let slot_seconds = SLOT_SECONDS.unsigned_abs();
    series
        .iter()
        .fold(UptimeSummary::default(), |mut summary, slot| {
            match RunState::from_run(slot.value) {
                RunState::Productive => summary.productive_seconds += slot_seconds,
                RunState::Idle => summary.idle_seconds += slot_seconds,
                RunState::NoData => {}
            }
            summary
        })
}

/// Idle seconds per clock hour (UTC), in ascending hour order.
#[must_use]
pub fn idle_trend(series: &[Slot<u8>]) -> Vec<IdleTrendPoint> {
    let slot_seconds = SLOT_SECONDS.unsigned_abs();
    let mut trend: Vec<IdleTrendPoint> = Vec::new();

    for slot in series {
        let hour = slot
            .time
            .duration_trunc(Duration::hours(1))
            .unwrap_or(slot.time);
        let idle = if RunState::from_run(slot.value) == RunState::Idle {
            slot_seconds
        } else {
            0
        };

        match trend.last_mut() {
            Some(point) if point.hour == hour => point.idle_seconds += idle,
            _ => trend.push(IdleTrendPoint {
                hour,
                idle_seconds: idle,
            }),
        }
    }
    trend
}

impl ChartExport for UptimeChart {
    type Bar = UptimeBar;

    fn bars(&self) -> &[UptimeBar] {
        &self.bars
    }

    fn columns() -> &'static [&'static str] {
        &["time", "run", "state", "color", "matched"]
    }

    fn row(bar: &UptimeBar) -> Vec<String> {
        vec![
            bar.time.to_rfc3339(),
            opt_to_string(bar.run.as_ref()),
            bar.state.label().to_string(),
            bar.color.clone(),
            bar.matched.to_string(),
        ]
    }
}
