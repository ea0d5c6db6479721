use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use serde::Serialize;
use utoipa::ToSchema;

use crate::charts::{ChartContext, ChartExport, ChartMeta, LegendEntry};
use crate::fanuc::models::Program;
use crate::store::{StreamKind, StreamState};
use crate::timeline::{align, Alignment, ColorMap, Fill, Sample, Slot};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartBar {
    pub time: DateTime<Utc>,
    pub name: String,
    pub comment: Option<String>,
    pub color: String,
    pub tooltip: Vec<String>,
    pub matched: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartTimelineChart {
    #[serde(flatten)]
    pub meta: ChartMeta,
    pub bars: Vec<PartBar>,
}

/// Align program observations. Minutes without an observation show the
/// `UNAVAILABLE` program, never a neighbour's.
pub fn align_part_timeline(
    grid: &[DateTime<Utc>],
    samples: &[Sample<Program>],
    tolerance: Duration,
) -> Vec<Slot<Program>> {
    align(
        grid,
        samples,
        &Alignment::new(tolerance, Fill::Sentinel(Program::unavailable())),
    )
}

/// Colors by program name, in the order the batch was received.
#[must_use]
pub fn color_map(samples: &[Sample<Program>]) -> ColorMap {
    ColorMap::build(
        samples
            .iter()
            .filter_map(|s| s.value.as_ref())
            .map(|program| program.name.as_str()),
    )
}

pub fn render(
    ctx: &ChartContext<'_>,
    state: &StreamState<Sample<Program>>,
    tolerance: Duration,
) -> PartTimelineChart {
    let colors = color_map(&state.data);
    let series = align_part_timeline(&ctx.grid(), &state.data, tolerance);

    // Colors are assigned per batch; the legend only lists programs with a bar
    let drawn: HashSet<&str> = series
        .iter()
        .filter(|slot| slot.matched)
        .filter_map(|slot| slot.value.as_ref())
        .map(|program| program.name.as_str())
        .collect();
    let legend = colors
        .entries()
        .filter(|(name, _)| drawn.contains(name))
        .map(|(name, color)| LegendEntry::new(name, color))
        .collect();
    let meta = ChartMeta::new(ctx, StreamKind::PartTimeline, state, &series, legend);

    let unavailable = Program::unavailable();
    let bars = series
        .iter()
        .map(|slot| {
            let program = slot.value.as_ref().unwrap_or(&unavailable);
            PartBar {
                time: slot.time,
                name: program.name.clone(),
                comment: program.comment.clone(),
                color: colors.color_of(&program.name).to_string(),
                tooltip: vec![
                    format!("Part-Name: {}", program.name),
                    format!("Date: {}", ctx.format_time(slot.time, "%d/%m/%Y")),
                    format!("Time: {}", ctx.format_time(slot.time, "%H:%M")),
                ],
                matched: slot.matched,
            }
        })
        .collect();

    PartTimelineChart { meta, bars }
}

impl ChartExport for PartTimelineChart {
    type Bar = PartBar;

    fn bars(&self) -> &[PartBar] {
        &self.bars
    }

    fn columns() -> &'static [&'static str] {
        &["time", "name", "comment", "color", "matched"]
    }

    fn row(bar: &PartBar) -> Vec<String> {
        vec![
            bar.time.to_rfc3339(),
            bar.name.clone(),
            bar.comment.clone().unwrap_or_default(),
            bar.color.clone(),
            bar.matched.to_string(),
        ]
    }
}
