use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::charts::{opt_to_string, ChartContext, ChartExport, ChartMeta, LegendEntry};
use crate::store::{StreamKind, StreamState};
use crate::timeline::{align, Alignment, Fill, Sample, Slot};

/// Upper bound (inclusive) of the low feed band.
pub const LOW_FEED_MAX: f64 = 75.0;
/// Upper bound (inclusive) of the mid feed band.
pub const MID_FEED_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeedBand {
    Low,
    Mid,
    High,
    NoData,
}

impl FeedBand {
    #[must_use]
    pub fn from_feed(feed: Option<f64>) -> Self {
        match feed {
            None => Self::NoData,
            Some(v) if v <= LOW_FEED_MAX => Self::Low,
            Some(v) if v <= MID_FEED_MAX => Self::Mid,
            Some(_) => Self::High,
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Low => "#FFFF00",
            Self::Mid => "#008000",
            Self::High => "#FF0000",
            Self::NoData => "#808080",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedBar {
    pub time: DateTime<Utc>,
    pub feed: Option<f64>,
    pub band: FeedBand,
    pub color: String,
    /// Empty for minutes without a value
    pub tooltip: Vec<String>,
    /// False for placeholders and carried-forward values
    pub matched: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedChart {
    #[serde(flatten)]
    pub meta: ChartMeta,
    pub bars: Vec<FeedBar>,
}

/// Align feed samples, carrying the last known speed across gaps.
pub fn align_feed(
    grid: &[DateTime<Utc>],
    samples: &[Sample<f64>],
    tolerance: Duration,
) -> Vec<Slot<f64>> {
    align(grid, samples, &Alignment::new(tolerance, Fill::CarryForward))
}

pub fn render(
    ctx: &ChartContext<'_>,
    state: &StreamState<Sample<f64>>,
    tolerance: Duration,
) -> FeedChart {
    let series = align_feed(&ctx.grid(), &state.data, tolerance);

    let legend = vec![
        LegendEntry::new("0", FeedBand::Low.color()),
        LegendEntry::new("100", FeedBand::Mid.color()),
        LegendEntry::new("> 100", FeedBand::High.color()),
    ];
    let meta = ChartMeta::new(ctx, StreamKind::Feed, state, &series, legend);

    let bars = series
        .iter()
        .map(|slot| {
            let band = FeedBand::from_feed(slot.value);
            let tooltip = slot
                .value
                .map(|speed| {
                    vec![
                        format!("Speed: {speed}"),
                        format!("Time: {}", ctx.format_time(slot.time, "%H:%M")),
                    ]
                })
                .unwrap_or_default();
            FeedBar {
                time: slot.time,
                feed: slot.value,
                band,
                color: band.color().to_string(),
                tooltip,
                matched: slot.matched,
            }
        })
        .collect();

    FeedChart { meta, bars }
}

impl ChartExport for FeedChart {
    type Bar = FeedBar;

    fn bars(&self) -> &[FeedBar] {
        &self.bars
    }

    fn columns() -> &'static [&'static str] {
        &["time", "feed", "band", "color", "matched"]
    }

    fn row(bar: &FeedBar) -> Vec<String> {
        let band = match bar.band {
            FeedBand::Low => "low",
            FeedBand::Mid => "mid",
            FeedBand::High => "high",
            FeedBand::NoData => "no_data",
        };
        vec![
            bar.time.to_rfc3339(),
            opt_to_string(bar.feed.as_ref()),
            band.to_string(),
            bar.color.clone(),
            bar.matched.to_string(),
        ]
    }
}
