//! Chart presentation: colors, tooltips, summaries, legends, and hover.
//!
//! Run with: cargo test --test charts_test

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use std::sync::Arc;

use fanuc_dashboard::charts::feed::{self, FeedBand};
use fanuc_dashboard::charts::uptime::{self, RunState};
use fanuc_dashboard::charts::{
    part_timeline, slot_index_at, ChartContext, ChartExport, HoverHub, HoverPosition,
    NO_DATA_PLACEHOLDER,
};
use fanuc_dashboard::fanuc::models::{Program, UNAVAILABLE_PROGRAM};
use fanuc_dashboard::store::{StreamKind, StreamState, StreamStatus, NO_DATA_MESSAGE};
use fanuc_dashboard::timeline::{placeholder_grid, Sample, FALLBACK_COLOR, PALETTE};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

fn minute(m: i64) -> DateTime<Utc> {
    t0() + Duration::minutes(m)
}

fn ctx() -> ChartContext<'static> {
    ChartContext {
        machine: "m1",
        hours: 1,
        start: t0(),
        end: t0() + Duration::hours(1),
        offset: FixedOffset::east_opt(0).unwrap(),
        hover: None,
    }
}

fn state<T>(data: Vec<T>) -> StreamState<T> {
    StreamState {
        data: Arc::new(data),
        status: StreamStatus::Idle,
        generation: 1,
        hours: Some(1),
        ..StreamState::default()
    }
}

fn tol() -> Duration {
    Duration::seconds(30)
}

#[test]
fn run_states_map_to_fixed_colors() {
    assert_eq!(RunState::from_run(Some(3)), RunState::Productive);
    assert_eq!(RunState::from_run(Some(0)), RunState::Idle);
    assert_eq!(RunState::from_run(Some(1)), RunState::NoData);
    assert_eq!(RunState::from_run(None), RunState::NoData);

    assert_eq!(RunState::Productive.color(), "#4CAF50");
    assert_eq!(RunState::Idle.color(), "#FFFF00");
    assert_eq!(RunState::NoData.color(), "#FF0000");
}

#[test]
fn uptime_chart_has_one_bar_per_minute() {
    let samples = vec![
        Sample::new(minute(5), Some(3u8)),
        Sample::new(minute(6) + Duration::seconds(10), Some(0)),
    ];
    let chart = uptime::render(&ctx(), &state(samples), tol());

    assert_eq!(chart.bars.len(), 61);
    assert_eq!(chart.meta.stream, StreamKind::Uptime);
    assert!(chart.meta.placeholder.is_none());

    let productive = &chart.bars[5];
    assert_eq!(productive.state, RunState::Productive);
    assert_eq!(productive.color, "#4CAF50");
    assert_eq!(productive.tooltip, "Productive at 10:05:00");
    assert!(productive.matched);

    assert_eq!(chart.bars[6].state, RunState::Idle);
    assert_eq!(chart.bars[7].state, RunState::NoData);
    assert_eq!(chart.bars[7].color, "#FF0000");
    assert!(!chart.bars[7].matched);

    let labels: Vec<&str> = chart.meta.legend.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(labels, vec!["Productive", "Idle", "No Data"]);
}

#[test]
fn tooltips_use_display_offset() {
    let mut ctx = ctx();
    ctx.offset = FixedOffset::east_opt(2 * 3600).unwrap();
    let chart = uptime::render(&ctx, &state(vec![Sample::new(minute(5), Some(3u8))]), tol());
    assert_eq!(chart.bars[5].tooltip, "Productive at 12:05:00");
}

#[test]
fn uptime_summary_counts_full_minutes() {
    let samples: Vec<Sample<u8>> = (0..3)
        .map(|m| Sample::new(minute(m), Some(3)))
        .chain((10..12).map(|m| Sample::new(minute(m), Some(0))))
        .collect();
    let series = uptime::align_uptime(&placeholder_grid(t0(), minute(60)), &samples, tol());
    let summary = uptime::summarize(&series);
    assert_eq!(summary.productive_seconds, 180);
    assert_eq!(summary.idle_seconds, 120);
}

#[test]
fn idle_trend_buckets_by_clock_hour() {
    let start = minute(30);
    let end = minute(90);
    let samples = vec![
        Sample::new(minute(45), Some(0u8)),
        Sample::new(minute(50), Some(3)),
        Sample::new(minute(70), Some(0)),
        Sample::new(minute(71), Some(0)),
    ];
    let series = uptime::align_uptime(&placeholder_grid(start, end), &samples, tol());
    let trend = uptime::idle_trend(&series);

    assert_eq!(trend.len(), 2);
    assert_eq!(trend[0].hour, t0());
    assert_eq!(trend[0].idle_seconds, 60);
    assert_eq!(trend[1].hour, minute(60));
    assert_eq!(trend[1].idle_seconds, 120);
}

#[test]
fn empty_stream_renders_placeholder() {
    let mut empty = state(Vec::<Sample<u8>>::new());
    empty.message = NO_DATA_MESSAGE.to_string();
    let chart = uptime::render(&ctx(), &empty, tol());

    assert_eq!(chart.bars.len(), 61);
    assert_eq!(chart.meta.placeholder.as_deref(), Some(NO_DATA_PLACEHOLDER));
    assert_eq!(chart.meta.message, NO_DATA_MESSAGE);
    assert_eq!(chart.summary.productive_seconds, 0);

    // Samples entirely outside the window also leave nothing to draw
    let outside = state(vec![Sample::new(minute(-120), Some(3u8))]);
    let chart = uptime::render(&ctx(), &outside, tol());
    assert!(chart.meta.placeholder.is_some());
}

#[test]
fn feed_bands_split_at_75_and_100() {
    assert_eq!(FeedBand::from_feed(Some(0.0)), FeedBand::Low);
    assert_eq!(FeedBand::from_feed(Some(75.0)), FeedBand::Low);
    assert_eq!(FeedBand::from_feed(Some(75.5)), FeedBand::Mid);
    assert_eq!(FeedBand::from_feed(Some(100.0)), FeedBand::Mid);
    assert_eq!(FeedBand::from_feed(Some(100.1)), FeedBand::High);
    assert_eq!(FeedBand::from_feed(None), FeedBand::NoData);

    assert_eq!(FeedBand::Low.color(), "#FFFF00");
    assert_eq!(FeedBand::Mid.color(), "#008000");
    assert_eq!(FeedBand::High.color(), "#FF0000");
}

#[test]
fn feed_chart_carries_speed_across_gaps() {
    let samples = vec![
        Sample::new(minute(2), Some(80.0)),
        Sample::new(minute(5), Some(120.0)),
    ];
    let chart = feed::render(&ctx(), &state(samples), tol());

    assert_eq!(chart.bars[0].feed, None);
    assert_eq!(chart.bars[0].band, FeedBand::NoData);
    assert!(chart.bars[0].tooltip.is_empty());

    assert_eq!(chart.bars[2].feed, Some(80.0));
    assert_eq!(chart.bars[2].tooltip, vec!["Speed: 80", "Time: 10:02"]);
    assert_eq!(chart.bars[3].feed, Some(80.0));
    assert!(!chart.bars[3].matched);
    assert_eq!(chart.bars[3].band, FeedBand::Mid);

    assert_eq!(chart.bars[60].feed, Some(120.0));
    assert_eq!(chart.bars[60].band, FeedBand::High);

    let labels: Vec<&str> = chart.meta.legend.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(labels, vec!["0", "100", "> 100"]);
}

fn program(name: &str) -> Program {
    Program {
        name: name.to_string(),
        comment: Some(format!("{name} comment")),
    }
}

#[test]
fn part_timeline_fills_gaps_with_unavailable() {
    let samples = vec![
        Sample::new(minute(1), Some(program("O100"))),
        Sample::new(minute(3), Some(program("O200"))),
        Sample::new(minute(4), Some(program("O100"))),
    ];
    let chart = part_timeline::render(&ctx(), &state(samples), tol());

    assert_eq!(chart.bars.len(), 61);
    assert_eq!(chart.bars[0].name, UNAVAILABLE_PROGRAM);
    assert_eq!(chart.bars[0].comment.as_deref(), Some("default"));
    assert_eq!(chart.bars[0].color, FALLBACK_COLOR);

    assert_eq!(chart.bars[1].name, "O100");
    assert_eq!(chart.bars[1].color, PALETTE[0]);
    assert_eq!(
        chart.bars[1].tooltip,
        vec!["Part-Name: O100", "Date: 01/05/2024", "Time: 10:01"]
    );
    // No carry between observations
    assert_eq!(chart.bars[2].name, UNAVAILABLE_PROGRAM);
    assert_eq!(chart.bars[3].color, PALETTE[1]);
    assert_eq!(chart.bars[4].color, PALETTE[0]);

    let legend: Vec<(&str, &str)> = chart
        .meta
        .legend
        .iter()
        .map(|l| (l.label.as_str(), l.color.as_str()))
        .collect();
    assert_eq!(legend, vec![("O100", PALETTE[0]), ("O200", PALETTE[1])]);
}

#[test]
fn part_legend_omits_programs_outside_the_window() {
    let samples = vec![
        Sample::new(minute(-90), Some(program("O050"))),
        Sample::new(minute(2), Some(program("O100"))),
    ];
    let chart = part_timeline::render(&ctx(), &state(samples), tol());

    // Batch order still decides the color
    assert_eq!(chart.bars[2].color, PALETTE[1]);
    let legend: Vec<(&str, &str)> = chart
        .meta
        .legend
        .iter()
        .map(|l| (l.label.as_str(), l.color.as_str()))
        .collect();
    assert_eq!(legend, vec![("O100", PALETTE[1])]);
}

#[test]
fn sibling_charts_share_ticks_and_hover_column() {
    let mut ctx = ctx();
    ctx.hover = Some(minute(5) + Duration::seconds(20));

    let up = uptime::render(&ctx, &state(vec![Sample::new(minute(1), Some(3u8))]), tol());
    let fd = feed::render(&ctx, &state(vec![Sample::new(minute(1), Some(50.0))]), tol());

    assert_eq!(up.meta.ticks, fd.meta.ticks);
    assert_eq!(up.meta.ticks.len(), 7);
    assert_eq!(up.meta.ticks[1], minute(10));

    assert_eq!(up.meta.active_index, Some(5));
    assert_eq!(fd.meta.active_index, Some(5));
}

#[test]
fn slot_index_matches_same_minute_only() {
    let grid = placeholder_grid(t0(), minute(60));
    assert_eq!(slot_index_at(&grid, t0()), Some(0));
    assert_eq!(slot_index_at(&grid, minute(59) + Duration::seconds(59)), Some(59));
    assert_eq!(slot_index_at(&grid, minute(60)), Some(60));
    assert_eq!(slot_index_at(&grid, minute(61)), None);
    assert_eq!(slot_index_at(&grid, t0() - Duration::seconds(1)), None);
}

#[tokio::test]
async fn hover_hub_broadcasts_latest_position() {
    let hub = HoverHub::new(["m1", "m2"]);
    let mut rx = hub.subscribe("m1").unwrap();
    assert!(hub.subscribe("nope").is_none());

    let position = HoverPosition {
        time: minute(3),
        source: Some(StreamKind::Feed),
    };
    assert!(hub.publish("m1", position));
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), Some(position));
    assert_eq!(hub.current("m1"), Some(position));
    assert_eq!(hub.current("m2"), None);

    assert!(hub.clear("m1"));
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), None);

    assert!(!hub.publish("nope", position));
}

#[test]
fn csv_rows_follow_column_order() {
    let chart = uptime::render(&ctx(), &state(vec![Sample::new(minute(0), Some(3u8))]), tol());
    assert_eq!(
        uptime::UptimeChart::columns(),
        &["time", "run", "state", "color", "matched"]
    );
    assert_eq!(
        uptime::UptimeChart::row(&chart.bars()[0]),
        vec![
            "2024-05-01T10:00:00+00:00".to_string(),
            "3".to_string(),
            "Productive".to_string(),
            "#4CAF50".to_string(),
            "true".to_string(),
        ]
    );
    assert_eq!(uptime::UptimeChart::row(&chart.bars()[1])[1], "");
}

#[test]
fn chart_json_flattens_meta() {
    let chart = feed::render(&ctx(), &state(vec![Sample::new(minute(0), Some(10.0))]), tol());
    let json = serde_json::to_value(&chart).unwrap();

    assert_eq!(json["machine"], "m1");
    assert_eq!(json["stream"], "feed");
    assert_eq!(json["status"], "idle");
    assert!(json["placeholder"].is_null());
    assert_eq!(json["bars"].as_array().unwrap().len(), 61);
    assert_eq!(json["bars"][0]["band"], "low");
}
