//! Program color assignment.
//!
//! Run with: cargo test --test colors_test

use chrono::{TimeZone, Utc};
use fanuc_dashboard::charts::part_timeline;
use fanuc_dashboard::fanuc::models::Program;
use fanuc_dashboard::timeline::{ColorMap, Sample, FALLBACK_COLOR, PALETTE};

#[test]
fn distinct_names_get_palette_entries_in_first_seen_order() {
    let map = ColorMap::build(["A", "B", "A", "C"]);

    assert_eq!(map.len(), 3);
    assert_eq!(map.color_of("A"), PALETTE[0]);
    assert_eq!(map.color_of("B"), PALETTE[1]);
    assert_eq!(map.color_of("C"), PALETTE[2]);

    let order: Vec<&str> = map.entries().map(|(name, _)| name).collect();
    assert_eq!(order, vec!["A", "B", "C"]);
}

#[test]
fn palette_wraps_after_ten_names() {
    let names: Vec<String> = (0..12).map(|i| format!("P{i}")).collect();
    let map = ColorMap::build(&names);

    assert_eq!(map.color_of("P9"), PALETTE[9]);
    assert_eq!(map.color_of("P10"), PALETTE[0]);
    assert_eq!(map.color_of("P11"), PALETTE[1]);
}

#[test]
fn unknown_names_use_fallback_color() {
    let map = ColorMap::build(["A"]);
    assert_eq!(map.color_of("Z"), FALLBACK_COLOR);

    let empty = ColorMap::build(Vec::<String>::new());
    assert!(empty.is_empty());
    assert_eq!(empty.color_of("A"), FALLBACK_COLOR);
}

#[test]
fn same_batch_builds_same_map() {
    let batch = ["O100", "O200", "O100", "O300", "O200"];
    assert_eq!(ColorMap::build(batch), ColorMap::build(batch));
}

#[test]
fn part_color_map_follows_received_order_and_skips_missing_programs() {
    let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let program = |name: &str| Program {
        name: name.to_string(),
        comment: None,
    };
    // Received order, not time order
    let samples = vec![
        Sample::new(t + chrono::Duration::minutes(5), Some(program("LATE"))),
        Sample::new(t, None),
        Sample::new(t + chrono::Duration::minutes(1), Some(program("EARLY"))),
    ];

    let map = part_timeline::color_map(&samples);

    assert_eq!(map.len(), 2);
    assert_eq!(map.color_of("LATE"), PALETTE[0]);
    assert_eq!(map.color_of("EARLY"), PALETTE[1]);
}
