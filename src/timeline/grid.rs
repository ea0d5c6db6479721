use chrono::{DateTime, Duration, DurationRound, Utc};

/// Spacing between placeholder slots.
pub const SLOT_SECONDS: i64 = 60;

/// Generate the placeholder grid for `[start, end]`.
///
/// Slots are spaced [`SLOT_SECONDS`] apart starting at `start`; the last slot
/// is the latest one not after `end`. Returns an empty grid when
/// `start > end`. The grid depends on "now", so callers regenerate it on every
/// request instead of caching it.
#[must_use]
pub fn placeholder_grid(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    if start > end {
        return Vec::new();
    }

    let steps = (end - start).num_seconds() / SLOT_SECONDS;
    let mut grid = Vec::with_capacity(usize::try_from(steps + 1).unwrap_or_default());
    for i in 0..=steps {
        grid.push(start + Duration::seconds(i * SLOT_SECONDS));
    }
    grid
}

/// Look-back window ending at the current minute.
///
/// `end` is `now` truncated to the minute and `start` lies exactly `hours`
/// before it, so the grid for the window has `hours * 60 + 1` slots.
#[must_use]
pub fn window(now: DateTime<Utc>, hours: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = now
        .duration_trunc(Duration::seconds(SLOT_SECONDS))
        .unwrap_or(now);
    (end - Duration::hours(i64::from(hours)), end)
}
