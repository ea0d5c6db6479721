use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One telemetry reading as received from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample<V> {
    pub time: DateTime<Utc>,
    pub value: Option<V>,
}

impl<V> Sample<V> {
    pub fn new(time: DateTime<Utc>, value: Option<V>) -> Self {
        Self { time, value }
    }
}

/// One minute column of an aligned series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot<V> {
    pub time: DateTime<Utc>,
    pub value: Option<V>,
    /// True when an upstream sample landed on this slot, false for
    /// placeholders and carried values.
    pub matched: bool,
}

/// What an unmatched slot holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill<V> {
    /// Leave the slot empty.
    Empty,
    /// Repeat the most recent matched value. Slots before the first match stay
    /// empty, and a matched `None` stops the carry.
    CarryForward,
    /// Hold a fixed placeholder value.
    Sentinel(V),
}

/// Matching and fill rules for one stream.
#[derive(Debug, Clone)]
pub struct Alignment<V> {
    /// A sample at offset `d` from a slot matches it when
    /// `-tolerance < d <= tolerance`.
    pub tolerance: Duration,
    pub fill: Fill<V>,
}

impl<V> Alignment<V> {
    pub fn new(tolerance: Duration, fill: Fill<V>) -> Self {
        Self { tolerance, fill }
    }
}

/// Overlay `samples` onto `grid`.
///
/// Samples are sorted by time first, so upstream order does not matter. Each
/// sample goes to its nearest slot (the earlier one on a tie) if it lies
/// within the tolerance window; when several samples compete for one slot the
/// closest wins, the earliest on equal distance. The result always has one
/// slot per grid entry in grid order.
pub fn align<V: Clone>(
    grid: &[DateTime<Utc>],
    samples: &[Sample<V>],
    alignment: &Alignment<V>,
) -> Vec<Slot<V>> {
    let mut sorted: Vec<&Sample<V>> = samples.iter().collect();
    sorted.sort_by_key(|sample| sample.time);

    let mut assigned: Vec<Option<(i64, &Sample<V>)>> = vec![None; grid.len()];
    for sample in sorted {
        let Some(idx) = nearest_slot(grid, sample.time, alignment.tolerance) else {
            continue;
        };
        let distance = (sample.time - grid[idx]).num_milliseconds().abs();
        match assigned[idx] {
            Some((best, _)) if best <= distance => {}
            _ => assigned[idx] = Some((distance, sample)),
        }
    }

    let mut carried: Option<V> = None;
    grid.iter()
        .zip(assigned)
        .map(|(&time, matched)| match matched {
            Some((_, sample)) => {
                if matches!(alignment.fill, Fill::CarryForward) {
                    carried.clone_from(&sample.value);
                }
                Slot {
                    time,
                    value: sample.value.clone(),
                    matched: true,
                }
            }
            None => {
                let value = match &alignment.fill {
                    Fill::Empty => None,
                    Fill::CarryForward => carried.clone(),
                    Fill::Sentinel(sentinel) => Some(sentinel.clone()),
                };
                Slot {
                    time,
                    value,
                    matched: false,
                }
            }
        })
        .collect()
}

/// Index of the slot `time` belongs to, if any. `grid` must be ascending.
fn nearest_slot(grid: &[DateTime<Utc>], time: DateTime<Utc>, tolerance: Duration) -> Option<usize> {
    let upper = grid.partition_point(|slot| *slot < time);

    let before = upper
        .checked_sub(1)
        .filter(|&i| time - grid[i] <= tolerance);
    let after = Some(upper)
        .filter(|&i| i < grid.len())
        .filter(|&i| grid[i] == time || grid[i] - time < tolerance);

    match (before, after) {
        (Some(b), Some(a)) => {
            if time - grid[b] <= grid[a] - time {
                Some(b)
            } else {
                Some(a)
            }
        }
        (b, a) => b.or(a),
    }
}
