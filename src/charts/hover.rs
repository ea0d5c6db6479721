use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::watch;
use utoipa::ToSchema;

use crate::store::StreamKind;
use crate::timeline::SLOT_SECONDS;

/// The time column currently hovered on a machine dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HoverPosition {
    pub time: DateTime<Utc>,
    /// Chart the pointer is over, if reported
    pub source: Option<StreamKind>,
}

/// Publish/subscribe point for synchronized tooltips.
///
/// Any chart publishes the hovered time; every chart of the same machine
/// subscribes and highlights the column from [`slot_index_at`]. Only the
/// latest value matters, so each machine gets a `watch` channel.
pub struct HoverHub {
    channels: HashMap<String, watch::Sender<Option<HoverPosition>>>,
}

impl HoverHub {
    pub fn new<'a>(machines: impl IntoIterator<Item = &'a str>) -> Self {
        let channels = machines
            .into_iter()
            .map(|machine| (machine.to_string(), watch::channel(None).0))
            .collect();
        Self { channels }
    }

    /// Returns `false` if the machine is unknown.
    pub fn publish(&self, machine: &str, position: HoverPosition) -> bool {
        self.set(machine, Some(position))
    }

    /// Returns `false` if the machine is unknown.
    pub fn clear(&self, machine: &str) -> bool {
        self.set(machine, None)
    }

    #[must_use]
    pub fn current(&self, machine: &str) -> Option<HoverPosition> {
        self.channels.get(machine).and_then(|tx| *tx.borrow())
    }

    #[must_use]
    pub fn subscribe(&self, machine: &str) -> Option<watch::Receiver<Option<HoverPosition>>> {
        self.channels.get(machine).map(watch::Sender::subscribe)
    }

    fn set(&self, machine: &str, value: Option<HoverPosition>) -> bool {
        let Some(tx) = self.channels.get(machine) else {
            return false;
        };
        tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
        true
    }
}

/// Index of the grid slot in the same calendar minute as `time`.
///
/// `grid` must be ascending, which placeholder grids always are. Sibling
/// charts over the same window share one grid, so the index is valid for
/// all of them.
#[must_use]
pub fn slot_index_at(grid: &[DateTime<Utc>], time: DateTime<Utc>) -> Option<usize> {
    let minute = |t: DateTime<Utc>| t.duration_trunc(Duration::seconds(SLOT_SECONDS)).unwrap_or(t);
    let target = minute(time);
    grid.binary_search_by_key(&target, |&slot| minute(slot)).ok()
}
