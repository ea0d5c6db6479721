use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::common::AppState;
use crate::sync::worker;

/// Poll all streams of one machine on a schedule.
///
/// Fires immediately on startup, then every `poll_interval_seconds`, and
/// right away whenever the machine's selected hours change (which also
/// restarts the interval).
pub async fn run_machine_poll(state: AppState, machine: String) {
    let interval_secs = state.config.poll_interval_seconds;

    let Some(mut selection) = state.selections.subscribe(&machine) else {
        tracing::error!(machine = %machine, "Cannot poll unknown machine");
        return;
    };

    tracing::info!(machine = %machine, interval_secs, "Starting stream poll scheduler");

    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracing::debug!(machine = %machine, "Scheduled stream refresh");
            }
            changed = selection.changed() => {
                if changed.is_err() {
                    tracing::info!(machine = %machine, "Selection channel closed, stopping poller");
                    break;
                }
                ticker.reset();
                tracing::debug!(machine = %machine, "Selection changed, refreshing streams");
            }
        }

        let hours = *selection.borrow_and_update();
        worker::spawn_refresh(&state, &machine, hours);
    }
}

/// Spawn one poller per configured machine (fire-and-forget).
pub fn spawn_all(state: &AppState) {
    for machine in state.selections.machines() {
        tokio::spawn(run_machine_poll(state.clone(), machine.to_string()));
    }
}
