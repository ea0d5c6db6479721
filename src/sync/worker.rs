use std::future::Future;
use tokio::task::JoinHandle;

use crate::common::AppState;
use crate::error::AppResult;
use crate::store::StreamMap;

/// Run one fetch lifecycle against a stream map.
///
/// Returns whether the result was applied; `false` means a newer fetch for
/// the same machine was started while this one was in flight.
async fn run_fetch<T, F, Fut>(map: &StreamMap<T>, machine: &str, hours: u32, fetch: F) -> bool
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<Vec<T>>>,
{
    let ticket = map.begin(machine, hours);
    let generation = ticket.generation;

    let result = fetch().await;
    let samples = result.as_ref().map_or(0, Vec::len);
    let applied = map.finish(ticket, result);

    if applied {
        tracing::debug!(
            stream = %map.kind(),
            machine,
            hours,
            generation,
            samples,
            "Stream refreshed"
        );
    }
    applied
}

/// Refresh the uptime stream for a machine.
pub async fn refresh_uptime(state: &AppState, machine: &str, hours: u32) -> bool {
    run_fetch(&state.streams.uptime, machine, hours, || {
        state.fanuc_client.get_uptime(machine, hours)
    })
    .await
}

/// Refresh the feed-speed stream for a machine.
pub async fn refresh_feed(state: &AppState, machine: &str, hours: u32) -> bool {
    run_fetch(&state.streams.feed, machine, hours, || {
        state.fanuc_client.get_feed(machine, hours)
    })
    .await
}

/// Refresh the part timeline stream for a machine.
pub async fn refresh_part_timeline(state: &AppState, machine: &str, hours: u32) -> bool {
    let observation = state.config.observation_name.as_str();
    run_fetch(&state.streams.part_timeline, machine, hours, || {
        state
            .fanuc_client
            .get_part_timeline(machine, hours, observation)
    })
    .await
}

/// Start all three stream refreshes for a machine without waiting for them.
///
/// Fetches for the same machine may overlap; the store's generation check
/// keeps a slow, older response from overwriting a newer one.
pub fn spawn_refresh(state: &AppState, machine: &str, hours: u32) -> Vec<JoinHandle<bool>> {
    let uptime = {
        let state = state.clone();
        let machine = machine.to_string();
        tokio::spawn(async move { refresh_uptime(&state, &machine, hours).await })
    };
    let feed = {
        let state = state.clone();
        let machine = machine.to_string();
        tokio::spawn(async move { refresh_feed(&state, &machine, hours).await })
    };
    let part_timeline = {
        let state = state.clone();
        let machine = machine.to_string();
        tokio::spawn(async move { refresh_part_timeline(&state, &machine, hours).await })
    };

    vec![uptime, feed, part_timeline]
}
