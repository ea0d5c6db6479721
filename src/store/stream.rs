use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use utoipa::ToSchema;

use crate::error::AppResult;

pub const NO_DATA_MESSAGE: &str = "No data available for this specific period of time.";
pub const FETCH_ERROR_MESSAGE: &str = "An error occurred while fetching the data.";

/// The three telemetry feeds shown on a machine dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StreamKind {
    Uptime,
    Feed,
    PartTimeline,
}

impl StreamKind {
    pub const ALL: [Self; 3] = [Self::Uptime, Self::Feed, Self::PartTimeline];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uptime => "uptime",
            Self::Feed => "feed",
            Self::PartTimeline => "part-timeline",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uptime" => Ok(Self::Uptime),
            "feed" => Ok(Self::Feed),
            "part-timeline" | "part_timeline" => Ok(Self::PartTimeline),
            other => Err(format!("Unknown stream '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Idle,
    Loading,
    Failed,
}

impl StreamStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Failed => "failed",
        }
    }
}

/// Latest known state of one stream for one machine.
#[derive(Debug)]
pub struct StreamState<T> {
    /// Replaced wholesale on every completed fetch.
    pub data: Arc<Vec<T>>,
    pub status: StreamStatus,
    pub message: String,
    /// Generation of the fetch whose result is in `data` (0 before any).
    pub generation: u64,
    /// Look-back hours the current `data` was fetched for.
    pub hours: Option<u32>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Clone for StreamState<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            status: self.status,
            message: self.message.clone(),
            generation: self.generation,
            hours: self.hours,
            updated_at: self.updated_at,
        }
    }
}

impl<T> Default for StreamState<T> {
    fn default() -> Self {
        Self {
            data: Arc::new(Vec::new()),
            status: StreamStatus::Idle,
            message: String::new(),
            generation: 0,
            hours: None,
            updated_at: None,
        }
    }
}

/// Proof that a fetch was started. Only the most recently issued ticket for a
/// machine may write its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub machine: String,
    pub generation: u64,
    pub hours: u32,
}

struct Entry<T> {
    state: StreamState<T>,
    issued: u64,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            state: StreamState::default(),
            issued: 0,
        }
    }
}

/// Per-machine state of a single stream kind.
pub struct StreamMap<T> {
    kind: StreamKind,
    entries: RwLock<HashMap<String, Entry<T>>>,
}

impl<T> StreamMap<T> {
    #[must_use]
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Fetch-started: mark the stream as loading and issue a new generation.
    pub fn begin(&self, machine: &str, hours: u32) -> FetchTicket {
        let mut entries = self.write();
        let entry = entries.entry(machine.to_string()).or_default();
        entry.issued += 1;
        entry.state.status = StreamStatus::Loading;

        FetchTicket {
            machine: machine.to_string(),
            generation: entry.issued,
            hours,
        }
    }

    /// Fetch-succeeded or fetch-failed.
    ///
    /// Returns `false` without touching the state when a newer fetch has been
    /// started since `ticket` was issued.
    pub fn finish(&self, ticket: FetchTicket, result: AppResult<Vec<T>>) -> bool {
        let mut entries = self.write();
        let Some(entry) = entries.get_mut(&ticket.machine) else {
            return false;
        };

        if ticket.generation != entry.issued {
            tracing::debug!(
                stream = %self.kind,
                machine = %ticket.machine,
                generation = ticket.generation,
                latest = entry.issued,
                "Discarding stale fetch result"
            );
            return false;
        }

        let state = &mut entry.state;
        state.generation = ticket.generation;
        state.hours = Some(ticket.hours);
        state.updated_at = Some(Utc::now());

        match result {
            Ok(data) if !data.is_empty() => {
                state.status = StreamStatus::Idle;
                state.data = Arc::new(data);
                state.message.clear();
            }
            Ok(_) => {
                state.status = StreamStatus::Idle;
                state.data = Arc::new(Vec::new());
                state.message = NO_DATA_MESSAGE.to_string();
            }
            Err(e) => {
                tracing::warn!(
                    stream = %self.kind,
                    machine = %ticket.machine,
                    error = %e,
                    "Stream fetch failed"
                );
                state.status = StreamStatus::Failed;
                state.data = Arc::new(Vec::new());
                state.message = FETCH_ERROR_MESSAGE.to_string();
            }
        }
        true
    }

    /// Read-only copy of the current state, if the machine was ever fetched.
    #[must_use]
    pub fn snapshot(&self, machine: &str) -> Option<StreamState<T>> {
        self.read().get(machine).map(|entry| entry.state.clone())
    }

    /// Like [`StreamMap::snapshot`] but returns an idle, empty state for
    /// machines that were never fetched.
    #[must_use]
    pub fn snapshot_or_default(&self, machine: &str) -> StreamState<T> {
        self.snapshot(machine).unwrap_or_default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
