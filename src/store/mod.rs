//! Per-stream fetch state owned by the service.
//!
//! Pollers are the only writers; they report fetch lifecycle events through
//! [`StreamMap::begin`] and [`StreamMap::finish`]. Route handlers read
//! snapshots and never mutate stream state.

pub mod selection;
pub mod stream;

pub use selection::Selections;
pub use stream::{
    FetchTicket, StreamKind, StreamMap, StreamState, StreamStatus, FETCH_ERROR_MESSAGE,
    NO_DATA_MESSAGE,
};

use crate::fanuc::models::Program;
use crate::timeline::Sample;

pub struct StreamStore {
    pub uptime: StreamMap<Sample<u8>>,
    pub feed: StreamMap<Sample<f64>>,
    pub part_timeline: StreamMap<Sample<Program>>,
}

impl StreamStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uptime: StreamMap::new(StreamKind::Uptime),
            feed: StreamMap::new(StreamKind::Feed),
            part_timeline: StreamMap::new(StreamKind::PartTimeline),
        }
    }
}

impl Default for StreamStore {
    fn default() -> Self {
        Self::new()
    }
}
