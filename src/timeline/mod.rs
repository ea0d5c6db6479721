//! Minute-grid alignment of sparse telemetry.
//!
//! Every chart on the dashboard draws one bar per minute of the selected
//! look-back window. Upstream samples arrive at irregular times, so each
//! stream is overlaid onto a dense placeholder grid before presentation.

pub mod align;
pub mod colors;
pub mod grid;

pub use align::{align, Alignment, Fill, Sample, Slot};
pub use colors::{ColorMap, FALLBACK_COLOR, PALETTE};
pub use grid::{placeholder_grid, window, SLOT_SECONDS};
