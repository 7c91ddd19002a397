//! Synchronization of the chart bank on one time window.

pub mod gate;
pub mod handle;
pub mod marker;
pub mod window;

pub use gate::RangeGate;
pub use handle::{ChartError, ChartHandle, ContinueState, PageView};
pub use marker::{Marker, MarkerController, Placement, day_band};
pub use window::{ChartRegistration, SyncSummary, TimeWindowController};
