use emr_viewer_protocol::{ChartId, PlotBand, PlotLine, TimeWindow};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    /// The chart exists but its x axis is not initialized yet.
    #[error("x axis not ready")]
    AxisNotReady,
    /// Error reported by the charting library.
    #[error("{0}")]
    Library(String),
}

/// One rendered chart as seen by the synchronizer.
///
/// Implementations wrap whatever the host renders with. Visibility applies to
/// the chart's row container; a host whose container is missing treats
/// `set_visible` as a no-op.
pub trait ChartHandle {
    fn set_extremes(&mut self, window: TimeWindow) -> Result<(), ChartError>;

    fn add_plot_line(&mut self, line: &PlotLine) -> Result<(), ChartError>;

    fn add_plot_band(&mut self, band: &PlotBand) -> Result<(), ChartError>;

    /// Removes every x-axis plot line and plot band carrying `id`.
    fn remove_plot_line(&mut self, id: &str) -> Result<(), ChartError>;

    fn set_visible(&mut self, visible: bool);

    /// Recompute layout after a visibility or size change.
    fn reflow(&mut self) -> Result<(), ChartError>;
}

/// State of the "continue" task button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueState {
    /// Nothing selected and nothing required.
    Idle,
    /// A required selection or rating is missing: disabled, red.
    Blocked,
    /// At least one row selected: enabled, green.
    Ready,
}

/// Page elements outside the charts that follow viewer state.
pub trait PageView {
    fn set_range_label(&mut self, text: &str);

    fn set_marker_label(&mut self, text: &str);

    /// Whether a user-placed marker is active.
    fn set_marker_indicator(&mut self, active: bool);

    fn set_row_highlight(&mut self, id: &ChartId, highlighted: bool);

    fn set_continue_state(&mut self, state: ContinueState);
}
