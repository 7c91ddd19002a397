//! In-memory chart handle and page view that record what was done to them.
//!
//! Used by this crate's tests and by hosts that want to exercise a session
//! without a renderer.

use std::collections::HashSet;

use emr_viewer_protocol::{ChartId, PlotBand, PlotLine, TimeWindow};

use crate::sync::{ChartError, ChartHandle, ContinueState, PageView};

#[derive(Debug, Default, Clone)]
pub struct RecordingChart {
    pub extremes: Option<TimeWindow>,
    pub visible: Option<bool>,
    pub lines: Vec<PlotLine>,
    pub bands: Vec<PlotBand>,
    pub reflows: usize,
    /// Make `set_extremes` fail, as an uninitialized axis would.
    pub fail_extremes: bool,
}

impl RecordingChart {
    pub fn failing() -> Self {
        Self {
            fail_extremes: true,
            ..Self::default()
        }
    }
}

impl ChartHandle for RecordingChart {
    fn set_extremes(&mut self, window: TimeWindow) -> Result<(), ChartError> {
        if self.fail_extremes {
            return Err(ChartError::AxisNotReady);
        }
        self.extremes = Some(window);
        Ok(())
    }

    fn add_plot_line(&mut self, line: &PlotLine) -> Result<(), ChartError> {
        self.lines.push(line.clone());
        Ok(())
    }

    fn add_plot_band(&mut self, band: &PlotBand) -> Result<(), ChartError> {
        self.bands.push(band.clone());
        Ok(())
    }

    fn remove_plot_line(&mut self, id: &str) -> Result<(), ChartError> {
        self.lines.retain(|l| l.id.as_deref() != Some(id));
        self.bands.retain(|b| b.id.as_deref() != Some(id));
        Ok(())
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = Some(visible);
    }

    fn reflow(&mut self) -> Result<(), ChartError> {
        self.reflows += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingView {
    pub range_label: String,
    pub marker_label: String,
    pub marker_active: bool,
    pub highlighted: HashSet<ChartId>,
    pub continue_state: ContinueState,
}

impl Default for RecordingView {
    fn default() -> Self {
        Self {
            range_label: String::new(),
            marker_label: String::new(),
            marker_active: false,
            highlighted: HashSet::new(),
            continue_state: ContinueState::Idle,
        }
    }
}

impl PageView for RecordingView {
    fn set_range_label(&mut self, text: &str) {
        self.range_label = text.to_owned();
    }

    fn set_marker_label(&mut self, text: &str) {
        self.marker_label = text.to_owned();
    }

    fn set_marker_indicator(&mut self, active: bool) {
        self.marker_active = active;
    }

    fn set_row_highlight(&mut self, id: &ChartId, highlighted: bool) {
        if highlighted {
            self.highlighted.insert(id.clone());
        } else {
            self.highlighted.remove(id);
        }
    }

    fn set_continue_state(&mut self, state: ContinueState) {
        self.continue_state = state;
    }
}
