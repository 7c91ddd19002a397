use std::collections::HashSet;

use emr_viewer_core::sync::{ChartError, ChartHandle, ContinueState, PageView};
use emr_viewer_protocol::{ChartConfig, ChartId, PlotBand, PlotLine, TimeWindow};

/// A chart row drawn by the terminal renderer from its configuration and the
/// state the session pushed into it.
pub struct TermChart {
    pub config: ChartConfig,
    pub extremes: Option<TimeWindow>,
    pub visible: bool,
    pub lines: Vec<PlotLine>,
    pub bands: Vec<PlotBand>,
}

impl TermChart {
    pub fn new(config: ChartConfig) -> Self {
        let bands = config.x_axis.plot_bands.clone();
        let lines = config.x_axis.plot_lines.clone();
        Self {
            config,
            extremes: None,
            visible: false,
            lines,
            bands,
        }
    }
}

impl ChartHandle for TermChart {
    fn set_extremes(&mut self, window: TimeWindow) -> Result<(), ChartError> {
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
        self.visible = visible;
    }

    fn reflow(&mut self) -> Result<(), ChartError> {
        Ok(())
    }
}

/// Header and row state shown around the charts.
#[derive(Default)]
pub struct TermView {
    pub range_label: String,
    pub marker_label: String,
    pub marker_active: bool,
    pub highlighted: HashSet<ChartId>,
    pub continue_state: Option<ContinueState>,
}

impl PageView for TermView {
    fn set_range_label(&mut self, text: &str) {
        text.clone_into(&mut self.range_label);
    }

    fn set_marker_label(&mut self, text: &str) {
        text.clone_into(&mut self.marker_label);
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
        self.continue_state = Some(state);
    }
}
