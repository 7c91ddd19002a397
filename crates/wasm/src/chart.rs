use emr_viewer_core::sync::{ChartError, ChartHandle};
use emr_viewer_protocol::{PlotBand, PlotLine, TimeWindow};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// Page-side adapter around one charting-library chart. Each method maps
    /// onto the chart's first x axis, except `reflow`.
    pub type HostChart;

    #[wasm_bindgen(method, catch, js_name = setExtremes)]
    fn set_extremes(this: &HostChart, min: f64, max: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addPlotLine)]
    fn add_plot_line(this: &HostChart, options: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addPlotBand)]
    fn add_plot_band(this: &HostChart, options: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = removePlotLine)]
    fn remove_plot_line(this: &HostChart, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn reflow(this: &HostChart) -> Result<(), JsValue>;
}

/// A rendered chart plus the row element that shows or hides it.
pub struct WebChart {
    chart: HostChart,
    /// `None` when the page has no row for this chart.
    row: Option<web_sys::HtmlElement>,
}

impl WebChart {
    pub fn new(chart: HostChart, row_id: &str) -> Self {
        let row = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(row_id))
            .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok());
        if row.is_none() {
            log::debug!("no row element #{row_id}; visibility changes are ignored");
        }
        Self { chart, row }
    }
}

fn library(e: JsValue) -> ChartError {
    ChartError::Library(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, ChartError> {
    let json = serde_json::to_string(value).map_err(|e| ChartError::Library(e.to_string()))?;
    js_sys::JSON::parse(&json).map_err(library)
}

impl ChartHandle for WebChart {
    fn set_extremes(&mut self, window: TimeWindow) -> Result<(), ChartError> {
        self.chart
            .set_extremes(window.min() as f64, window.max() as f64)
            .map_err(|_| ChartError::AxisNotReady)
    }

    fn add_plot_line(&mut self, line: &PlotLine) -> Result<(), ChartError> {
        self.chart.add_plot_line(to_js(line)?).map_err(library)
    }

    fn add_plot_band(&mut self, band: &PlotBand) -> Result<(), ChartError> {
        self.chart.add_plot_band(to_js(band)?).map_err(library)
    }

    fn remove_plot_line(&mut self, id: &str) -> Result<(), ChartError> {
        self.chart.remove_plot_line(id).map_err(library)
    }

    fn set_visible(&mut self, visible: bool) {
        let Some(row) = &self.row else {
            return;
        };
        let style = row.style();
        let result = if visible {
            style.remove_property("display").map(drop)
        } else {
            style.set_property("display", "none")
        };
        if let Err(e) = result {
            log::debug!("row visibility: {e:?}");
        }
    }

    fn reflow(&mut self) -> Result<(), ChartError> {
        self.chart.reflow().map_err(library)
    }
}
