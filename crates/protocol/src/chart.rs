use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::types::{EpochMillis, TimeWindow};

/// Declarative configuration for one chart, handed to the charting library.
///
/// Field names serialize in the library's camelCase option vocabulary so the
/// page can pass the JSON straight to the chart constructor. Colors are
/// resolved CSS strings; the token they came from is kept alongside for
/// renderers that bring their own palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub container_id: String,
    pub chart_type: ChartType,
    pub title: String,
    pub height: u32,
    /// `[top, right, bottom, left]` in pixels.
    pub spacing: [u32; 4],
    pub title_offset_x: i32,
    pub x_axis: AxisConfig,
    pub y_axis: AxisConfig,
    pub series: Vec<SeriesConfig>,
    pub tooltip: TooltipFormat,
    pub stacked: bool,
    /// Most recent value at or before the end of the loaded window, with units.
    pub credits: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Scatter,
    Column,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisConfig {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub labels_enabled: bool,
    pub plot_lines: Vec<PlotLine>,
    pub plot_bands: Vec<PlotBand>,
}

impl AxisConfig {
    /// A time axis spanning `window` with no labels, as every row chart uses.
    pub fn time(window: TimeWindow) -> Self {
        Self {
            min: Some(window.min() as f64),
            max: Some(window.max() as f64),
            labels_enabled: false,
            plot_lines: Vec::new(),
            plot_bands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DashStyle {
    Solid,
    Dash,
}

/// A vertical (x axis) or horizontal (y axis) line annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotLine {
    pub value: f64,
    pub color: String,
    pub dash_style: DashStyle,
    pub width: f64,
    pub id: Option<String>,
    #[serde(skip)]
    pub token: Option<ThemeToken>,
}

impl PlotLine {
    pub fn new(value: f64, token: ThemeToken, dash_style: DashStyle) -> Self {
        Self {
            value,
            color: token.css().to_owned(),
            dash_style,
            width: 1.0,
            id: None,
            token: Some(token),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A shaded interval annotation `[from, to]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotBand {
    pub from: f64,
    pub to: f64,
    pub color: String,
    pub id: Option<String>,
    #[serde(skip)]
    pub token: Option<ThemeToken>,
}

impl PlotBand {
    pub fn new(from: f64, to: f64, token: ThemeToken) -> Self {
        Self {
            from,
            to,
            color: token.css().to_owned(),
            id: None,
            token: Some(token),
        }
    }

    /// A band over a time interval on the x axis.
    pub fn time(from: EpochMillis, to: EpochMillis, token: ThemeToken) -> Self {
        Self::new(from as f64, to as f64, token)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesConfig {
    pub name: String,
    pub color: Option<String>,
    pub marker_symbol: Option<String>,
    pub zones: Vec<ValueZone>,
    pub data: Vec<SeriesPoint>,
}

/// One plotted point, serialized as the `[x, y]` pair the library expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(EpochMillis, f64)", into = "(EpochMillis, f64)")]
pub struct SeriesPoint {
    pub x: EpochMillis,
    pub y: f64,
}

impl From<(EpochMillis, f64)> for SeriesPoint {
    fn from((x, y): (EpochMillis, f64)) -> Self {
        Self { x, y }
    }
}

impl From<SeriesPoint> for (EpochMillis, f64) {
    fn from(p: SeriesPoint) -> Self {
        (p.x, p.y)
    }
}

/// Colors values below `value` (or everything remaining when `value` is `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueZone {
    pub value: Option<f64>,
    pub color: String,
}

/// How a hovered point is turned into tooltip text.
///
/// Formatting itself happens on the Rust side; the page only forwards the
/// hovered point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TooltipFormat {
    /// The raw y value.
    Value,
    /// y is an index into `labels`.
    Category { labels: Vec<String> },
    /// `systolic/diastolic` for the hovered x.
    BloodPressure,
    /// `series | round(y)`.
    SeriesRounded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_point_is_a_pair() {
        let json = serde_json::to_string(&SeriesPoint { x: 5, y: 1.5 }).unwrap();
        assert_eq!(json, "[5,1.5]");
        let back: SeriesPoint = serde_json::from_str("[7, 2.0]").unwrap();
        assert_eq!(back, SeriesPoint { x: 7, y: 2.0 });
    }

    #[test]
    fn plot_line_uses_library_field_names() {
        let line = PlotLine::new(10.0, ThemeToken::MarkerLine, DashStyle::Dash).with_id("m");
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["dashStyle"], "dash");
        assert_eq!(json["color"], "black");
        assert_eq!(json["id"], "m");
        assert!(json.get("token").is_none());
    }
}
