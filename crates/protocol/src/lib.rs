pub mod case;
pub mod chart;
pub mod theme;
pub mod types;

pub use case::{CasePayload, CaseStep, DiscreteSample, NormalRange, Observation, ObservationData};
pub use chart::{
    AxisConfig, ChartConfig, ChartType, DashStyle, PlotBand, PlotLine, SeriesConfig, SeriesPoint,
    TooltipFormat, ValueZone,
};
pub use theme::ThemeToken;
pub use types::{ChartId, EpochMillis, MARKER_ID, MAX_EPOCH_MS, TimeWindow, WindowError};
