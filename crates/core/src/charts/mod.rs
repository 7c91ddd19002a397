//! Declarative chart configurations for each observation row.

mod options;
mod tooltip;

pub use options::{build_chart_options, chart_height};
pub use tooltip::format_tooltip;

use emr_viewer_protocol::{
    DiscreteSample, EpochMillis, NormalRange, Observation, ObservationData, PlotBand,
    SeriesPoint, TimeWindow,
};

/// What kind of chart a row gets, borrowing the data it plots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartKind<'a> {
    /// Numeric lab result with an optional normal range.
    Scalar {
        values: &'a [SeriesPoint],
        normal_range: NormalRange,
    },
    /// Non-numeric lab result plotted on a category axis.
    Discrete { values: &'a [DiscreteSample] },
    BloodPressurePair {
        systolic: &'a [SeriesPoint],
        diastolic: &'a [SeriesPoint],
        range: Option<[f64; 2]>,
    },
    Medication { doses: &'a [SeriesPoint] },
    /// Daily intake above zero, output below, stacked.
    IntakeOutput {
        intake: &'a [SeriesPoint],
        output: &'a [SeriesPoint],
    },
}

impl<'a> From<&'a ObservationData> for ChartKind<'a> {
    fn from(data: &'a ObservationData) -> Self {
        match data {
            ObservationData::Numeric {
                values,
                normal_range,
            } => ChartKind::Scalar {
                values,
                normal_range: *normal_range,
            },
            ObservationData::Discrete { values } => ChartKind::Discrete { values },
            ObservationData::BloodPressure {
                systolic,
                diastolic,
                range,
            } => ChartKind::BloodPressurePair {
                systolic,
                diastolic,
                range: *range,
            },
            ObservationData::Medication { doses } => ChartKind::Medication { doses },
            ObservationData::IntakeOutput { intake, output } => {
                ChartKind::IntakeOutput { intake, output }
            }
        }
    }
}

impl ChartKind<'_> {
    /// Every x value across every series, ascending.
    pub fn timestamps(&self) -> Vec<EpochMillis> {
        let mut ts: Vec<EpochMillis> = match self {
            ChartKind::Scalar { values, .. } => xs(values).collect(),
            ChartKind::Discrete { values } => values.iter().map(|s| s.t).collect(),
            ChartKind::BloodPressurePair {
                systolic,
                diastolic,
                ..
            } => xs(systolic).chain(xs(diastolic)).collect(),
            ChartKind::Medication { doses } => xs(doses).collect(),
            ChartKind::IntakeOutput { intake, output } => xs(intake).chain(xs(output)).collect(),
        };
        ts.sort_unstable();
        ts
    }
}

fn xs(points: &[SeriesPoint]) -> impl Iterator<Item = EpochMillis> + '_ {
    points.iter().map(|p| p.x)
}

/// Timestamps a chart registers with the window controller.
pub fn series_timestamps(kind: &ChartKind<'_>) -> Vec<EpochMillis> {
    kind.timestamps()
}

/// Row presentation that does not depend on the chart kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub container_id: String,
    pub title: String,
    pub units: String,
    /// Initial x axis extent.
    pub selected: TimeWindow,
    /// Cut-off for the "most recent value" shown beside the chart.
    pub loaded: TimeWindow,
    /// Baseline band drawn before any marker is placed.
    pub default_band: PlotBand,
}

impl ChartStyle {
    pub fn for_observation(
        observation: &Observation,
        selected: TimeWindow,
        loaded: TimeWindow,
        default_band: PlotBand,
    ) -> Self {
        Self {
            container_id: container_id(observation.id.as_str()),
            title: observation.display_name.clone(),
            units: observation.units.clone(),
            selected,
            loaded,
            default_band,
        }
    }
}

/// DOM id of the element a chart renders into.
pub fn container_id(id: &str) -> String {
    format!("chart{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_cover_every_series() {
        let systolic = [SeriesPoint { x: 30, y: 120.0 }, SeriesPoint { x: 10, y: 118.0 }];
        let diastolic = [SeriesPoint { x: 20, y: 80.0 }];
        let kind = ChartKind::BloodPressurePair {
            systolic: &systolic,
            diastolic: &diastolic,
            range: None,
        };
        assert_eq!(series_timestamps(&kind), [10, 20, 30]);
    }

    #[test]
    fn discrete_timestamps() {
        let values = [
            DiscreteSample { t: 5, label: "neg".into() },
            DiscreteSample { t: 1, label: "pos".into() },
        ];
        assert_eq!(ChartKind::Discrete { values: &values }.timestamps(), [1, 5]);
    }
}
