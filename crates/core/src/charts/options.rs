use std::collections::BTreeSet;

use emr_viewer_protocol::{
    AxisConfig, ChartConfig, ChartType, DashStyle, DiscreteSample, EpochMillis, NormalRange,
    PlotBand, PlotLine, SeriesConfig, SeriesPoint, ThemeToken, TooltipFormat, ValueZone,
};

use super::{ChartKind, ChartStyle};
use crate::format::format_value;

const LAB_HEIGHT: u32 = 80;
const BLOOD_PRESSURE_HEIGHT: u32 = 120;
const INTAKE_OUTPUT_HEIGHT: u32 = 150;
const MEDICATION_BASE_HEIGHT: u32 = 60;
/// Extra height per wrapped line of a long medication name.
const MEDICATION_LINE_HEIGHT: u32 = 15;
const MEDICATION_CHARS_PER_LINE: usize = 30;

const EDGE: u32 = 6;

/// Pixel height of the chart for `kind` titled `title`.
pub fn chart_height(kind: &ChartKind<'_>, title: &str) -> u32 {
    match kind {
        ChartKind::Scalar { .. } | ChartKind::Discrete { .. } => LAB_HEIGHT,
        ChartKind::BloodPressurePair { .. } => BLOOD_PRESSURE_HEIGHT,
        ChartKind::Medication { .. } => {
            let lines = (title.chars().count() / MEDICATION_CHARS_PER_LINE) as u32;
            MEDICATION_BASE_HEIGHT + MEDICATION_LINE_HEIGHT * lines
        }
        ChartKind::IntakeOutput { .. } => INTAKE_OUTPUT_HEIGHT,
    }
}

/// Build the configuration the charting library renders for one row.
pub fn build_chart_options(kind: &ChartKind<'_>, style: &ChartStyle) -> ChartConfig {
    let mut x_axis = AxisConfig::time(style.selected);
    x_axis.plot_bands.push(style.default_band.clone());

    let mut config = ChartConfig {
        container_id: style.container_id.clone(),
        chart_type: ChartType::Scatter,
        title: style.title.clone(),
        height: chart_height(kind, &style.title),
        spacing: [EDGE, EDGE, EDGE, EDGE],
        title_offset_x: 0,
        x_axis,
        y_axis: AxisConfig {
            labels_enabled: true,
            ..AxisConfig::default()
        },
        series: Vec::new(),
        tooltip: TooltipFormat::Value,
        stacked: false,
        credits: None,
    };
    let cutoff = style.loaded.max();

    match kind {
        ChartKind::Scalar {
            values,
            normal_range,
        } => {
            config.spacing[3] = 10;
            if let (Some(low), Some(high)) = (normal_range.low, normal_range.high) {
                config
                    .y_axis
                    .plot_bands
                    .push(PlotBand::new(low, high, ThemeToken::NormalRange));
            }
            config.series.push(SeriesConfig {
                name: "numeric_values".to_owned(),
                color: None,
                marker_symbol: None,
                zones: value_zones(*normal_range),
                data: values.to_vec(),
            });
            config.credits = latest(values, cutoff)
                .map(|p| with_units(format_value(p.y), &style.units));
        }
        ChartKind::Discrete { values } => {
            let labels = category_labels(values);
            config.spacing[3] = 34;
            config.title_offset_x = -24;
            config.y_axis.labels_enabled = false;
            config.series.push(SeriesConfig {
                name: "discrete_values".to_owned(),
                color: Some(ThemeToken::DiscreteValue.css().to_owned()),
                marker_symbol: Some("square".to_owned()),
                zones: Vec::new(),
                data: values
                    .iter()
                    .map(|s| SeriesPoint {
                        x: s.t,
                        y: category_index(&labels, &s.label),
                    })
                    .collect(),
            });
            config.credits = values
                .iter()
                .filter(|s| s.t <= cutoff)
                .max_by_key(|s| s.t)
                .map(|s| with_units(s.label.clone(), &style.units));
            config.tooltip = TooltipFormat::Category { labels };
        }
        ChartKind::BloodPressurePair {
            systolic,
            diastolic,
            range,
        } => {
            if let Some([min, max]) = range {
                config.y_axis.min = Some(*min);
                config.y_axis.max = Some(*max);
            }
            config.series.push(colored("syst", ThemeToken::Systolic, systolic));
            config.series.push(colored("dias", ThemeToken::Diastolic, diastolic));
            config.tooltip = TooltipFormat::BloodPressure;
            config.credits = latest(systolic, cutoff).map(|sys| {
                let dia = diastolic
                    .iter()
                    .find(|d| d.x == sys.x)
                    .map(|d| format_value(d.y))
                    .unwrap_or_default();
                with_units(format!("{}/{dia}", format_value(sys.y)), &style.units)
            });
        }
        ChartKind::Medication { doses } => {
            config.series.push(colored("doses", ThemeToken::Dose, doses));
            config.credits =
                latest(doses, cutoff).map(|p| with_units(format_value(p.y), &style.units));
        }
        ChartKind::IntakeOutput { intake, output } => {
            config.chart_type = ChartType::Column;
            config.stacked = true;
            config.spacing[1] = 10;
            config.y_axis.plot_lines.push(PlotLine::new(
                0.0,
                ThemeToken::ZeroLine,
                DashStyle::Solid,
            ));
            let intake: Vec<_> = intake.iter().map(|p| signed(p, 1.0)).collect();
            let output: Vec<_> = output.iter().map(|p| signed(p, -1.0)).collect();
            config.series.push(colored("Intake", ThemeToken::Intake, &intake));
            config.series.push(colored("Output", ThemeToken::Output, &output));
            config.tooltip = TooltipFormat::SeriesRounded;
        }
    }

    config
}

/// Zones coloring a numeric series against its normal range.
fn value_zones(range: NormalRange) -> Vec<ValueZone> {
    let zone = |value, token: ThemeToken| ValueZone {
        value,
        color: token.css().to_owned(),
    };
    match (range.low, range.high) {
        (Some(low), Some(high)) => vec![
            zone(Some(low), ThemeToken::BelowNormal),
            zone(Some(high), ThemeToken::WithinNormal),
            zone(None, ThemeToken::AboveNormal),
        ],
        (Some(low), None) => vec![
            zone(Some(low), ThemeToken::BelowNormal),
            zone(None, ThemeToken::WithinNormal),
        ],
        (None, Some(high)) => vec![
            zone(Some(high), ThemeToken::WithinNormal),
            zone(None, ThemeToken::AboveNormal),
        ],
        (None, None) => vec![zone(None, ThemeToken::Unranged)],
    }
}

fn category_labels(values: &[DiscreteSample]) -> Vec<String> {
    values
        .iter()
        .map(|s| s.label.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

fn category_index(labels: &[String], label: &str) -> f64 {
    labels.iter().position(|l| l == label).unwrap_or(0) as f64
}

fn colored(name: &str, token: ThemeToken, data: &[SeriesPoint]) -> SeriesConfig {
    SeriesConfig {
        name: name.to_owned(),
        color: Some(token.css().to_owned()),
        marker_symbol: None,
        zones: Vec::new(),
        data: data.to_vec(),
    }
}

fn signed(point: &SeriesPoint, sign: f64) -> SeriesPoint {
    SeriesPoint {
        x: point.x,
        y: point.y.abs() * sign,
    }
}

/// Most recent point at or before `cutoff`, whatever order the points come in.
/// Ties go to the later entry.
fn latest(points: &[SeriesPoint], cutoff: EpochMillis) -> Option<&SeriesPoint> {
    points.iter().filter(|p| p.x <= cutoff).max_by_key(|p| p.x)
}

fn with_units(value: String, units: &str) -> String {
    if units.is_empty() {
        value
    } else {
        format!("{value} {units}")
    }
}

#[cfg(test)]
mod tests {
    use emr_viewer_protocol::{MARKER_ID, TimeWindow};

    use super::*;

    fn style(title: &str) -> ChartStyle {
        let loaded = TimeWindow::new(0, 1_000).unwrap();
        ChartStyle {
            container_id: "chartX".to_owned(),
            title: title.to_owned(),
            units: "mmol/L".to_owned(),
            selected: TimeWindow::new(500, 1_000).unwrap(),
            loaded,
            default_band: PlotBand::time(0, 1_000, ThemeToken::RecentBand).with_id(MARKER_ID),
        }
    }

    fn points(raw: &[(i64, f64)]) -> Vec<SeriesPoint> {
        raw.iter().map(|&(x, y)| SeriesPoint { x, y }).collect()
    }

    #[test]
    fn medication_height_grows_with_name_length() {
        let doses = points(&[(10, 1.0)]);
        let kind = ChartKind::Medication { doses: &doses };
        assert_eq!(chart_height(&kind, "short"), 60);
        assert_eq!(chart_height(&kind, &"x".repeat(29)), 60);
        assert_eq!(chart_height(&kind, &"x".repeat(30)), 75);
        assert_eq!(chart_height(&kind, &"x".repeat(61)), 90);
    }

    #[test]
    fn scalar_lab() {
        let values = points(&[(100, 3.9), (900, 4.4), (1_200, 6.0)]);
        let kind = ChartKind::Scalar {
            values: &values,
            normal_range: NormalRange {
                low: Some(3.5),
                high: Some(5.0),
            },
        };
        let config = build_chart_options(&kind, &style("Potassium"));

        assert_eq!(config.chart_type, ChartType::Scatter);
        assert_eq!(config.height, 80);
        assert_eq!(config.spacing, [6, 6, 6, 10]);
        assert_eq!(config.x_axis.min, Some(500.0));
        assert_eq!(config.x_axis.max, Some(1_000.0));
        assert_eq!(config.x_axis.plot_bands[0].id.as_deref(), Some(MARKER_ID));
        assert_eq!(config.y_axis.plot_bands[0].from, 3.5);
        assert_eq!(config.series[0].zones.len(), 3);
        assert_eq!(config.series[0].zones[0].color, "#00CCFF");
        // The point after the loaded window is not "most recent".
        assert_eq!(config.credits.as_deref(), Some("4.4 mmol/L"));
    }

    #[test]
    fn credits_pick_the_newest_reading_in_unsorted_series() {
        let values = points(&[(900, 5.6), (1_500, 9.9), (100, 3.2)]);
        let kind = ChartKind::Scalar {
            values: &values,
            normal_range: NormalRange::default(),
        };
        let config = build_chart_options(&kind, &style("K"));
        assert_eq!(config.credits.as_deref(), Some("5.6 mmol/L"));

        let samples = vec![
            DiscreteSample { t: 700, label: "positive".into() },
            DiscreteSample { t: 1_200, label: "pending".into() },
            DiscreteSample { t: 300, label: "negative".into() },
        ];
        let config =
            build_chart_options(&ChartKind::Discrete { values: &samples }, &style("Cx"));
        assert_eq!(config.credits.as_deref(), Some("positive mmol/L"));
    }

    #[test]
    fn scalar_without_range_is_black() {
        let values = points(&[(100, 1.0)]);
        let kind = ChartKind::Scalar {
            values: &values,
            normal_range: NormalRange::default(),
        };
        let config = build_chart_options(&kind, &style("X"));
        assert_eq!(config.series[0].zones.len(), 1);
        assert_eq!(config.series[0].zones[0].color, "#000000");
        assert!(config.y_axis.plot_bands.is_empty());
    }

    #[test]
    fn discrete_lab_uses_category_axis() {
        let values = vec![
            DiscreteSample { t: 100, label: "positive".into() },
            DiscreteSample { t: 200, label: "negative".into() },
        ];
        let config = build_chart_options(&ChartKind::Discrete { values: &values }, &style("Cx"));
        assert_eq!(config.spacing[3], 34);
        assert_eq!(config.title_offset_x, -24);
        assert!(!config.y_axis.labels_enabled);
        assert_eq!(
            config.tooltip,
            TooltipFormat::Category {
                labels: vec!["negative".into(), "positive".into()]
            }
        );
        assert_eq!(config.series[0].data[0].y, 1.0);
        assert_eq!(config.credits.as_deref(), Some("negative mmol/L"));
    }

    #[test]
    fn blood_pressure_pair() {
        let systolic = points(&[(100, 120.0)]);
        let diastolic = points(&[(100, 80.0)]);
        let kind = ChartKind::BloodPressurePair {
            systolic: &systolic,
            diastolic: &diastolic,
            range: Some([40.0, 200.0]),
        };
        let mut s = style("BP");
        s.units = String::new();
        let config = build_chart_options(&kind, &s);
        assert_eq!(config.height, 120);
        assert_eq!(config.y_axis.min, Some(40.0));
        assert_eq!(config.series[0].name, "syst");
        assert_eq!(config.series[1].name, "dias");
        assert_eq!(config.credits.as_deref(), Some("120/80"));
    }

    #[test]
    fn intake_output_is_stacked_around_zero() {
        let intake = points(&[(100, 500.0)]);
        let output = points(&[(100, 300.0)]);
        let kind = ChartKind::IntakeOutput {
            intake: &intake,
            output: &output,
        };
        let config = build_chart_options(&kind, &style("I/O"));
        assert_eq!(config.chart_type, ChartType::Column);
        assert!(config.stacked);
        assert_eq!(config.height, 150);
        assert_eq!(config.y_axis.plot_lines[0].value, 0.0);
        assert_eq!(config.series[1].data[0].y, -300.0);
        assert_eq!(config.tooltip, TooltipFormat::SeriesRounded);
        assert_eq!(config.credits, None);
    }
}
