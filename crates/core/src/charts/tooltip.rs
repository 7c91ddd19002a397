use emr_viewer_protocol::{ChartConfig, EpochMillis, TooltipFormat};

use crate::format::format_value;

/// Tooltip text for the point at `(x, y)` in series `series_index` of a chart
/// built from `config`.
pub fn format_tooltip(
    config: &ChartConfig,
    series_index: usize,
    x: EpochMillis,
    y: f64,
) -> String {
    match &config.tooltip {
        TooltipFormat::Value => format_value(y),
        TooltipFormat::Category { labels } => {
            let index = y.round();
            if index >= 0.0 {
                if let Some(label) = labels.get(index as usize) {
                    return label.clone();
                }
            }
            format_value(y)
        }
        TooltipFormat::BloodPressure => {
            let at = |series: usize| {
                config
                    .series
                    .get(series)
                    .and_then(|s| s.data.iter().find(|p| p.x == x))
                    .map(|p| format_value(p.y))
            };
            match (at(0), at(1)) {
                (Some(sys), Some(dia)) => format!("{sys}/{dia}"),
                _ => format_value(y),
            }
        }
        TooltipFormat::SeriesRounded => {
            let name = config
                .series
                .get(series_index)
                .map(|s| s.name.as_str())
                .unwrap_or_default();
            format!("{name} | {}", format_value(y.round()))
        }
    }
}

#[cfg(test)]
mod tests {
    use emr_viewer_protocol::{PlotBand, SeriesPoint, ThemeToken, TimeWindow};

    use super::*;
    use crate::charts::{ChartKind, ChartStyle, build_chart_options};

    fn style() -> ChartStyle {
        let w = TimeWindow::new(0, 1_000).unwrap();
        ChartStyle {
            container_id: "c".into(),
            title: "t".into(),
            units: String::new(),
            selected: w,
            loaded: w,
            default_band: PlotBand::time(0, 1_000, ThemeToken::RecentBand),
        }
    }

    #[test]
    fn blood_pressure_shows_both_values() {
        let sys = [SeriesPoint { x: 10, y: 131.0 }];
        let dia = [SeriesPoint { x: 10, y: 79.0 }];
        let config = build_chart_options(
            &ChartKind::BloodPressurePair {
                systolic: &sys,
                diastolic: &dia,
                range: None,
            },
            &style(),
        );
        assert_eq!(format_tooltip(&config, 1, 10, 79.0), "131/79");
    }

    #[test]
    fn intake_output_rounds() {
        let intake = [SeriesPoint { x: 10, y: 250.4 }];
        let output = [SeriesPoint { x: 10, y: 100.0 }];
        let config = build_chart_options(
            &ChartKind::IntakeOutput {
                intake: &intake,
                output: &output,
            },
            &style(),
        );
        assert_eq!(format_tooltip(&config, 0, 10, 250.4), "Intake | 250");
        assert_eq!(format_tooltip(&config, 1, 10, -100.0), "Output | -100");
    }

    #[test]
    fn category_out_of_range_falls_back_to_value() {
        let mut config = build_chart_options(&ChartKind::Medication { doses: &[] }, &style());
        config.tooltip = TooltipFormat::Category {
            labels: vec!["neg".into()],
        };
        assert_eq!(format_tooltip(&config, 0, 0, 0.0), "neg");
        assert_eq!(format_tooltip(&config, 0, 0, 3.0), "3");
        assert_eq!(format_tooltip(&config, 0, 0, -1.0), "-1");
    }
}
