use emr_viewer_protocol::{
    DashStyle, EpochMillis, MARKER_ID, PlotBand, PlotLine, ThemeToken, TimeWindow,
};

use super::handle::ChartHandle;
use super::window::TimeWindowController;
use crate::config::{DAY_MS, ViewerConfig};

/// The single shared annotation drawn on every chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Dashed vertical line.
    Point { at: EpochMillis },
    /// Shaded day, `[start, end)`.
    Band { start: EpochMillis, end: EpochMillis },
}

/// Result of placing a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub marker: Marker,
    /// New selected window when the marker fell outside the old one. The
    /// charts are already synchronized to it; the host should move its master
    /// range selector there.
    pub widened: Option<TimeWindow>,
}

/// Start and end of the day band containing `t`.
///
/// `%` truncates toward zero, so timestamps before the epoch floor toward
/// zero as well. Both ends saturate at the `i64` limits.
pub fn day_band(t: EpochMillis, offset_ms: i64) -> (EpochMillis, EpochMillis) {
    let start = (t - (t % DAY_MS)).saturating_add(offset_ms);
    (start, start.saturating_add(DAY_MS))
}

/// Places, replaces and clears the shared marker across all charts.
#[derive(Debug, Clone)]
pub struct MarkerController {
    active: Option<Marker>,
    day_band_offset_ms: i64,
    recent_band_ms: i64,
}

impl MarkerController {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            active: None,
            day_band_offset_ms: config.day_band_offset_ms,
            recent_band_ms: config.recent_band_ms,
        }
    }

    pub fn active(&self) -> Option<Marker> {
        self.active
    }

    /// The baseline "most recent data" band shown when no marker is placed.
    pub fn default_band(&self, loaded: TimeWindow) -> PlotBand {
        PlotBand::time(
            loaded.max().saturating_sub(self.recent_band_ms),
            loaded.max(),
            ThemeToken::RecentBand,
        )
        .with_id(MARKER_ID)
    }

    pub fn place_point<C: ChartHandle>(
        &mut self,
        t: EpochMillis,
        charts: &mut TimeWindowController<C>,
    ) -> Placement {
        remove_shared(charts);
        let line =
            PlotLine::new(t as f64, ThemeToken::MarkerLine, DashStyle::Dash).with_id(MARKER_ID);
        charts.for_each_chart(|id, chart| {
            if let Err(e) = chart.add_plot_line(&line) {
                log::warn!("chart {id}: add_plot_line failed: {e}");
            }
        });

        let marker = Marker::Point { at: t };
        self.active = Some(marker);
        log::debug!("placed point marker at {t}");
        Placement {
            marker,
            widened: widen(charts, t, t),
        }
    }

    pub fn place_band<C: ChartHandle>(
        &mut self,
        t: EpochMillis,
        charts: &mut TimeWindowController<C>,
    ) -> Placement {
        let (start, end) = day_band(t, self.day_band_offset_ms);
        remove_shared(charts);
        let band = PlotBand::time(start, end, ThemeToken::DayBand).with_id(MARKER_ID);
        charts.for_each_chart(|id, chart| {
            if let Err(e) = chart.add_plot_band(&band) {
                log::warn!("chart {id}: add_plot_band failed: {e}");
            }
        });

        let marker = Marker::Band { start, end };
        self.active = Some(marker);
        log::debug!("placed day band [{start}, {end})");
        Placement {
            marker,
            widened: widen(charts, start, end),
        }
    }

    /// Remove the marker from every chart, optionally putting the default
    /// recent-data band back in its place.
    pub fn clear_marker<C: ChartHandle>(
        &mut self,
        restore_default_band: bool,
        charts: &mut TimeWindowController<C>,
    ) {
        remove_shared(charts);
        if restore_default_band {
            let band = self.default_band(charts.loaded());
            charts.for_each_chart(|id, chart| {
                if let Err(e) = chart.add_plot_band(&band) {
                    log::warn!("chart {id}: add_plot_band failed: {e}");
                }
            });
        }
        self.active = None;
    }
}

fn remove_shared<C: ChartHandle>(charts: &mut TimeWindowController<C>) {
    charts.for_each_chart(|id, chart| {
        if let Err(e) = chart.remove_plot_line(MARKER_ID) {
            log::warn!("chart {id}: remove_plot_line failed: {e}");
        }
    });
}

fn widen<C: ChartHandle>(
    charts: &mut TimeWindowController<C>,
    from: EpochMillis,
    to: EpochMillis,
) -> Option<TimeWindow> {
    let widened = charts.selected().widened_to(from, to)?;
    charts.set_window(widened);
    Some(widened)
}
