use std::collections::HashSet;

use emr_viewer_protocol::{ChartId, EpochMillis, TimeWindow};
use indexmap::IndexMap;

use super::handle::ChartHandle;

/// A chart taking part in window synchronization.
#[derive(Debug)]
pub struct ChartRegistration<C> {
    chart: C,
    /// x values across every series of the chart.
    timestamps: Vec<EpochMillis>,
    /// Visibility decided by the last resynchronization, `None` before the first.
    visible: Option<bool>,
}

impl<C> ChartRegistration<C> {
    pub fn chart(&self) -> &C {
        &self.chart
    }

    pub fn timestamps(&self) -> &[EpochMillis] {
        &self.timestamps
    }

    pub fn visible(&self) -> Option<bool> {
        self.visible
    }
}

/// Outcome of one resynchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub visible: usize,
    pub hidden: usize,
    /// Charts where at least one library call failed.
    pub failed: usize,
}

/// Keeps every registered chart's x axis and visibility consistent with the
/// selected time window.
///
/// A chart is shown iff it has at least one timestamp inside the selected
/// window (inclusive) and, while the highlight filter is active, its id is in
/// the filter set. Registration order is preserved and is the order charts are
/// visited in.
#[derive(Debug)]
pub struct TimeWindowController<C> {
    charts: IndexMap<ChartId, ChartRegistration<C>>,
    selected: TimeWindow,
    loaded: TimeWindow,
    highlight_only: Option<HashSet<ChartId>>,
}

impl<C: ChartHandle> TimeWindowController<C> {
    /// Start with the selected window equal to the loaded one.
    pub fn new(loaded: TimeWindow) -> Self {
        Self {
            charts: IndexMap::new(),
            selected: loaded,
            loaded,
            highlight_only: None,
        }
    }

    /// Add a chart to the synchronized set.
    ///
    /// Registering an id twice replaces the earlier chart in place.
    pub fn register(&mut self, id: ChartId, chart: C, timestamps: Vec<EpochMillis>) {
        let registration = ChartRegistration {
            chart,
            timestamps,
            visible: None,
        };
        if let Some(previous) = self.charts.get_mut(&id) {
            log::warn!("chart {id} registered twice, replacing the earlier registration");
            *previous = registration;
        } else {
            log::debug!("registered chart {id} ({} points)", registration.timestamps.len());
            self.charts.insert(id, registration);
        }
    }

    pub fn unregister(&mut self, id: &str) -> Option<C> {
        self.charts.shift_remove(id).map(|r| r.chart)
    }

    /// Drop every registration (case or page teardown).
    pub fn clear(&mut self) {
        self.charts.clear();
    }

    pub fn selected(&self) -> TimeWindow {
        self.selected
    }

    pub fn loaded(&self) -> TimeWindow {
        self.loaded
    }

    /// Replace the loaded window. Does not touch the selected window.
    pub fn set_loaded(&mut self, loaded: TimeWindow) {
        self.loaded = loaded;
    }

    pub fn set_window(&mut self, window: TimeWindow) -> SyncSummary {
        self.selected = window;
        self.resynchronize()
    }

    /// Recompute visibility and axis extremes of every chart from the
    /// selected window.
    ///
    /// Library failures are logged and counted; they never stop the pass.
    pub fn resynchronize(&mut self) -> SyncSummary {
        let window = self.selected;
        let mut summary = SyncSummary::default();

        for (id, reg) in &mut self.charts {
            let has_data = window.any_within(&reg.timestamps);
            let passes_filter = self
                .highlight_only
                .as_ref()
                .is_none_or(|selected| selected.contains(id));

            if !(has_data && passes_filter) {
                reg.chart.set_visible(false);
                reg.visible = Some(false);
                summary.hidden += 1;
                continue;
            }

            let mut failed = false;
            if let Err(e) = reg.chart.set_extremes(window) {
                log::warn!("chart {id}: set_extremes failed: {e}");
                failed = true;
            }
            reg.chart.set_visible(true);
            if let Err(e) = reg.chart.reflow() {
                log::warn!("chart {id}: reflow failed: {e}");
                failed = true;
            }
            reg.visible = Some(true);
            summary.visible += 1;
            if failed {
                summary.failed += 1;
            }
        }

        log::debug!(
            "resynchronized [{}, {}]: {} visible, {} hidden, {} failed",
            window.min(),
            window.max(),
            summary.visible,
            summary.hidden,
            summary.failed
        );
        summary
    }

    /// Restrict visibility to `selected` ids (on top of the data test) when
    /// `active_only` is set, then resynchronize.
    pub fn apply_highlight_filter(
        &mut self,
        active_only: bool,
        selected: &HashSet<ChartId>,
    ) -> SyncSummary {
        self.highlight_only = active_only.then(|| selected.clone());
        self.resynchronize()
    }

    pub fn highlight_filter_active(&self) -> bool {
        self.highlight_only.is_some()
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.charts.contains_key(id)
    }

    pub fn registration(&self, id: &str) -> Option<&ChartRegistration<C>> {
        self.charts.get(id)
    }

    pub fn chart(&self, id: &str) -> Option<&C> {
        self.charts.get(id).map(|r| &r.chart)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.charts.get(id).and_then(|r| r.visible) == Some(true)
    }

    pub fn visible_ids(&self) -> Vec<&ChartId> {
        self.charts
            .iter()
            .filter(|(_, r)| r.visible == Some(true))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ChartId> {
        self.charts.keys()
    }

    /// Visit every chart in registration order.
    pub fn for_each_chart(&mut self, mut f: impl FnMut(&ChartId, &mut C)) {
        for (id, reg) in &mut self.charts {
            f(id, &mut reg.chart);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingChart;

    fn window(min: i64, max: i64) -> TimeWindow {
        TimeWindow::new(min, max).unwrap()
    }

    fn two_charts() -> TimeWindowController<RecordingChart> {
        let mut ctl = TimeWindowController::new(window(0, 3000));
        ctl.register("A".into(), RecordingChart::default(), vec![100, 500, 900]);
        ctl.register("B".into(), RecordingChart::default(), vec![2000, 2100]);
        ctl
    }

    #[test]
    fn shows_only_charts_with_data_in_window() {
        let mut ctl = two_charts();

        let summary = ctl.set_window(window(0, 1000));
        assert_eq!(summary, SyncSummary { visible: 1, hidden: 1, failed: 0 });
        assert!(ctl.is_visible("A"));
        assert!(!ctl.is_visible("B"));
        assert_eq!(ctl.chart("A").unwrap().extremes, Some(window(0, 1000)));
        assert_eq!(ctl.chart("B").unwrap().extremes, None);

        ctl.set_window(window(1900, 2200));
        assert!(!ctl.is_visible("A"));
        assert!(ctl.is_visible("B"));
        assert_eq!(ctl.chart("B").unwrap().extremes, Some(window(1900, 2200)));
        // Hidden charts keep their previous extremes.
        assert_eq!(ctl.chart("A").unwrap().extremes, Some(window(0, 1000)));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let mut ctl = two_charts();
        ctl.set_window(window(900, 2000));
        assert!(ctl.is_visible("A"));
        assert!(ctl.is_visible("B"));
    }

    #[test]
    fn resynchronize_is_idempotent() {
        let mut ctl = two_charts();
        ctl.set_window(window(0, 1000));
        let first: Vec<_> = ctl.visible_ids().into_iter().cloned().collect();
        let first_extremes = ctl.chart("A").unwrap().extremes;

        ctl.resynchronize();
        let second: Vec<_> = ctl.visible_ids().into_iter().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(ctl.chart("A").unwrap().extremes, first_extremes);
    }

    #[test]
    fn visible_charts_are_reflowed() {
        let mut ctl = two_charts();
        ctl.set_window(window(0, 1000));
        assert_eq!(ctl.chart("A").unwrap().reflows, 1);
        assert_eq!(ctl.chart("B").unwrap().reflows, 0);
    }

    #[test]
    fn empty_timestamps_always_hidden() {
        let mut ctl = TimeWindowController::new(window(0, 10));
        ctl.register("empty".into(), RecordingChart::default(), Vec::new());
        ctl.set_window(window(i64::MIN, i64::MAX));
        assert!(!ctl.is_visible("empty"));
        assert_eq!(ctl.chart("empty").unwrap().visible, Some(false));
    }

    #[test]
    fn highlight_filter_is_an_and() {
        let mut ctl = two_charts();
        ctl.register("C".into(), RecordingChart::default(), vec![300]);
        ctl.set_window(window(0, 1000));

        let selected: HashSet<ChartId> = ["C".into(), "B".into()].into_iter().collect();
        ctl.apply_highlight_filter(true, &selected);
        // A has data but is not selected; B is selected but has no data.
        assert!(!ctl.is_visible("A"));
        assert!(!ctl.is_visible("B"));
        assert!(ctl.is_visible("C"));

        ctl.apply_highlight_filter(false, &selected);
        assert!(ctl.is_visible("A"));
        assert!(!ctl.highlight_filter_active());
    }

    #[test]
    fn failing_chart_does_not_stop_the_pass() {
        let mut ctl = TimeWindowController::new(window(0, 10));
        ctl.register("broken".into(), RecordingChart::failing(), vec![5]);
        ctl.register("ok".into(), RecordingChart::default(), vec![5]);

        let summary = ctl.set_window(window(0, 10));
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.visible, 2);
        assert_eq!(ctl.chart("ok").unwrap().extremes, Some(window(0, 10)));
    }

    #[test]
    fn duplicate_registration_replaces_in_place() {
        let mut ctl = two_charts();
        ctl.register("A".into(), RecordingChart::default(), vec![2050]);
        assert_eq!(ctl.len(), 2);
        let order: Vec<_> = ctl.ids().map(ChartId::as_str).collect();
        assert_eq!(order, ["A", "B"]);

        ctl.set_window(window(2000, 2100));
        assert!(ctl.is_visible("A"));
    }

    #[test]
    fn unregister_and_clear() {
        let mut ctl = two_charts();
        assert!(ctl.unregister("A").is_some());
        assert!(ctl.unregister("A").is_none());
        assert!(!ctl.contains("A"));
        ctl.clear();
        assert!(ctl.is_empty());
    }
}
