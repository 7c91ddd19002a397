use emr_viewer_protocol::{CasePayload, ChartConfig, ChartId, EpochMillis, TimeWindow};

use super::ratings::{RatingKind, Ratings};
use super::selection::SelectionStore;
use crate::charts::{ChartKind, ChartStyle, build_chart_options, series_timestamps};
use crate::config::{SavePolicy, ViewerConfig};
use crate::error::{CaseError, ViewerError};
use crate::format::LabelFormatter;
use crate::request::{RequestError, StudyContext, StudyRequest, TaskEvent};
use crate::sync::{
    ChartHandle, ContinueState, Marker, MarkerController, PageView, RangeGate, SyncSummary,
    TimeWindowController,
};

/// Where the participant goes after the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The given step is now loaded.
    NextStep(usize),
    /// No steps left; the case should be saved and marked complete.
    CaseComplete,
}

/// What the page should do once a save has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    /// Stay on the page and show the message.
    Stay(String),
}

/// The initial selected window for a step: the last `span_ms` of the loaded
/// window, clamped to its start.
pub fn default_window(loaded: TimeWindow, span_ms: i64) -> TimeWindow {
    let min = loaded.min().max(loaded.max().saturating_sub(span_ms));
    TimeWindow::new(min, loaded.max()).unwrap_or(loaded)
}

/// All viewer state for one case shown on one page.
///
/// Hosts feed page events in through the `on_*` methods. Whenever an event
/// moves the selected window on the Rust side, the new window is returned so
/// the host can move its master range selector without re-entering the
/// session.
pub struct InterfaceSession<C, V> {
    config: ViewerConfig,
    case: CasePayload,
    context: StudyContext,
    step: usize,
    charts: TimeWindowController<C>,
    markers: MarkerController,
    selection: SelectionStore,
    ratings: Ratings,
    gate: RangeGate,
    labels: LabelFormatter,
    view: V,
    highlight_only: bool,
}

impl<C: ChartHandle, V: PageView> InterfaceSession<C, V> {
    /// Open `case` at its first step.
    pub fn new(
        config: ViewerConfig,
        case: CasePayload,
        context: StudyContext,
        view: V,
    ) -> Result<Self, ViewerError> {
        let loaded = step_window(&case, 0)?;
        let mut session = Self {
            charts: TimeWindowController::new(loaded),
            markers: MarkerController::new(&config),
            selection: SelectionStore::new(config.task_mode),
            ratings: Ratings::default(),
            gate: RangeGate::new(),
            labels: LabelFormatter::new(config.utc_offset_minutes),
            config,
            case,
            context,
            step: 0,
            view,
            highlight_only: false,
        };
        session.set_window(default_window(loaded, session.config.initial_span_ms));
        let pending = !session.ratings.covers(&session.config.required_ratings);
        session
            .selection
            .set_ratings_pending(pending, &mut session.view);
        log::info!(
            "opened case {} ({} steps, {} observations)",
            session.case.case_id,
            session.case.steps.len(),
            session.case.observations.len()
        );
        Ok(session)
    }

    /// Configurations for every observation row of the case, in payload order.
    pub fn chart_configs(&self) -> Vec<(ChartId, ChartConfig)> {
        let selected = self.charts.selected();
        let loaded = self.charts.loaded();
        let band = self.markers.default_band(loaded);
        self.case
            .observations
            .iter()
            .map(|obs| {
                let style = ChartStyle::for_observation(obs, selected, loaded, band.clone());
                let kind = ChartKind::from(&obs.data);
                (obs.id.clone(), build_chart_options(&kind, &style))
            })
            .collect()
    }

    /// Register a constructed chart for observation `id`.
    ///
    /// An id with no observation in the case registers with no timestamps and
    /// stays hidden.
    pub fn register_chart(&mut self, id: ChartId, chart: C) {
        let timestamps = match self.case.observation(id.as_str()) {
            Some(obs) => series_timestamps(&ChartKind::from(&obs.data)),
            None => {
                log::debug!("chart {id} has no observation in case {}", self.case.case_id);
                Vec::new()
            }
        };
        self.charts.register(id, chart, timestamps);
    }

    /// Register a chart whose timestamps the host computed itself.
    pub fn register_chart_with_timestamps(
        &mut self,
        id: ChartId,
        chart: C,
        timestamps: Vec<EpochMillis>,
    ) {
        self.charts.register(id, chart, timestamps);
    }

    pub fn unregister_chart(&mut self, id: &str) -> Option<C> {
        self.charts.unregister(id)
    }

    /// Drop every chart, e.g. before the page is torn down.
    pub fn teardown(&mut self) {
        self.charts.clear();
    }

    /// Synchronize after the initial batch of charts is registered.
    pub fn finish_loading(&mut self) -> SyncSummary {
        self.charts.resynchronize()
    }

    pub fn set_window(&mut self, window: TimeWindow) -> SyncSummary {
        let summary = self.charts.set_window(window);
        self.view.set_range_label(&self.labels.range(window));
        summary
    }

    /// Range change from the master selector. Held while a drag is in
    /// progress; `None` when nothing was applied.
    pub fn on_range_changed(&mut self, window: TimeWindow) -> Option<SyncSummary> {
        let window = self.gate.offer(window)?;
        Some(self.set_window(window))
    }

    pub fn on_pointer_down(&mut self) {
        self.gate.pointer_down();
    }

    /// Applies the range change held during the drag, if any.
    pub fn on_pointer_up(&mut self) -> Option<SyncSummary> {
        let window = self.gate.pointer_up()?;
        Some(self.set_window(window))
    }

    /// Place a point marker at `t`. Returns the widened window, if any.
    pub fn on_point_clicked(&mut self, t: EpochMillis) -> Option<TimeWindow> {
        let placement = self.markers.place_point(t, &mut self.charts);
        self.after_placement(placement.marker, placement.widened)
    }

    /// Place the day band containing `t`. Returns the widened window, if any.
    pub fn on_band_requested(&mut self, t: EpochMillis) -> Option<TimeWindow> {
        let placement = self.markers.place_band(t, &mut self.charts);
        self.after_placement(placement.marker, placement.widened)
    }

    fn after_placement(
        &mut self,
        marker: Marker,
        widened: Option<TimeWindow>,
    ) -> Option<TimeWindow> {
        let label = match marker {
            Marker::Point { at } => self.labels.date_time(at),
            Marker::Band { start, .. } => self.labels.date(start),
        };
        self.view.set_marker_label(&label);
        self.view.set_marker_indicator(true);
        if let Some(window) = widened {
            self.view.set_range_label(&self.labels.range(window));
        }
        widened
    }

    pub fn clear_marker(&mut self, restore_default_band: bool) {
        self.markers
            .clear_marker(restore_default_band, &mut self.charts);
        self.view.set_marker_label("");
        self.view.set_marker_indicator(false);
    }

    /// Toggle selection of a row. Returns `true` if it is now selected.
    pub fn on_row_clicked(&mut self, id: &ChartId) -> bool {
        let selected = self.selection.toggle(id, &mut self.view);
        if self.highlight_only {
            self.charts
                .apply_highlight_filter(true, self.selection.as_set());
        }
        selected
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear(&mut self.view);
        if self.highlight_only {
            self.charts
                .apply_highlight_filter(true, self.selection.as_set());
        }
    }

    /// Record one of the participant's ratings and re-evaluate the continue
    /// button.
    pub fn set_rating(&mut self, kind: RatingKind, value: u8) -> Result<(), ViewerError> {
        self.ratings.set(kind, value)?;
        log::debug!("case {}: {kind} rated {value}", self.context.case_id);
        let pending = !self.ratings.covers(&self.config.required_ratings);
        self.selection.set_ratings_pending(pending, &mut self.view);
        Ok(())
    }

    /// Show only selected rows (on top of the data-in-window test).
    pub fn set_highlight_filter(&mut self, active: bool) -> SyncSummary {
        self.highlight_only = active;
        self.charts
            .apply_highlight_filter(active, self.selection.as_set())
    }

    /// Show step `step` of the case: new loaded window, default selection,
    /// default band.
    pub fn load_step(&mut self, step: usize) -> Result<SyncSummary, ViewerError> {
        let loaded = step_window(&self.case, step)?;
        self.step = step;
        self.charts.set_loaded(loaded);
        self.clear_marker(true);
        let summary = self.set_window(default_window(loaded, self.config.initial_span_ms));
        self.selection.refresh(&mut self.view);
        log::info!(
            "case {}: step {}/{}",
            self.case.case_id,
            step + 1,
            self.case.steps.len()
        );
        Ok(summary)
    }

    /// Move to the next step, or report that the case is done.
    pub fn advance(&mut self) -> Result<Advance, ViewerError> {
        let next = self.step + 1;
        if next < self.case.steps.len() {
            self.load_step(next)?;
            Ok(Advance::NextStep(next))
        } else {
            Ok(Advance::CaseComplete)
        }
    }

    pub fn save_request(&self) -> Result<StudyRequest, ViewerError> {
        StudyRequest::save_selection(&self.config, &self.context, &self.selection.ids())
    }

    /// Selection and ratings as recorded at `at`.
    pub fn responses_request(&self, at: EpochMillis) -> Result<StudyRequest, ViewerError> {
        StudyRequest::save_responses(
            &self.config,
            &self.context,
            at,
            &self.selection.ids(),
            &self.ratings,
        )
    }

    pub fn task_event_request(
        &self,
        event: TaskEvent,
        at: EpochMillis,
    ) -> Result<StudyRequest, ViewerError> {
        StudyRequest::task_event(&self.config, &self.context, at, event)
    }

    pub fn complete_request(&self) -> StudyRequest {
        StudyRequest::mark_complete(&self.config, &self.context)
    }

    /// Decide navigation once a save finished, per the configured policy.
    pub fn after_save(&self, result: Result<(), RequestError>) -> Navigation {
        let Err(e) = result else {
            return Navigation::Proceed;
        };
        match self.config.save_policy {
            SavePolicy::BlockOnFailure => {
                log::error!("saving case {} failed: {e}", self.context.case_id);
                Navigation::Stay(format!("Saving failed: {e}"))
            }
            SavePolicy::NavigateAnyway => {
                log::warn!(
                    "saving case {} failed, navigating anyway: {e}",
                    self.context.case_id
                );
                Navigation::Proceed
            }
        }
    }

    /// Whether the continue button may be used.
    pub fn can_continue(&self) -> bool {
        self.selection.continue_state() != ContinueState::Blocked
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn case(&self) -> &CasePayload {
        &self.case
    }

    pub fn context(&self) -> &StudyContext {
        &self.context
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn step_count(&self) -> usize {
        self.case.steps.len()
    }

    pub fn selected_window(&self) -> TimeWindow {
        self.charts.selected()
    }

    pub fn loaded_window(&self) -> TimeWindow {
        self.charts.loaded()
    }

    pub fn charts(&self) -> &TimeWindowController<C> {
        &self.charts
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn ratings(&self) -> &Ratings {
        &self.ratings
    }

    pub fn active_marker(&self) -> Option<Marker> {
        self.markers.active()
    }

    pub fn highlight_filter_active(&self) -> bool {
        self.highlight_only
    }

    pub fn is_dragging(&self) -> bool {
        self.gate.is_dragging()
    }

    pub fn labels(&self) -> &LabelFormatter {
        &self.labels
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}

fn step_window(case: &CasePayload, step: usize) -> Result<TimeWindow, CaseError> {
    if case.steps.is_empty() {
        return Err(CaseError::NoSteps);
    }
    let s = case.step(step).ok_or(CaseError::UnknownStep {
        step,
        count: case.steps.len(),
    })?;
    s.window()
        .map_err(|source| CaseError::StepWindow { step, source })
}

#[cfg(test)]
mod tests {
    use emr_viewer_protocol::{CaseStep, Observation, ObservationData, SeriesPoint};

    use super::*;
    use crate::testing::{RecordingChart, RecordingView};

    const HOUR: i64 = 3_600_000;

    fn numeric(id: &str, xs: &[i64]) -> Observation {
        Observation {
            id: id.into(),
            display_name: id.to_owned(),
            group: String::new(),
            units: String::new(),
            data: ObservationData::Numeric {
                values: xs.iter().map(|&x| SeriesPoint { x, y: 1.0 }).collect(),
                normal_range: Default::default(),
            },
        }
    }

    fn case() -> CasePayload {
        CasePayload {
            case_id: "c1".into(),
            steps: vec![
                CaseStep { min_t: 0, max_t: 100 * HOUR },
                CaseStep { min_t: 0, max_t: 200 * HOUR },
            ],
            observations: vec![numeric("A", &[10 * HOUR, 90 * HOUR]), numeric("B", &[150 * HOUR])],
        }
    }

    fn context() -> StudyContext {
        StudyContext {
            study_id: "s".into(),
            user_id: "u".into(),
            case_id: "c1".into(),
        }
    }

    fn session(config: ViewerConfig) -> InterfaceSession<RecordingChart, RecordingView> {
        let mut s = InterfaceSession::new(config, case(), context(), RecordingView::default())
            .unwrap();
        for id in ["A", "B"] {
            s.register_chart(id.into(), RecordingChart::default());
        }
        s.finish_loading();
        s
    }

    #[test]
    fn default_window_clamps_to_loaded_start() {
        let loaded = TimeWindow::new(1_000, 5_000).unwrap();
        assert_eq!(default_window(loaded, 10_000), loaded);
        assert_eq!(
            default_window(loaded, 1_500),
            TimeWindow::new(3_500, 5_000).unwrap()
        );
    }

    #[test]
    fn opens_on_the_last_initial_span() {
        let s = session(ViewerConfig::default());
        assert_eq!(s.selected_window(), TimeWindow::new(40 * HOUR, 100 * HOUR).unwrap());
        assert!(s.charts().is_visible("A"));
        assert!(!s.charts().is_visible("B"));
        assert_eq!(s.view().range_label, "01/02 16:00 to 01/05 04:00");
    }

    #[test]
    fn rejects_case_without_steps() {
        let mut payload = case();
        payload.steps.clear();
        let result = InterfaceSession::<RecordingChart, _>::new(
            ViewerConfig::default(),
            payload,
            context(),
            RecordingView::default(),
        );
        assert!(matches!(result, Err(ViewerError::Case(CaseError::NoSteps))));
    }

    #[test]
    fn chart_configs_follow_payload_order() {
        let s = session(ViewerConfig::default());
        let configs = s.chart_configs();
        let ids: Vec<_> = configs.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(configs[0].1.container_id, "chartA");
        assert_eq!(configs[0].1.x_axis.min, Some((40 * HOUR) as f64));
    }

    #[test]
    fn point_click_updates_labels_and_widens() {
        let mut s = session(ViewerConfig::default());
        let widened = s.on_point_clicked(5 * HOUR);
        assert_eq!(widened, Some(TimeWindow::new(5 * HOUR, 100 * HOUR).unwrap()));
        assert_eq!(s.view().marker_label, "01/01 05:00");
        assert!(s.view().marker_active);
        assert!(s.view().range_label.starts_with("01/01 05:00"));

        s.clear_marker(true);
        assert!(!s.view().marker_active);
        assert_eq!(s.active_marker(), None);
    }

    #[test]
    fn band_label_is_the_day() {
        let mut s = session(ViewerConfig::default());
        assert_eq!(s.on_band_requested(50 * HOUR), None);
        assert_eq!(s.view().marker_label, "01/03");
    }

    #[test]
    fn highlight_filter_tracks_selection() {
        let mut s = session(ViewerConfig::default());
        s.set_highlight_filter(true);
        assert!(!s.charts().is_visible("A"));

        s.on_row_clicked(&"A".into());
        assert!(s.charts().is_visible("A"));

        s.clear_selection();
        assert!(!s.charts().is_visible("A"));

        s.set_highlight_filter(false);
        assert!(s.charts().is_visible("A"));
    }

    #[test]
    fn advance_through_steps() {
        let mut s = session(ViewerConfig::default());
        s.on_point_clicked(20 * HOUR);

        assert_eq!(s.advance().unwrap(), Advance::NextStep(1));
        assert_eq!(s.loaded_window().max(), 200 * HOUR);
        assert_eq!(s.selected_window(), TimeWindow::new(140 * HOUR, 200 * HOUR).unwrap());
        assert_eq!(s.active_marker(), None);
        assert!(s.charts().is_visible("B"));
        assert!(!s.charts().is_visible("A"));
        let band = &s.charts().chart("B").unwrap().bands[0];
        assert_eq!(band.from, (176 * HOUR) as f64);

        assert_eq!(s.advance().unwrap(), Advance::CaseComplete);
        assert_eq!(s.step(), 1);
    }

    #[test]
    fn unknown_step_is_an_error() {
        let mut s = session(ViewerConfig::default());
        assert!(matches!(
            s.load_step(5),
            Err(ViewerError::Case(CaseError::UnknownStep { step: 5, count: 2 }))
        ));
        assert_eq!(s.step(), 0);
    }

    #[test]
    fn save_failure_follows_policy() {
        let blocking = session(ViewerConfig::default());
        let err = || Err(RequestError::Http { status: 500, message: "boom".into() });
        assert_eq!(blocking.after_save(Ok(())), Navigation::Proceed);
        assert!(matches!(blocking.after_save(err()), Navigation::Stay(_)));

        let lenient = session(ViewerConfig {
            save_policy: SavePolicy::NavigateAnyway,
            ..ViewerConfig::default()
        });
        assert_eq!(lenient.after_save(err()), Navigation::Proceed);
    }

    #[test]
    fn save_request_carries_sorted_selection() {
        let mut s = session(ViewerConfig::default());
        s.on_row_clicked(&"B".into());
        s.on_row_clicked(&"A".into());
        let req = s.save_request().unwrap();
        assert_eq!(req.path, "/SEMRinterface/selected_items/s/u/c1/");
        assert_eq!(req.body.as_deref(), Some(r#"{"selected_ids":["A","B"]}"#));
    }

    #[test]
    fn required_ratings_gate_continue() {
        let mut s = session(ViewerConfig {
            required_ratings: vec![RatingKind::CaseDifficulty, RatingKind::ClinicalImpact],
            ..ViewerConfig::default()
        });
        s.on_row_clicked(&"A".into());
        assert!(!s.can_continue());
        assert_eq!(s.view().continue_state, ContinueState::Blocked);

        s.set_rating(RatingKind::CaseDifficulty, 3).unwrap();
        assert!(!s.can_continue());
        assert!(matches!(
            s.set_rating(RatingKind::ClinicalImpact, 7),
            Err(ViewerError::Rating(_))
        ));
        assert!(!s.can_continue());

        s.set_rating(RatingKind::ClinicalImpact, 0).unwrap();
        assert!(s.can_continue());
        assert_eq!(s.view().continue_state, ContinueState::Ready);
    }

    #[test]
    fn responses_and_events_use_the_case_context() {
        let mut s = session(ViewerConfig::default());
        s.on_row_clicked(&"B".into());
        s.set_rating(RatingKind::CaseDifficulty, 2).unwrap();
        let req = s.responses_request(9_000).unwrap();
        assert_eq!(req.path, "/SEMRinterface/save_input/s/u/c1/");
        assert_eq!(
            req.body.as_deref(),
            Some(r#"{"the_timestamp":9000,"pat_id":"c1","selections":["B"],"rating":2,"reason":null}"#)
        );

        let req = s.task_event_request(TaskEvent::SelectionScreen, 9_001).unwrap();
        assert_eq!(req.path, "/SEMRinterface/save_event/s/u/c1/");
    }

    #[test]
    fn band_at_the_timestamp_limit_does_not_overflow() {
        let mut s = session(ViewerConfig::default());
        let widened = s.on_band_requested(i64::MAX).unwrap();
        assert_eq!(widened.max(), i64::MAX);
        assert_eq!(widened.min(), 40 * HOUR);
        assert_eq!(s.view().marker_label, "--/--");
        assert!(matches!(s.active_marker(), Some(Marker::Band { end: i64::MAX, .. })));
    }

    #[test]
    fn required_selection_blocks_continue() {
        let mut s = session(ViewerConfig {
            task_mode: crate::config::TaskMode::SelectionRequired,
            ..ViewerConfig::default()
        });
        assert!(!s.can_continue());
        assert_eq!(s.view().continue_state, ContinueState::Blocked);
        s.on_row_clicked(&"A".into());
        assert!(s.can_continue());
    }
}
