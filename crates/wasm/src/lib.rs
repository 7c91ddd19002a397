//! `wasm-bindgen` bridge between the study page and the viewer session.
//!
//! The page builds charts from the configurations returned by `load_case`,
//! registers each one, and forwards chart and pointer events. Calls that move
//! the selected window return the new `[min, max]` so the page can move its
//! range selector after the call has returned. `loaded_window` gives the
//! selector's full extent, which changes with each step.

mod backend;
mod chart;
mod view;

use std::cell::RefCell;
use std::collections::HashMap;

use emr_viewer_core::ViewerConfig;
use emr_viewer_core::charts::format_tooltip;
use emr_viewer_core::model::{Advance, InterfaceSession, Navigation, RatingKind};
use emr_viewer_core::request::{StudyContext, StudyRequest, TaskEvent, decode_case_response};
use emr_viewer_protocol::{ChartConfig, ChartId, EpochMillis, MAX_EPOCH_MS, TimeWindow};
use wasm_bindgen::prelude::*;

pub use chart::HostChart;
use chart::WebChart;
use view::DomView;

struct Bridge {
    session: InterfaceSession<WebChart, DomView>,
    configs: HashMap<ChartId, ChartConfig>,
}

thread_local! {
    static BRIDGE: RefCell<Option<Bridge>> = const { RefCell::new(None) };
}

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn with_bridge<T>(f: impl FnOnce(&mut Bridge) -> Result<T, JsError>) -> Result<T, JsError> {
    BRIDGE.with(|cell| {
        let mut slot = cell.borrow_mut();
        let bridge = slot
            .as_mut()
            .ok_or_else(|| JsError::new("no case loaded"))?;
        f(bridge)
    })
}

/// Whole milliseconds for a JS timestamp, if a `Date` could hold it.
fn checked_millis(value: f64) -> Option<EpochMillis> {
    let rounded = value.round();
    (rounded.is_finite() && rounded.abs() <= MAX_EPOCH_MS as f64)
        .then_some(rounded as EpochMillis)
}

fn to_millis(value: f64) -> Result<EpochMillis, JsError> {
    checked_millis(value).ok_or_else(|| JsError::new(&format!("invalid timestamp: {value}")))
}

fn now() -> EpochMillis {
    js_sys::Date::now().round() as EpochMillis
}

fn window_of(min: f64, max: f64) -> Result<TimeWindow, JsError> {
    TimeWindow::new(to_millis(min)?, to_millis(max)?).map_err(js_err)
}

fn pair(window: TimeWindow) -> Vec<f64> {
    vec![window.min() as f64, window.max() as f64]
}

impl Bridge {
    /// Rebuild chart configurations and return them as JSON.
    fn refresh_configs(&mut self) -> Result<String, JsError> {
        let configs = self.session.chart_configs();
        let json = serde_json::to_string(&configs).map_err(js_err)?;
        self.configs = configs.into_iter().collect();
        Ok(json)
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("console logger already installed");
    }
}

/// Turn on debug logging in the console.
#[wasm_bindgen]
pub fn set_verbose(verbose: bool) {
    log::set_max_level(if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });
}

/// Open a case from an already fetched case-data response body. Returns the
/// chart configurations as JSON `[[id, config], ...]`.
#[wasm_bindgen]
pub fn open_case(
    config_json: &str,
    response: &[u8],
    study_id: &str,
    user_id: &str,
) -> Result<String, JsError> {
    let config = ViewerConfig::from_json(config_json.as_bytes()).map_err(js_err)?;
    let case = decode_case_response(response).map_err(js_err)?;
    let context = StudyContext {
        study_id: study_id.to_owned(),
        user_id: user_id.to_owned(),
        case_id: case.case_id.clone(),
    };
    let session =
        InterfaceSession::new(config, case, context, DomView::new()).map_err(js_err)?;
    let mut bridge = Bridge {
        session,
        configs: HashMap::new(),
    };
    let json = bridge.refresh_configs()?;
    BRIDGE.with(|cell| *cell.borrow_mut() = Some(bridge));
    Ok(json)
}

/// Fetch case data from the backend and open it. Resolves to the chart
/// configurations JSON.
#[wasm_bindgen]
pub fn load_case(
    config_json: String,
    study_id: String,
    user_id: String,
    case_id: String,
) -> js_sys::Promise {
    wasm_bindgen_futures::future_to_promise(async move {
        let config = ViewerConfig::from_json(config_json.as_bytes()).map_err(js_err)?;
        let request = StudyRequest::case_data(&config, &study_id, &case_id);
        let body = backend::send(&config, request).await.map_err(js_err)?;
        let json = open_case(&config_json, &body, &study_id, &user_id)?;
        Ok(JsValue::from_str(&json))
    })
}

/// Register the chart built for row `id`. Its row element is `row{id}`.
#[wasm_bindgen]
pub fn register_chart(id: &str, chart: HostChart) -> Result<(), JsError> {
    with_bridge(|b| {
        let chart = WebChart::new(chart, &format!("row{id}"));
        b.session.register_chart(id.into(), chart);
        Ok(())
    })
}

/// Synchronize every registered chart once the page has built them all.
#[wasm_bindgen]
pub fn finish_loading() -> Result<(), JsError> {
    with_bridge(|b| {
        b.session.finish_loading();
        Ok(())
    })
}

#[wasm_bindgen]
pub fn on_range_changed(min: f64, max: f64) -> Result<(), JsError> {
    let window = window_of(min, max)?;
    with_bridge(|b| {
        b.session.on_range_changed(window);
        Ok(())
    })
}

#[wasm_bindgen]
pub fn on_pointer_down() -> Result<(), JsError> {
    with_bridge(|b| {
        b.session.on_pointer_down();
        Ok(())
    })
}

#[wasm_bindgen]
pub fn on_pointer_up() -> Result<(), JsError> {
    with_bridge(|b| {
        b.session.on_pointer_up();
        Ok(())
    })
}

/// Place the point marker. Returns the widened `[min, max]`, if any.
#[wasm_bindgen]
pub fn on_point_clicked(t: f64) -> Result<Option<Vec<f64>>, JsError> {
    let t = to_millis(t)?;
    with_bridge(|b| Ok(b.session.on_point_clicked(t).map(pair)))
}

/// Place the day band containing `t`. Returns the widened `[min, max]`, if any.
#[wasm_bindgen]
pub fn on_band_requested(t: f64) -> Result<Option<Vec<f64>>, JsError> {
    let t = to_millis(t)?;
    with_bridge(|b| Ok(b.session.on_band_requested(t).map(pair)))
}

#[wasm_bindgen]
pub fn clear_marker(restore_default_band: bool) -> Result<(), JsError> {
    with_bridge(|b| {
        b.session.clear_marker(restore_default_band);
        Ok(())
    })
}

/// Toggle row selection. Returns whether the row is now selected.
#[wasm_bindgen]
pub fn on_row_clicked(id: &str) -> Result<bool, JsError> {
    with_bridge(|b| Ok(b.session.on_row_clicked(&id.into())))
}

#[wasm_bindgen]
pub fn clear_selection() -> Result<(), JsError> {
    with_bridge(|b| {
        b.session.clear_selection();
        Ok(())
    })
}

#[wasm_bindgen]
pub fn set_highlight_filter(active: bool) -> Result<(), JsError> {
    with_bridge(|b| {
        b.session.set_highlight_filter(active);
        Ok(())
    })
}

/// Current selected window as `[min, max]`.
#[wasm_bindgen]
pub fn selected_window() -> Result<Vec<f64>, JsError> {
    with_bridge(|b| Ok(pair(b.session.selected_window())))
}

/// Loaded window of the current step as `[min, max]`: the full extent of the
/// master range selector. Changes after `next_step`.
#[wasm_bindgen]
pub fn loaded_window() -> Result<Vec<f64>, JsError> {
    with_bridge(|b| Ok(pair(b.session.loaded_window())))
}

/// Record the case difficulty rating (1 to 5). Returns whether the participant
/// may now continue.
#[wasm_bindgen]
pub fn set_case_difficulty(value: u8) -> Result<bool, JsError> {
    rate(RatingKind::CaseDifficulty, value)
}

/// Record the clinical impact rating (0 to 3). Returns whether the participant
/// may now continue.
#[wasm_bindgen]
pub fn set_clinical_impact(value: u8) -> Result<bool, JsError> {
    rate(RatingKind::ClinicalImpact, value)
}

fn rate(kind: RatingKind, value: u8) -> Result<bool, JsError> {
    with_bridge(|b| {
        b.session.set_rating(kind, value).map_err(js_err)?;
        Ok(b.session.can_continue())
    })
}

/// Report that the participant reached task screen `name` (e.g.
/// `"SelectionScreen"`). The post runs in the background; failures are only
/// logged.
#[wasm_bindgen]
pub fn post_task_event(name: &str) -> Result<(), JsError> {
    let event: TaskEvent =
        serde_json::from_value(serde_json::Value::String(name.to_owned())).map_err(js_err)?;
    let (config, request) = with_bridge(|b| {
        Ok((
            b.session.config().clone(),
            b.session.task_event_request(event, now()).map_err(js_err)?,
        ))
    })?;
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = backend::send(&config, request).await {
            log::warn!("task event {event:?} not recorded: {e}");
        }
    });
    Ok(())
}

/// Tooltip text for a hovered point.
#[wasm_bindgen]
pub fn tooltip(id: &str, series_index: usize, x: f64, y: f64) -> Result<String, JsError> {
    let x = to_millis(x)?;
    with_bridge(|b| {
        let config = b
            .configs
            .get(id)
            .ok_or_else(|| JsError::new(&format!("unknown chart {id}")))?;
        Ok(format_tooltip(config, series_index, x, y))
    })
}

/// Advance to the next step. Returns the new step index, or `undefined` when
/// the case is complete.
#[wasm_bindgen]
pub fn next_step() -> Result<Option<usize>, JsError> {
    with_bridge(|b| match b.session.advance().map_err(js_err)? {
        Advance::NextStep(step) => Ok(Some(step)),
        Advance::CaseComplete => Ok(None),
    })
}

/// Save the selection and ratings, then mark the case complete. Resolves to
/// `true` when the page should navigate on, rejects with a message when it
/// should stay.
#[wasm_bindgen]
pub fn save_and_complete() -> js_sys::Promise {
    wasm_bindgen_futures::future_to_promise(async move {
        let at = now();
        let (config, requests) = with_bridge(|b| {
            Ok((
                b.session.config().clone(),
                [
                    b.session.save_request().map_err(js_err)?,
                    b.session.responses_request(at).map_err(js_err)?,
                    b.session.complete_request(),
                ],
            ))
        })?;

        let mut result = Ok(());
        for request in requests {
            result = backend::send(&config, request).await.map(drop);
            if result.is_err() {
                break;
            }
        }

        match with_bridge(|b| Ok(b.session.after_save(result)))? {
            Navigation::Proceed => Ok(JsValue::TRUE),
            Navigation::Stay(message) => Err(JsValue::from_str(&message)),
        }
    })
}

/// Drop the session and every chart handle.
#[wasm_bindgen]
pub fn close_case() {
    BRIDGE.with(|cell| {
        if let Some(mut bridge) = cell.borrow_mut().take() {
            bridge.session.teardown();
        }
    });
}

#[cfg(test)]
mod tests {
    use emr_viewer_core::testing::{RecordingChart, RecordingView};
    use emr_viewer_protocol::{CasePayload, CaseStep};

    use super::*;

    #[test]
    fn timestamps_outside_the_date_range_are_rejected() {
        assert_eq!(checked_millis(1_451_606_400_000.4), Some(1_451_606_400_000));
        assert_eq!(checked_millis(-8.64e15), Some(-MAX_EPOCH_MS));
        assert_eq!(checked_millis(8.64e15 + 1.0), None);
        assert_eq!(checked_millis(1e19), None);
        assert_eq!(checked_millis(f64::NAN), None);
        assert_eq!(checked_millis(f64::NEG_INFINITY), None);
    }

    #[test]
    fn verbose_toggles_the_log_level() {
        set_verbose(true);
        assert_eq!(log::max_level(), log::LevelFilter::Debug);
        set_verbose(false);
        assert_eq!(log::max_level(), log::LevelFilter::Info);
    }

    #[test]
    fn loaded_window_follows_the_step() {
        let case = CasePayload {
            case_id: "c".into(),
            steps: vec![
                CaseStep { min_t: 0, max_t: 1_000 },
                CaseStep { min_t: 0, max_t: 5_000 },
            ],
            observations: Vec::new(),
        };
        let context = StudyContext {
            study_id: "s".into(),
            user_id: "u".into(),
            case_id: "c".into(),
        };
        let mut session = InterfaceSession::<RecordingChart, _>::new(
            ViewerConfig::default(),
            case,
            context,
            RecordingView::default(),
        )
        .unwrap();
        assert_eq!(pair(session.loaded_window()), [0.0, 1_000.0]);
        session.advance().unwrap();
        assert_eq!(pair(session.loaded_window()), [0.0, 5_000.0]);
    }
}
