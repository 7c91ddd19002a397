use emr_viewer_core::sync::{ContinueState, PageView};
use emr_viewer_protocol::{ChartId, ThemeToken};
use wasm_bindgen::JsCast;

const RANGE_LABEL_ID: &str = "selected-range";
const MARKER_LABEL_ID: &str = "marker-label";
const MARKER_INDICATOR_ID: &str = "marker-indicator";
const CONTINUE_BUTTON_ID: &str = "continue-button";

/// Page elements updated directly through the DOM. Missing elements are
/// skipped.
pub struct DomView {
    document: Option<web_sys::Document>,
}

impl DomView {
    pub fn new() -> Self {
        Self {
            document: web_sys::window().and_then(|w| w.document()),
        }
    }

    fn element(&self, id: &str) -> Option<web_sys::HtmlElement> {
        let found = self
            .document
            .as_ref()?
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok());
        if found.is_none() {
            log::debug!("no element #{id}");
        }
        found
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.element(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_background(&self, id: &str, token: ThemeToken) {
        if let Some(el) = self.element(id) {
            if let Err(e) = el.style().set_property("background-color", token.css()) {
                log::debug!("#{id} background: {e:?}");
            }
        }
    }
}

impl Default for DomView {
    fn default() -> Self {
        Self::new()
    }
}

impl PageView for DomView {
    fn set_range_label(&mut self, text: &str) {
        self.set_text(RANGE_LABEL_ID, text);
    }

    fn set_marker_label(&mut self, text: &str) {
        self.set_text(MARKER_LABEL_ID, text);
    }

    fn set_marker_indicator(&mut self, active: bool) {
        let token = if active {
            ThemeToken::MarkerIndicatorActive
        } else {
            ThemeToken::MarkerIndicatorIdle
        };
        self.set_background(MARKER_INDICATOR_ID, token);
    }

    fn set_row_highlight(&mut self, id: &ChartId, highlighted: bool) {
        let token = if highlighted {
            ThemeToken::RowHighlight
        } else {
            ThemeToken::RowBackground
        };
        self.set_background(&format!("row{id}"), token);
    }

    fn set_continue_state(&mut self, state: ContinueState) {
        let Some(button) = self.element(CONTINUE_BUTTON_ID) else {
            return;
        };
        let result = match state {
            ContinueState::Blocked => button
                .set_attribute("disabled", "")
                .and_then(|()| {
                    button
                        .style()
                        .set_property("background-color", ThemeToken::ContinueBlocked.css())
                }),
            ContinueState::Ready => button.remove_attribute("disabled").and_then(|()| {
                button
                    .style()
                    .set_property("background-color", ThemeToken::ContinueReady.css())
            }),
            ContinueState::Idle => button
                .remove_attribute("disabled")
                .and_then(|()| button.style().remove_property("background-color").map(drop)),
        };
        if let Err(e) = result {
            log::debug!("continue button: {e:?}");
        }
    }
}
