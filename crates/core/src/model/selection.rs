use std::collections::HashSet;

use emr_viewer_protocol::ChartId;

use crate::config::TaskMode;
use crate::sync::{ContinueState, PageView};

/// Rows the participant has marked, with row highlighting and the continue
/// button kept in lockstep with membership.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    ids: HashSet<ChartId>,
    mode: TaskMode,
    ratings_pending: bool,
}

impl SelectionStore {
    pub fn new(mode: TaskMode) -> Self {
        Self {
            ids: HashSet::new(),
            mode,
            ratings_pending: false,
        }
    }

    /// Hold the continue button until required ratings are in, whatever the
    /// selection.
    pub fn set_ratings_pending(&mut self, pending: bool, view: &mut dyn PageView) {
        self.ratings_pending = pending;
        view.set_continue_state(self.continue_state());
    }

    /// Flip membership of `id`. Returns `true` if it is now selected.
    pub fn toggle(&mut self, id: &ChartId, view: &mut dyn PageView) -> bool {
        let selected = if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        };
        view.set_row_highlight(id, selected);
        view.set_continue_state(self.continue_state());
        selected
    }

    pub fn clear(&mut self, view: &mut dyn PageView) {
        for id in self.ids.drain() {
            view.set_row_highlight(&id, false);
        }
        view.set_continue_state(self.continue_state());
    }

    /// Push the current button state without changing membership, e.g. when
    /// a step is first shown.
    pub fn refresh(&self, view: &mut dyn PageView) {
        view.set_continue_state(self.continue_state());
    }

    pub fn set_mode(&mut self, mode: TaskMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> TaskMode {
        self.mode
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Members in sorted order, as they are sent to the backend.
    pub fn ids(&self) -> Vec<ChartId> {
        let mut ids: Vec<_> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn as_set(&self) -> &HashSet<ChartId> {
        &self.ids
    }

    pub fn continue_state(&self) -> ContinueState {
        if self.ratings_pending {
            return ContinueState::Blocked;
        }
        match (self.ids.is_empty(), self.mode) {
            (false, _) => ContinueState::Ready,
            (true, TaskMode::SelectionRequired) => ContinueState::Blocked,
            (true, TaskMode::SelectionOptional) => ContinueState::Idle,
        }
    }
}
