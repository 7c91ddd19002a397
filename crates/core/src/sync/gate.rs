use emr_viewer_protocol::TimeWindow;

/// Coalesces the burst of range changes the master selector emits while it
/// is dragged.
///
/// While the pointer is down, changes are held (latest wins). Releasing the
/// pointer hands back the held change so the final window is always applied.
#[derive(Debug, Default)]
pub struct RangeGate {
    pointer_down: bool,
    pending: Option<TimeWindow>,
}

impl RangeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&mut self) {
        self.pointer_down = true;
    }

    /// Returns the change held during the drag, if any.
    pub fn pointer_up(&mut self) -> Option<TimeWindow> {
        self.pointer_down = false;
        self.pending.take()
    }

    /// Returns the window to apply now, or `None` if it was held.
    pub fn offer(&mut self, window: TimeWindow) -> Option<TimeWindow> {
        if self.pointer_down {
            self.pending = Some(window);
            None
        } else {
            Some(window)
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.pointer_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(min: i64, max: i64) -> TimeWindow {
        TimeWindow::new(min, max).unwrap()
    }

    #[test]
    fn passes_through_when_pointer_up() {
        let mut gate = RangeGate::new();
        assert_eq!(gate.offer(window(0, 10)), Some(window(0, 10)));
        assert_eq!(gate.pointer_up(), None);
    }

    #[test]
    fn holds_latest_change_until_release() {
        let mut gate = RangeGate::new();
        gate.pointer_down();
        assert!(gate.is_dragging());
        assert_eq!(gate.offer(window(0, 10)), None);
        assert_eq!(gate.offer(window(5, 15)), None);
        assert_eq!(gate.pointer_up(), Some(window(5, 15)));
        // Released exactly once.
        assert_eq!(gate.pointer_up(), None);
    }

    #[test]
    fn click_without_range_change_yields_nothing() {
        let mut gate = RangeGate::new();
        gate.pointer_down();
        assert_eq!(gate.pointer_up(), None);
        assert!(!gate.is_dragging());
    }
}
