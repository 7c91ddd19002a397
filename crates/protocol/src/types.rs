use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Milliseconds since the Unix epoch, the unit every chart axis uses.
pub type EpochMillis = i64;

/// Identifier shared by whichever annotation (point line or day band) is
/// currently placed on every chart.
pub const MARKER_ID: &str = "plot-line-1";

/// Largest distance from the epoch a JavaScript `Date` can represent.
pub const MAX_EPOCH_MS: EpochMillis = 8_640_000_000_000_000;

/// Unique identifier of a chart row (one per observation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(String);

impl ChartId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChartId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ChartId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for ChartId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("inverted time window: min {min} is after max {max}")]
    Inverted { min: EpochMillis, max: EpochMillis },
}

/// An inclusive `[min, max]` time range in epoch milliseconds.
///
/// Construction through [`TimeWindow::new`] guarantees `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct TimeWindow {
    min: EpochMillis,
    max: EpochMillis,
}

#[derive(Deserialize)]
struct RawWindow {
    min: EpochMillis,
    max: EpochMillis,
}

impl TryFrom<RawWindow> for TimeWindow {
    type Error = WindowError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.min, raw.max)
    }
}

impl TimeWindow {
    pub fn new(min: EpochMillis, max: EpochMillis) -> Result<Self, WindowError> {
        if min > max {
            return Err(WindowError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> EpochMillis {
        self.min
    }

    pub fn max(&self) -> EpochMillis {
        self.max
    }

    pub fn span(&self) -> EpochMillis {
        self.max - self.min
    }

    /// Inclusive on both ends.
    pub fn contains(&self, t: EpochMillis) -> bool {
        self.min <= t && t <= self.max
    }

    /// Whether any of `timestamps` falls inside the window.
    pub fn any_within(&self, timestamps: &[EpochMillis]) -> bool {
        timestamps.iter().any(|&t| self.contains(t))
    }

    /// Smallest window containing both `self` and `[from, to]`.
    ///
    /// Returns `None` when nothing had to move.
    pub fn widened_to(&self, from: EpochMillis, to: EpochMillis) -> Option<TimeWindow> {
        let min = self.min.min(from);
        let max = self.max.max(to);
        if min == self.min && max == self.max {
            None
        } else {
            Some(TimeWindow { min, max })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_window() {
        assert_eq!(
            TimeWindow::new(10, 5),
            Err(WindowError::Inverted { min: 10, max: 5 })
        );
        assert!(TimeWindow::new(5, 5).is_ok());
    }

    #[test]
    fn contains_is_inclusive() {
        let w = TimeWindow::new(100, 200).unwrap();
        assert!(w.contains(100));
        assert!(w.contains(200));
        assert!(!w.contains(99));
        assert!(!w.contains(201));
    }

    #[test]
    fn widening() {
        let w = TimeWindow::new(100, 200).unwrap();
        assert_eq!(w.widened_to(150, 150), None);
        assert_eq!(w.widened_to(50, 50), Some(TimeWindow::new(50, 200).unwrap()));
        assert_eq!(w.widened_to(250, 250), Some(TimeWindow::new(100, 250).unwrap()));
    }

    #[test]
    fn deserialize_validates_order() {
        let ok: TimeWindow = serde_json::from_str(r#"{"min": 1, "max": 2}"#).unwrap();
        assert_eq!(ok.span(), 1);
        assert!(serde_json::from_str::<TimeWindow>(r#"{"min": 3, "max": 2}"#).is_err());
    }
}
