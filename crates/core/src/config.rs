use serde::{Deserialize, Serialize};

use crate::error::ViewerError;
use crate::model::RatingKind;

pub const DAY_MS: i64 = 86_400_000;

/// Per-page viewer settings.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Offset from UTC used when formatting labels, in minutes.
    pub utc_offset_minutes: i32,
    /// Added to the floored day boundary when placing a day band.
    pub day_band_offset_ms: i64,
    /// Width of the selected window when a step is first shown.
    pub initial_span_ms: i64,
    /// Width of the default "most recent data" band.
    pub recent_band_ms: i64,
    pub csrf_cookie: String,
    pub csrf_header: String,
    /// Prefix prepended to every backend path.
    pub api_base: String,
    pub save_policy: SavePolicy,
    pub task_mode: TaskMode,
    /// Ratings the participant must give before the continue button enables.
    pub required_ratings: Vec<RatingKind>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            day_band_offset_ms: 3_600_000,
            initial_span_ms: 216_000_000,
            recent_band_ms: DAY_MS,
            csrf_cookie: "csrftoken".to_owned(),
            csrf_header: "X-CSRFToken".to_owned(),
            api_base: String::new(),
            save_policy: SavePolicy::default(),
            task_mode: TaskMode::default(),
            required_ratings: Vec::new(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(data: &[u8]) -> Result<Self, ViewerError> {
        serde_json::from_slice(data).map_err(ViewerError::Config)
    }
}

/// What happens to navigation when saving the selection fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePolicy {
    /// Stay on the page and surface the error.
    #[default]
    BlockOnFailure,
    /// Log the failure and navigate anyway.
    NavigateAnyway,
}

/// Whether the current study task needs at least one selected row before the
/// participant may continue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    #[default]
    SelectionOptional,
    SelectionRequired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = ViewerConfig::from_json(b"{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.day_band_offset_ms, 3_600_000);
        assert_eq!(config.initial_span_ms, 216_000_000);
    }

    #[test]
    fn partial_override() {
        let config = ViewerConfig::from_json(
            br#"{"utcOffsetMinutes": -240, "taskMode": "selection_required",
                "requiredRatings": ["case_difficulty"]}"#,
        )
        .unwrap();
        assert_eq!(config.utc_offset_minutes, -240);
        assert_eq!(config.task_mode, TaskMode::SelectionRequired);
        assert_eq!(config.required_ratings, [RatingKind::CaseDifficulty]);
        assert_eq!(config.csrf_cookie, "csrftoken");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ViewerConfig::from_json(b"{not json"),
            Err(ViewerError::Config(_))
        ));
    }
}
