use chrono::{DateTime, FixedOffset, Offset, Utc};
use emr_viewer_protocol::{EpochMillis, TimeWindow};

const UNKNOWN: &str = "--/-- --:--";

/// Formats timestamps for page labels in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct LabelFormatter {
    offset: FixedOffset,
}

impl LabelFormatter {
    /// Falls back to UTC when the offset is outside ±24h.
    pub fn new(utc_offset_minutes: i32) -> Self {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                log::warn!("utc offset {utc_offset_minutes}min out of range, using UTC");
                utc()
            });
        Self { offset }
    }

    fn local(&self, t: EpochMillis) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp_millis(t).map(|dt| dt.with_timezone(&self.offset))
    }

    /// `MM/DD HH:MM`
    pub fn date_time(&self, t: EpochMillis) -> String {
        self.local(t)
            .map(|dt| dt.format("%m/%d %H:%M").to_string())
            .unwrap_or_else(|| UNKNOWN.to_owned())
    }

    /// `MM/DD`
    pub fn date(&self, t: EpochMillis) -> String {
        self.local(t)
            .map(|dt| dt.format("%m/%d").to_string())
            .unwrap_or_else(|| UNKNOWN[..5].to_owned())
    }

    /// `MM/DD HH:MM to MM/DD HH:MM`
    pub fn range(&self, window: TimeWindow) -> String {
        format!(
            "{} to {}",
            self.date_time(window.min()),
            self.date_time(window.max())
        )
    }
}

impl Default for LabelFormatter {
    fn default() -> Self {
        Self { offset: utc() }
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Numeric value as shown next to a chart: no trailing `.0`.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
