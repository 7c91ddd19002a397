use serde::{Deserialize, Serialize};

/// Semantic color tokens for chart decorations and row styling.
///
/// The browser page receives resolved CSS colors through [`ThemeToken::css`];
/// the terminal preview maps the same tokens onto its own palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    // Annotations
    MarkerLine,
    DayBand,
    RecentBand,
    NormalRange,
    ZeroLine,

    // Value zones
    BelowNormal,
    WithinNormal,
    AboveNormal,
    Unranged,

    // Series
    DiscreteValue,
    Systolic,
    Diastolic,
    Intake,
    Output,
    Dose,

    // Rows and task controls
    RowHighlight,
    RowBackground,
    ContinueReady,
    ContinueBlocked,
    MarkerIndicatorActive,
    MarkerIndicatorIdle,
}

impl ThemeToken {
    pub fn css(self) -> &'static str {
        use ThemeToken::*;
        match self {
            MarkerLine => "black",
            DayBand => "#E0E0E0",
            RecentBand => "#fce1c9",
            NormalRange => "rgba(68, 170, 213, 0.4)",
            ZeroLine => "black",

            BelowNormal => "#00CCFF",
            WithinNormal => "#33CC33",
            AboveNormal => "#BF0B23",
            Unranged => "#000000",

            DiscreteValue => "#000000",
            Systolic => "#7CB5EC",
            Diastolic => "#434348",
            Intake => "#33CC33",
            Output => "#BF0B23",
            Dose => "#7CB5EC",

            RowHighlight => "#FFC300",
            RowBackground => "#eeeeee",
            ContinueReady => "green",
            ContinueBlocked => "#ED1D1D",
            MarkerIndicatorActive => "white",
            MarkerIndicatorIdle => "#222222",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_variant_name() {
        let json = serde_json::to_string(&ThemeToken::RecentBand).unwrap();
        assert_eq!(json, "\"RecentBand\"");
    }

    #[test]
    fn row_colors_match_page_stylesheet() {
        assert_eq!(ThemeToken::RowHighlight.css(), "#FFC300");
        assert_eq!(ThemeToken::RowBackground.css(), "#eeeeee");
    }
}
