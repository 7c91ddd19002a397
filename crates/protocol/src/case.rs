use serde::{Deserialize, Serialize};

use crate::chart::SeriesPoint;
use crate::types::{ChartId, EpochMillis, TimeWindow, WindowError};

/// Everything the viewer needs to present one patient case.
///
/// A case is reviewed in one or more time steps; each step reveals data up to
/// a later cut-off, so each step carries its own loaded window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasePayload {
    pub case_id: String,
    pub steps: Vec<CaseStep>,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl CasePayload {
    pub fn step(&self, index: usize) -> Option<&CaseStep> {
        self.steps.get(index)
    }

    pub fn observation(&self, id: &str) -> Option<&Observation> {
        self.observations.iter().find(|o| o.id.as_str() == id)
    }
}

/// Loaded time extent for one review step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStep {
    pub min_t: EpochMillis,
    pub max_t: EpochMillis,
}

impl CaseStep {
    pub fn window(&self) -> Result<TimeWindow, WindowError> {
        TimeWindow::new(self.min_t, self.max_t)
    }
}

/// One chart row's worth of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: ChartId,
    pub display_name: String,
    /// Page section the row is placed in ("Chemistry", "Vitals", "IV", ...).
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub units: String,
    pub data: ObservationData,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// A non-numeric result, serialized as `[t, "label"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(EpochMillis, String)", into = "(EpochMillis, String)")]
pub struct DiscreteSample {
    pub t: EpochMillis,
    pub label: String,
}

impl From<(EpochMillis, String)> for DiscreteSample {
    fn from((t, label): (EpochMillis, String)) -> Self {
        Self { t, label }
    }
}

impl From<DiscreteSample> for (EpochMillis, String) {
    fn from(s: DiscreteSample) -> Self {
        (s.t, s.label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObservationData {
    Numeric {
        values: Vec<SeriesPoint>,
        #[serde(default)]
        normal_range: NormalRange,
    },
    Discrete {
        values: Vec<DiscreteSample>,
    },
    BloodPressure {
        systolic: Vec<SeriesPoint>,
        diastolic: Vec<SeriesPoint>,
        /// Fixed y axis `[min, max]`.
        #[serde(default)]
        range: Option<[f64; 2]>,
    },
    Medication {
        doses: Vec<SeriesPoint>,
    },
    IntakeOutput {
        intake: Vec<SeriesPoint>,
        output: Vec<SeriesPoint>,
    },
}
