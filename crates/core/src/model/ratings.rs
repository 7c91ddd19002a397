use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two judgements a participant gives about a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingKind {
    /// Effort spent getting up to date with the case, 1 (low) to 5 (high).
    CaseDifficulty,
    /// Impact of revisions on patient care, 1 to 3, or 0 for "did not revise".
    ClinicalImpact,
}

impl RatingKind {
    pub fn scale(self) -> RangeInclusive<u8> {
        match self {
            RatingKind::CaseDifficulty => 1..=5,
            RatingKind::ClinicalImpact => 0..=3,
        }
    }

    fn scale_label(self) -> &'static str {
        match self {
            RatingKind::CaseDifficulty => "1..=5",
            RatingKind::ClinicalImpact => "0..=3",
        }
    }
}

impl fmt::Display for RatingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RatingKind::CaseDifficulty => "case difficulty",
            RatingKind::ClinicalImpact => "clinical impact",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} rating {value} is outside {scale}", scale = .kind.scale_label())]
pub struct RatingError {
    pub kind: RatingKind,
    pub value: u8,
}

/// Ratings recorded so far for the current case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ratings {
    pub case_difficulty: Option<u8>,
    pub clinical_impact: Option<u8>,
}

impl Ratings {
    /// Record `value`, replacing any earlier answer of the same kind.
    pub fn set(&mut self, kind: RatingKind, value: u8) -> Result<(), RatingError> {
        if !kind.scale().contains(&value) {
            return Err(RatingError { kind, value });
        }
        *self.slot(kind) = Some(value);
        Ok(())
    }

    pub fn get(&self, kind: RatingKind) -> Option<u8> {
        match kind {
            RatingKind::CaseDifficulty => self.case_difficulty,
            RatingKind::ClinicalImpact => self.clinical_impact,
        }
    }

    /// Whether every kind in `required` has an answer.
    pub fn covers(&self, required: &[RatingKind]) -> bool {
        required.iter().all(|&kind| self.get(kind).is_some())
    }

    fn slot(&mut self, kind: RatingKind) -> &mut Option<u8> {
        match kind {
            RatingKind::CaseDifficulty => &mut self.case_difficulty,
            RatingKind::ClinicalImpact => &mut self.clinical_impact,
        }
    }
}
