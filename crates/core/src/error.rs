use emr_viewer_protocol::WindowError;
use thiserror::Error;

use crate::model::RatingError;
use crate::request::RequestError;
use crate::sync::ChartError;

#[derive(Debug, Error)]
pub enum CaseError {
    #[error("invalid case payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("case has no time steps")]
    NoSteps,
    #[error("step {step} out of range (case has {count} steps)")]
    UnknownStep { step: usize, count: usize },
    #[error("step {step}: {source}")]
    StepWindow { step: usize, source: WindowError },
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("window: {0}")]
    Window(#[from] WindowError),
    #[error("chart: {0}")]
    Chart(#[from] ChartError),
    #[error("case: {0}")]
    Case(#[from] CaseError),
    #[error("request: {0}")]
    Request(#[from] RequestError),
    #[error("rating: {0}")]
    Rating(#[from] RatingError),
    #[error("config: {0}")]
    Config(serde_json::Error),
}
