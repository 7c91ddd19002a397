//! Backend calls as plain data. Hosts perform the actual HTTP.

use std::fmt::Write as _;

use emr_viewer_protocol::{CasePayload, ChartId, EpochMillis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ViewerConfig;
use crate::error::{CaseError, ViewerError};
use crate::model::Ratings;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no `{0}` cookie; cannot authorize state-changing request")]
    MissingCsrfToken(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("server reported status `{0}`")]
    Rejected(String),
    #[error("network: {0}")]
    Network(String),
    #[error("encode body: {0}")]
    Encode(serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    /// Whether the backend requires a CSRF token.
    pub fn is_mutating(self) -> bool {
        matches!(self, Method::Post)
    }
}

/// One backend call, ready for the host's HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyRequest {
    pub method: Method,
    /// Path including `api_base` and any query string.
    pub path: String,
    /// JSON body, if any.
    pub body: Option<String>,
}

/// Identifies the participant and case a response belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyContext {
    pub study_id: String,
    pub user_id: String,
    pub case_id: String,
}

/// Task screens reported to the backend as the participant moves through a
/// case. Serialized by variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskEvent {
    SelectionScreen,
    RoundingReport,
    ComplexityRating,
    ReviseReport,
    ClinicalImpact,
}

#[derive(Serialize)]
struct SelectedItems<'a> {
    selected_ids: &'a [ChartId],
}

// Field names are the ones the study backend stores.
#[derive(Serialize)]
struct Responses<'a> {
    the_timestamp: EpochMillis,
    pat_id: &'a str,
    selections: &'a [ChartId],
    rating: Option<u8>,
    reason: Option<u8>,
}

#[derive(Serialize)]
struct EventRecord<'a> {
    the_timestamp: EpochMillis,
    pat_id: &'a str,
    event: TaskEvent,
}

impl StudyRequest {
    /// Persist the participant's selected rows for the case.
    pub fn save_selection(
        config: &ViewerConfig,
        ctx: &StudyContext,
        selected: &[ChartId],
    ) -> Result<Self, ViewerError> {
        let body = serde_json::to_string(&SelectedItems {
            selected_ids: selected,
        })
        .map_err(RequestError::Encode)?;
        Ok(Self {
            method: Method::Post,
            path: study_path(config, "selected_items", ctx),
            body: Some(body),
        })
    }

    /// Persist the participant's answers for the case: the selection plus the
    /// difficulty (`rating`) and clinical impact (`reason`) ratings.
    pub fn save_responses(
        config: &ViewerConfig,
        ctx: &StudyContext,
        at: EpochMillis,
        selected: &[ChartId],
        ratings: &Ratings,
    ) -> Result<Self, ViewerError> {
        let body = serde_json::to_string(&Responses {
            the_timestamp: at,
            pat_id: &ctx.case_id,
            selections: selected,
            rating: ratings.case_difficulty,
            reason: ratings.clinical_impact,
        })
        .map_err(RequestError::Encode)?;
        Ok(Self {
            method: Method::Post,
            path: study_path(config, "save_input", ctx),
            body: Some(body),
        })
    }

    /// Record that the participant reached a task screen. Hosts send these
    /// without waiting on the result.
    pub fn task_event(
        config: &ViewerConfig,
        ctx: &StudyContext,
        at: EpochMillis,
        event: TaskEvent,
    ) -> Result<Self, ViewerError> {
        let body = serde_json::to_string(&EventRecord {
            the_timestamp: at,
            pat_id: &ctx.case_id,
            event,
        })
        .map_err(RequestError::Encode)?;
        Ok(Self {
            method: Method::Post,
            path: study_path(config, "save_event", ctx),
            body: Some(body),
        })
    }

    pub fn mark_complete(config: &ViewerConfig, ctx: &StudyContext) -> Self {
        Self {
            method: Method::Post,
            path: study_path(config, "markcompleteurl", ctx),
            body: None,
        }
    }

    pub fn case_data(config: &ViewerConfig, study_id: &str, case_id: &str) -> Self {
        Self {
            method: Method::Get,
            path: format!(
                "{}/api/get_case_data/?study_id={}&case_id={}",
                config.api_base,
                encode_component(study_id),
                encode_component(case_id)
            ),
            body: None,
        }
    }
}

fn study_path(config: &ViewerConfig, action: &str, ctx: &StudyContext) -> String {
    format!(
        "{}/SEMRinterface/{action}/{}/{}/{}/",
        config.api_base,
        encode_component(&ctx.study_id),
        encode_component(&ctx.user_id),
        encode_component(&ctx.case_id)
    )
}

/// Percent-encode everything outside the URI component unreserved set.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

fn decode_component(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s.get(i + 1..i + 3).and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(b) = hex {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Value of cookie `name` in a `document.cookie` style header.
pub fn csrf_token(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| decode_component(value))
    })
}

/// Envelope returned by the case-data endpoint.
#[derive(Debug, Deserialize)]
struct CaseResponse {
    status: String,
    #[serde(default)]
    case_data: Option<CasePayload>,
}

/// Decode the case-data response body.
pub fn decode_case_response(body: &[u8]) -> Result<CasePayload, ViewerError> {
    let response: CaseResponse = serde_json::from_slice(body).map_err(CaseError::Decode)?;
    match (response.status.as_str(), response.case_data) {
        ("success" | "ok", Some(case)) => Ok(case),
        (status, _) => Err(RequestError::Rejected(status.to_owned()).into()),
    }
}
