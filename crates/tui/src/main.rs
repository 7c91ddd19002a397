mod chart;
mod renderer;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use emr_viewer_core::ViewerConfig;
use emr_viewer_core::model::InterfaceSession;
use emr_viewer_core::request::{StudyContext, decode_case_response};
use emr_viewer_protocol::CasePayload;

use crate::chart::{TermChart, TermView};

struct Args {
    case: PathBuf,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut case = None;
    let mut config = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(PathBuf::from(args.next().context("--config needs a path")?));
            }
            _ if case.is_none() => case = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument {arg}"),
        }
    }
    let Some(case) = case else {
        bail!("Usage: emr-viewer <case.json> [--config <viewer-config.json>]");
    };
    Ok(Args { case, config })
}

/// Accepts either the case-data response envelope or a bare case payload.
fn read_case(data: &[u8]) -> Result<CasePayload> {
    match decode_case_response(data) {
        Ok(case) => Ok(case),
        Err(envelope_err) => serde_json::from_slice(data)
            .with_context(|| format!("not a case payload or case response ({envelope_err})")),
    }
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ViewerConfig::from_json(&data)?
        }
        None => ViewerConfig::default(),
    };
    let data = std::fs::read(&args.case)
        .with_context(|| format!("reading case {}", args.case.display()))?;
    let case = read_case(&data)?;

    let context = StudyContext {
        study_id: "preview".to_owned(),
        user_id: "local".to_owned(),
        case_id: case.case_id.clone(),
    };
    let mut session = InterfaceSession::new(config, case, context, TermView::default())?;
    for (id, config) in session.chart_configs() {
        session.register_chart(id, TermChart::new(config));
    }
    session.finish_loading();

    renderer::render_tui(&mut session)?;
    Ok(())
}
