//! `knack-sleuth impact-analysis` command.

use super::Session;
use crate::cli::{ReportFormat, SourceArgs};
use crate::coupling::CouplingAnalysis;
use crate::error::Result;
use crate::impact;
use crate::report::{self, markdown, BuilderLinks};

/// Renders the change-impact report for `identifier` in `format`.
///
/// # Errors
///
/// Returns loader errors, resolution errors for `identifier`, or
/// serialization errors.
pub fn run(
    session: &Session,
    source: &SourceArgs,
    identifier: &str,
    format: ReportFormat,
) -> Result<String> {
    let graph = session.graph(source)?;
    let coupling = CouplingAnalysis::compute(&graph, &session.policy);
    let report = impact::analyze(&graph, &coupling, &session.policy, identifier)?;
    tracing::debug!(?format, "rendering impact report");

    match format {
        ReportFormat::Json => report::to_json(&report),
        ReportFormat::Yaml => report::to_yaml(&report),
        ReportFormat::Markdown => {
            let links = BuilderLinks::new(&session.settings, graph.application());
            Ok(markdown::impact(&report, &graph, &links))
        }
    }
}
