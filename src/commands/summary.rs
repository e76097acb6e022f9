//! `knack-sleuth app-summary` command.

use super::Session;
use crate::cli::{ReportFormat, SourceArgs};
use crate::error::Result;
use crate::report::{self, markdown};
use crate::summary::summarize;

/// Renders the application architecture summary in `format`.
///
/// # Errors
///
/// Returns loader, analysis or serialization errors.
pub fn run(session: &Session, source: &SourceArgs, format: ReportFormat) -> Result<String> {
    let graph = session.graph(source)?;
    let summary = summarize(&graph, &session.policy)?;
    match format {
        ReportFormat::Json => report::to_json(&summary),
        ReportFormat::Yaml => report::to_yaml(&summary),
        ReportFormat::Markdown => Ok(markdown::summary(&summary)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{sample_source, session};

    #[test]
    fn json_summary_has_every_section() {
        let text = run(&session(), &sample_source(), ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        for section in [
            "application",
            "domain_model",
            "relationship_map",
            "data_patterns",
            "ui_architecture",
            "access_patterns",
            "technical_debt_indicators",
            "extensibility_assessment",
        ] {
            assert!(value.get(section).is_some(), "missing {section}");
        }
        assert_eq!(value["application"]["id"], "app_tracker_01");
    }

    #[test]
    fn markdown_summary_heading() {
        let text = run(&session(), &sample_source(), ReportFormat::Markdown).unwrap();
        assert!(text.starts_with("# Application Architecture Summary: Project Tracker"));
    }
}
