//! `knack-sleuth export-schema` command.

use super::Session;
use crate::cli::SourceArgs;
use crate::error::Result;
use crate::export::{export_schema, SchemaFormat};

/// Renders the database schema in `format`.
///
/// # Errors
///
/// Returns loader or serialization errors.
pub fn run(session: &Session, source: &SourceArgs, format: SchemaFormat) -> Result<String> {
    let graph = session.graph(source)?;
    let text = export_schema(graph.application(), format)?;
    tracing::debug!(?format, bytes = text.len(), "schema exported");
    Ok(text)
}
