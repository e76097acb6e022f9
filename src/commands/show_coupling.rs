//! `knack-sleuth show-coupling` command.

use super::Session;
use crate::cli::SourceArgs;
use crate::error::Result;
use crate::report::console;

/// Renders the inbound and outbound connections of one object.
///
/// # Errors
///
/// Returns loader errors, or `NotFound`/`AmbiguousLookup` if the identifier
/// does not name exactly one object.
pub fn run(session: &Session, source: &SourceArgs, identifier: &str) -> Result<String> {
    let graph = session.graph(source)?;
    let object = graph.resolve_object(identifier)?;
    Ok(console::coupling_view(&graph, object))
}
