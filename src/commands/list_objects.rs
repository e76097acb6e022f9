//! `knack-sleuth list-objects` command.

use super::Session;
use crate::cli::SourceArgs;
use crate::error::Result;
use crate::report::console::{self, ObjectOrder};

/// Renders the object table, by name or by record count.
///
/// # Errors
///
/// Returns loader and graph-builder errors.
pub fn run(session: &Session, source: &SourceArgs, sort_by_rows: bool) -> Result<String> {
    let graph = session.graph(source)?;
    let order = if sort_by_rows { ObjectOrder::Rows } else { ObjectOrder::Name };
    Ok(console::object_table(&graph, order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{sample_source, session};

    #[test]
    fn lists_every_object() {
        let text = run(&session(), &sample_source(), true).unwrap();
        assert!(text.lines().nth(4).unwrap().starts_with("object_4"));
        assert!(text.contains("Total: 5 objects"));
    }
}
