//! `knack-sleuth search-object` and `search-field` commands.

use super::Session;
use crate::cli::SourceArgs;
use crate::error::Result;
use crate::report::{console, BuilderLinks};
use crate::search::UsageSearch;

/// Renders every usage of the object named by `identifier`.
///
/// # Errors
///
/// Returns loader errors, or `NotFound`/`AmbiguousLookup` if the identifier
/// does not name exactly one object.
pub fn object(
    session: &Session,
    source: &SourceArgs,
    identifier: &str,
    show_fields: bool,
) -> Result<String> {
    let graph = session.graph(source)?;
    let object = graph.resolve_object(identifier)?;
    let usages = UsageSearch::new(&graph).search_entity(&object.key)?;
    let links = BuilderLinks::new(&session.settings, graph.application());
    Ok(console::entity_search(object, &usages, show_fields, &links))
}

/// Renders every usage of the field named by `identifier`.
///
/// # Errors
///
/// Returns loader errors, or `NotFound`/`AmbiguousLookup` if the identifier
/// does not name exactly one field.
pub fn field(session: &Session, source: &SourceArgs, identifier: &str) -> Result<String> {
    let graph = session.graph(source)?;
    let found = graph.resolve_field(identifier)?;
    let usages = UsageSearch::new(&graph).search_field(&found.field.key)?;
    let links = BuilderLinks::new(&session.settings, graph.application());
    Ok(console::field_search(found, &usages, &links))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{sample_source, session};
    use crate::error::SleuthError;

    #[test]
    fn object_search_by_name() {
        let text = object(&session(), &sample_source(), "customers", true).unwrap();
        assert!(text.starts_with("Object: Customers (object_2)"));
        assert!(text.contains("Field-level usages"));
    }

    #[test]
    fn field_search_by_key() {
        let text = field(&session(), &sample_source(), "field_23").unwrap();
        assert!(text.starts_with("Field: Budget (field_23) - currency on Projects (object_3)"));
        assert!(text.contains("[field_equation]"));
    }

    #[test]
    fn ambiguous_field_name_is_reported() {
        // "Name" is used by Accounts, Customers and Tasks.
        let err = field(&session(), &sample_source(), "Name").unwrap_err();
        assert!(matches!(err, SleuthError::AmbiguousLookup { .. }));
    }

    #[test]
    fn unknown_object_is_not_found() {
        let err = object(&session(), &sample_source(), "Invoices", true).unwrap_err();
        assert!(matches!(err, SleuthError::NotFound(_)));
    }
}
