//! Referential integrity checks run while building the graph.

use std::collections::HashMap;

use crate::error::{Result, SleuthError};
use crate::model::Application;

type ObjectIndex = HashMap<String, usize>;
type FieldIndex = HashMap<String, (usize, usize)>;

/// Verifies that every key referenced by the document resolves.
pub(super) fn check_references(
    app: &Application,
    objects: &ObjectIndex,
    fields: &FieldIndex,
) -> Result<()> {
    let object = |key: &str, referrer: String| require(objects.contains_key(key), key, referrer);
    let field = |key: &str, referrer: String| require(fields.contains_key(key), key, referrer);

    for obj in &app.objects {
        for conn in &obj.connections.outbound {
            object(&conn.object, format!("{} outbound connection '{}'", obj.key, conn.name))?;
            field(&conn.key, format!("{} outbound connection '{}'", obj.key, conn.name))?;
        }
        for conn in &obj.connections.inbound {
            object(&conn.object, format!("{} inbound connection '{}'", obj.key, conn.name))?;
            field(&conn.key, format!("{} inbound connection '{}'", obj.key, conn.name))?;
        }
        if let Some(sort) = &obj.sort {
            field(&sort.field, format!("{} sort", obj.key))?;
        }
        if let Some(identifier) = &obj.identifier {
            field(identifier, format!("{} identifier", obj.key))?;
        }
        for f in &obj.fields {
            if let Some(equation) = f.equation_text() {
                for token in field_tokens(&equation) {
                    field(token, format!("{} equation", f.key))?;
                }
            }
        }
    }

    for scene in &app.scenes {
        for view in &scene.views {
            let at = |what: &str| format!("{}/{} {what}", scene.key, view.key);
            if let Some(source) = &view.source {
                object(&source.object, at("source"))?;
                if let Some(parent) = &source.parent_source {
                    object(&parent.object, at("parent source"))?;
                    field(&parent.connection, at("parent connection"))?;
                }
                if let Some(key) = &source.connection_key {
                    field(key, at("connection key"))?;
                }
                for sort in source.sort.iter().flatten() {
                    field(&sort.field, at("sort"))?;
                }
            }
            for column in &view.columns {
                if let Some(key) = column.field_key() {
                    field(key, at("column"))?;
                }
            }
            for key in view.input_field_keys() {
                field(key, at("form input"))?;
            }
        }
    }
    Ok(())
}

fn require(found: bool, key: &str, referrer: String) -> Result<()> {
    if found {
        Ok(())
    } else {
        Err(SleuthError::Reference { referrer, key: key.to_string() })
    }
}

/// Field keys written as `{field_N}` tokens in formula text.
///
/// Tokens with any other shape, such as connected-field paths like
/// `{field_1.field_2}`, are ignored.
pub(crate) fn field_tokens(equation: &str) -> impl Iterator<Item = &str> {
    equation.split('{').skip(1).filter_map(|chunk| {
        let token = &chunk[..chunk.find('}')?];
        let suffix = token.strip_prefix("field_")?;
        let well_formed = !suffix.is_empty()
            && suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        well_formed.then_some(token)
    })
}
