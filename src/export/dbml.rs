use std::collections::HashMap;

use super::sql_type;
use crate::model::{Application, Cardinality, KnackObject};

/// Renders the application as DBML, suitable for ER-diagram tools.
#[must_use]
pub fn to_dbml(app: &Application) -> String {
    let objects: HashMap<&str, &KnackObject> =
        app.objects.iter().map(|o| (o.key.as_str(), o)).collect();

    let mut lines = vec![format!("// Database schema for: {}", app.name)];
    if let Some(description) = &app.description {
        lines.push(format!("// Description: {description}"));
    }
    lines.extend([
        format!("// Knack App ID: {}", app.id),
        String::new(),
        "Project knack_app {".into(),
        "  database_type: \"Knack\"".into(),
        format!("  Note: \"{}\"", escape(&app.name)),
        "}".into(),
        String::new(),
    ]);

    for object in &app.objects {
        lines.push(format!("Table {} {{", object.key));
        lines.push(format!("  // {}", object.name));
        let records = app.record_count(&object.key);
        if records > 0 {
            lines.push(format!("  // Records: {records}"));
        }
        if object.user {
            lines.push("  // User Profile Object".into());
        }
        lines.push(String::new());

        for field in &object.fields {
            let mut attributes = Vec::new();
            if field.required {
                attributes.push("not null");
            }
            if field.unique {
                attributes.push("unique");
            }
            if object.identifier.as_deref() == Some(field.key.as_str()) {
                attributes.push("pk");
            }
            let attributes = if attributes.is_empty() {
                String::new()
            } else {
                format!(" [{}]", attributes.join(", "))
            };
            lines.push(format!(
                "  {} {}{attributes}  // {} ({})",
                field.key,
                sql_type(&field.field_type),
                field.name,
                field.field_type
            ));
        }
        lines.push(String::new());

        if let Some(inflections) = &object.inflections {
            lines.push(format!(
                "  Note: \"Plural: {}, Singular: {}\"",
                escape(&inflections.plural),
                escape(&inflections.singular)
            ));
        }
        lines.push("}".into());
        lines.push(String::new());
    }

    lines.push("// Relationships".into());
    for object in &app.objects {
        for conn in &object.connections.outbound {
            let arrow = match (conn.has, conn.belongs_to) {
                (Cardinality::Many, Cardinality::One) => ">",
                (Cardinality::One, Cardinality::Many) => "<",
                (Cardinality::One, Cardinality::One) => "-",
                (Cardinality::Many, Cardinality::Many) => "<>",
            };
            let target_column = objects
                .get(conn.object.as_str())
                .and_then(|target| target.identifier.as_deref())
                .unwrap_or(&conn.key);
            lines.push(format!(
                "Ref: {}.{} {arrow} {}.{target_column} // {}",
                object.key, conn.key, conn.object, conn.name
            ));
        }
    }
    lines.join("\n")
}

fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::sample_app;

    #[test]
    fn tables_columns_and_refs() {
        let dbml = to_dbml(&sample_app().application);
        assert!(dbml.starts_with("// Database schema for: Project Tracker"));
        assert!(dbml.contains("Table object_2 {\n  // Customers\n  // Records: 40"));
        assert!(dbml.contains("  field_10 VARCHAR(255) [not null, pk]  // Name (short_text)"));
        assert!(dbml.contains("  field_23 DECIMAL(19,4)  // Budget (currency)"));
        assert!(dbml.contains("  // User Profile Object"));
        assert!(dbml.contains("Ref: object_3.field_21 > object_2.field_10 // Customer"));
        assert!(dbml.contains("Ref: object_2.field_12 > object_1.field_1 // Account Manager"));
        assert!(dbml.contains("Note: \"Plural: Regions, Singular: Region\""));
    }
}
