//! Database-schema views of an application: JSON Schema, DBML and YAML.
//!
//! Objects become tables, fields become columns with an approximate SQL
//! type, and outbound connections become foreign-key references.

mod dbml;
mod json_schema;
mod yaml;

use crate::error::Result;
use crate::model::{Application, Cardinality};

pub use dbml::to_dbml;
pub use json_schema::to_json_schema;
pub use yaml::{to_yaml_schema, YamlSchema};

/// Output format of [`export_schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// JSON Schema draft-07.
    JsonSchema,
    /// Database Markup Language.
    Dbml,
    /// YAML table listing.
    Yaml,
}

/// Renders the schema of `app` in `format`.
///
/// # Errors
///
/// Returns [`SleuthError::Serialization`](crate::error::SleuthError::Serialization)
/// if the document cannot be serialized.
pub fn export_schema(app: &Application, format: SchemaFormat) -> Result<String> {
    match format {
        SchemaFormat::JsonSchema => Ok(serde_json::to_string_pretty(&to_json_schema(app))?),
        SchemaFormat::Dbml => Ok(to_dbml(app)),
        SchemaFormat::Yaml => Ok(serde_yaml::to_string(&to_yaml_schema(app))?),
    }
}

/// Approximate SQL column type of a field type tag.
#[must_use]
pub fn sql_type(field_type: &str) -> &'static str {
    match field_type {
        "short_text" | "multiple_choice" | "email" | "name" => "VARCHAR(255)",
        "paragraph_text" | "rich_text" | "address" | "user_roles" | "concatenation"
        | "equation" => "TEXT",
        "number" | "sum" | "min" | "max" | "average" => "DECIMAL",
        "currency" => "DECIMAL(19,4)",
        "boolean" => "BOOLEAN",
        "date_time" => "TIMESTAMP",
        "date" => "DATE",
        "time" => "TIME",
        "phone" | "connection" => "VARCHAR(50)",
        "link" | "image" | "file" | "signature" => "VARCHAR(2048)",
        "auto_increment" | "rating" | "count" | "timer" => "INTEGER",
        _ => "TEXT",
    }
}

/// JSON Schema type of a field type tag.
#[must_use]
pub fn json_type(field_type: &str) -> &'static str {
    match field_type {
        "number" | "currency" | "sum" | "min" | "max" | "average" => "number",
        "auto_increment" | "rating" | "count" | "timer" => "integer",
        "boolean" => "boolean",
        "address" => "object",
        "user_roles" => "array",
        _ => "string",
    }
}

/// Hyphenated relationship label, e.g. `many-to-one`.
#[must_use]
pub fn relationship_type(has: Cardinality, belongs_to: Cardinality) -> &'static str {
    match (has, belongs_to) {
        (Cardinality::One, Cardinality::One) => "one-to-one",
        (Cardinality::One, Cardinality::Many) => "one-to-many",
        (Cardinality::Many, Cardinality::One) => "many-to-one",
        (Cardinality::Many, Cardinality::Many) => "many-to-many",
    }
}
