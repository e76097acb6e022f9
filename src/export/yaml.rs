use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::{relationship_type, sql_type};
use crate::model::{Application, Cardinality, Connection, FieldRelationship, Inflections};

/// Application header of a [`YamlSchema`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppHeader {
    /// Display name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Application id.
    pub id: String,
    /// Free-text description.
    pub description: Option<String>,
}

/// A column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YamlField {
    /// Field key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Field type tag.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Approximate SQL type.
    pub sql_type: &'static str,
    /// Whether a value is required.
    pub required: bool,
    /// Whether values must be unique.
    pub unique: bool,
    /// Set on fields tied to user accounts.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_user_field: bool,
    /// Set on conditionally computed fields.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub conditional: bool,
    /// Connection target of a connection field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<FieldRelationship>,
    /// Format settings, kept verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<BTreeMap<String, Value>>,
}

/// A connection seen from one end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YamlConnection {
    /// Connection field key.
    pub key: String,
    /// Connection display name.
    pub name: String,
    /// The object at the other end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_object: Option<String>,
    /// The object at the other end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_object: Option<String>,
    /// Name of the connection field on the other end.
    pub field_name: String,
    /// Cardinality on the owning side.
    pub has: Cardinality,
    /// Cardinality on the target side.
    pub belongs_to: Cardinality,
    /// Hyphenated relationship label.
    pub relationship_type: &'static str,
}

/// Both connection lists of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YamlConnections {
    /// Connections declared by this object.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outbound: Vec<YamlConnection>,
    /// Connections pointing at this object.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inbound: Vec<YamlConnection>,
}

/// A table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YamlObject {
    /// Object key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Number of records.
    pub record_count: u64,
    /// Whether the object holds user accounts.
    pub is_user_object: bool,
    /// Display-identifier field key.
    pub identifier_field: Option<String>,
    /// Singular and plural names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflections: Option<Inflections>,
    /// Columns.
    pub fields: Vec<YamlField>,
    /// Foreign keys.
    pub connections: YamlConnections,
}

/// The whole YAML document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YamlSchema {
    /// Application header.
    pub application: AppHeader,
    /// Tables in document order.
    pub objects: Vec<YamlObject>,
}

/// Builds the YAML schema document.
#[must_use]
pub fn to_yaml_schema(app: &Application) -> YamlSchema {
    YamlSchema {
        application: AppHeader {
            name: app.name.clone(),
            slug: app.slug.clone(),
            id: app.id.clone(),
            description: app.description.clone(),
        },
        objects: app
            .objects
            .iter()
            .map(|object| YamlObject {
                key: object.key.clone(),
                name: object.name.clone(),
                record_count: app.record_count(&object.key),
                is_user_object: object.user,
                identifier_field: object.identifier.clone(),
                inflections: object.inflections.clone(),
                fields: object
                    .fields
                    .iter()
                    .map(|field| YamlField {
                        key: field.key.clone(),
                        name: field.name.clone(),
                        field_type: field.field_type.clone(),
                        sql_type: sql_type(&field.field_type),
                        required: field.required,
                        unique: field.unique,
                        is_user_field: field.user,
                        conditional: field.conditional,
                        relationship: field.relationship.clone(),
                        format: field.format.as_ref().map(format_map),
                    })
                    .collect(),
                connections: YamlConnections {
                    outbound: object.connections.outbound.iter().map(|c| connection(c, true)).collect(),
                    inbound: object.connections.inbound.iter().map(|c| connection(c, false)).collect(),
                },
            })
            .collect(),
    }
}

fn format_map(format: &crate::model::FieldFormat) -> BTreeMap<String, Value> {
    let mut map = format.extra.clone();
    if let Some(equation) = &format.equation {
        map.insert("equation".into(), equation.clone());
    }
    map
}

fn connection(conn: &Connection, outbound: bool) -> YamlConnection {
    let other = Some(conn.object.clone());
    YamlConnection {
        key: conn.key.clone(),
        name: conn.name.clone(),
        target_object: if outbound { other.clone() } else { None },
        source_object: if outbound { None } else { other },
        field_name: conn.field.as_ref().map(|f| f.name.clone()).unwrap_or_default(),
        has: conn.has,
        belongs_to: conn.belongs_to,
        relationship_type: relationship_type(conn.has, conn.belongs_to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::sample_app;

    #[test]
    fn objects_fields_and_connections() {
        let schema = to_yaml_schema(&sample_app().application);
        assert_eq!(schema.application.id, "app_tracker_01");
        assert_eq!(schema.objects.len(), 5);

        let tasks = &schema.objects[3];
        assert_eq!(tasks.key, "object_4");
        assert_eq!(tasks.record_count, 900);
        assert_eq!(tasks.connections.outbound.len(), 2);
        assert_eq!(tasks.connections.outbound[0].relationship_type, "many-to-one");
        assert_eq!(tasks.connections.outbound[0].target_object.as_deref(), Some("object_3"));
        assert!(tasks.connections.inbound.is_empty());

        let remaining = schema.objects[2].fields.iter().find(|f| f.key == "field_25").unwrap();
        assert_eq!(remaining.sql_type, "TEXT");
        assert_eq!(
            remaining.format.as_ref().unwrap()["equation"],
            Value::String("{field_23} - {field_24}".into())
        );
    }

    #[test]
    fn yaml_text_uses_snake_case_keys() {
        let text = serde_yaml::to_string(&to_yaml_schema(&sample_app().application)).unwrap();
        assert!(text.contains("relationship_type: many-to-one"));
        assert!(text.contains("sql_type: VARCHAR(255)"));
        assert!(!text.contains("source_object: null"));
    }
}
