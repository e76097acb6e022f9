//! Objects, fields and connections as they appear in a metadata export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field types whose value is computed from other fields.
pub const FORMULA_FIELD_TYPES: &[&str] =
    &["equation", "concatenation", "count", "sum", "min", "max", "average"];

/// Connection cardinality on one side of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// At most one record.
    One,
    /// Any number of records.
    Many,
}

impl Cardinality {
    /// Lowercase label as used in the export.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::One => "one",
            Self::Many => "many",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Lowercase label as used in the export.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Singular and plural display names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inflections {
    /// Singular form.
    #[serde(default)]
    pub singular: String,
    /// Plural form.
    #[serde(default)]
    pub plural: String,
}

/// Free-form field format options; only `equation` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldFormat {
    /// Formula text for computed fields. Usually a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation: Option<Value>,
    /// Every other format option, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Relationship settings carried by a connection-typed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRelationship {
    /// Cardinality on the owning side.
    pub has: Cardinality,
    /// Key of the connected object.
    pub object: String,
    /// Cardinality on the connected side.
    pub belongs_to: Cardinality,
}

/// A single field of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnackField {
    /// Globally unique field key, e.g. `field_12`.
    pub key: String,
    /// Display name.
    pub name: String,
    /// External type tag, e.g. `short_text` or `connection`.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Whether a value is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Whether values must be unique.
    #[serde(default)]
    pub unique: bool,
    /// Whether this is a built-in user field.
    #[serde(default)]
    pub user: bool,
    /// Whether the field carries conditional rules.
    #[serde(default)]
    pub conditional: bool,
    /// Format options, including formula equations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FieldFormat>,
    /// Relationship settings for connection fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<FieldRelationship>,
}

impl KnackField {
    /// Formula text as a string, serializing non-string equations to JSON.
    #[must_use]
    pub fn equation_text(&self) -> Option<String> {
        match self.format.as_ref()?.equation.as_ref()? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Whether the field type is one of [`FORMULA_FIELD_TYPES`].
    #[must_use]
    pub fn is_formula(&self) -> bool {
        FORMULA_FIELD_TYPES.contains(&self.field_type.as_str())
    }

    /// Whether the field marks a record lifecycle: a creation or modification
    /// timestamp type, or a field named like a status.
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        let kind = self.field_type.to_ascii_lowercase();
        kind.contains("created")
            || kind.contains("modified")
            || self.name.to_ascii_lowercase().contains("status")
    }
}

/// Display name of the connection field as seen from the other side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionFieldName {
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// A declared connection in an object's inbound or outbound list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Cardinality on the source side.
    pub has: Cardinality,
    /// Key of the connection field on the source object.
    pub key: String,
    /// Display name of the connection.
    pub name: String,
    /// Reverse-side field metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<ConnectionFieldName>,
    /// Key of the object at the other end.
    pub object: String,
    /// Cardinality on the target side.
    pub belongs_to: Cardinality,
}

impl Connection {
    /// Relationship label such as `many to one`.
    #[must_use]
    pub fn relationship(&self) -> String {
        format!("{} to {}", self.has.as_str(), self.belongs_to.as_str())
    }
}

/// Inbound and outbound connection lists of an object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connections {
    /// Connections whose source is another object and whose target is this one.
    #[serde(default)]
    pub inbound: Vec<Connection>,
    /// Connections realized by fields on this object.
    #[serde(default)]
    pub outbound: Vec<Connection>,
}

/// Default record ordering of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSort {
    /// Field key sorted on.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

/// A data table of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnackObject {
    /// Globally unique object key, e.g. `object_3`.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Singular and plural names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflections: Option<Inflections>,
    /// Declared connections.
    #[serde(default)]
    pub connections: Connections,
    /// Fields in document order.
    #[serde(default)]
    pub fields: Vec<KnackField>,
    /// Default sort.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<ObjectSort>,
    /// Whether this object stores application users.
    #[serde(default)]
    pub user: bool,
    /// External object type tag.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// Key of the display identifier field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Set on user-role profile objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_key: Option<String>,
}

impl KnackObject {
    /// Whether the object is a user-role profile.
    #[must_use]
    pub fn is_user_profile(&self) -> bool {
        self.profile_key.is_some()
    }

    /// Whether any field marks a record lifecycle.
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        self.fields.iter().any(KnackField::is_temporal)
    }

    /// Looks up an owned field by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&KnackField> {
        self.fields.iter().find(|field| field.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(value: Value) -> KnackField {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn equation_text_handles_strings_and_structures() {
        let text = field(json!({
            "key": "field_1", "name": "Total", "type": "equation",
            "format": {"equation": "{field_2} * 2", "format": "number"}
        }));
        assert_eq!(text.equation_text().as_deref(), Some("{field_2} * 2"));
        assert!(text.is_formula());

        let structured = field(json!({
            "key": "field_3", "name": "Label", "type": "concatenation",
            "format": {"equation": [{"type": "field", "field": "{field_2}"}]}
        }));
        assert!(structured.equation_text().unwrap().contains("{field_2}"));

        let plain = field(json!({"key": "field_4", "name": "Name", "type": "short_text"}));
        assert!(plain.equation_text().is_none());
        assert!(!plain.is_formula());
    }

    #[test]
    fn format_keeps_unknown_options() {
        let parsed = field(json!({
            "key": "field_1", "name": "Amount", "type": "currency",
            "format": {"format": "$", "precision": 2}
        }));
        let format = parsed.format.unwrap();
        assert!(format.equation.is_none());
        assert_eq!(format.extra.get("precision"), Some(&json!(2)));
    }

    #[test]
    fn temporal_detection_uses_type_and_name() {
        let status = field(json!({"key": "field_1", "name": "Order Status", "type": "multiple_choice"}));
        let created = field(json!({"key": "field_2", "name": "Opened", "type": "created_date"}));
        let other = field(json!({"key": "field_3", "name": "Due", "type": "date_time"}));
        assert!(status.is_temporal());
        assert!(created.is_temporal());
        assert!(!other.is_temporal());
    }

    #[test]
    fn connection_relationship_label() {
        let conn: Connection = serde_json::from_value(json!({
            "has": "many", "key": "field_9", "name": "Customer",
            "object": "object_2", "belongs_to": "one"
        }))
        .unwrap();
        assert_eq!(conn.relationship(), "many to one");
    }

    #[test]
    fn unknown_cardinality_is_rejected() {
        let result: Result<Connection, _> = serde_json::from_value(json!({
            "has": "some", "key": "field_9", "name": "Customer",
            "object": "object_2", "belongs_to": "one"
        }));
        assert!(result.is_err());
    }
}
