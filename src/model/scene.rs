//! Scenes (pages) and the views they contain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::object::SortOrder;

/// A sort spec attached to a view source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSort {
    /// Field key sorted on.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

/// Parent record binding of a view source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentSource {
    /// Key of the parent object.
    pub object: String,
    /// Key of the connection field linking parent and child.
    pub connection: String,
}

/// Where a view draws its records from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSource {
    /// Primary object key.
    pub object: String,
    /// Sort specs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<ViewSort>>,
    /// Record limit, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Value>,
    /// Filter criteria, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Value>,
    /// Parent record binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_source: Option<ParentSource>,
    /// Connection field key used to scope records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_key: Option<String>,
    /// Relationship type tag, e.g. `local` or `foreign`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
    /// Whether records are scoped to the logged-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticated_user: Option<bool>,
}

/// Reference to a field from a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldKeyRef {
    /// Field key, when the column is bound to a field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// A column of a table or list view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewColumn {
    /// Column type tag.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
    /// Bound field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldKeyRef>,
    /// Header text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Linked scene for link columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
}

impl ViewColumn {
    /// Key of the bound field, if any.
    #[must_use]
    pub fn field_key(&self) -> Option<&str> {
        self.field.as_ref()?.key.as_deref()
    }
}

/// A UI component inside a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// Unique view key, e.g. `view_4`.
    pub key: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// View type tag such as `table`, `form` or `details`.
    #[serde(rename = "type")]
    pub view_type: String,
    /// Optional title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Record source; absent for menus and rich text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ViewSource>,
    /// Columns of table-like views.
    #[serde(default)]
    pub columns: Vec<ViewColumn>,
    /// Form inputs, kept verbatim.
    #[serde(default)]
    pub inputs: Vec<Value>,
}

impl View {
    /// Field keys bound by form inputs, in input order.
    ///
    /// An input binds a field through either a top-level `key` or a nested
    /// `field.key`.
    pub fn input_field_keys(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().filter_map(|input| {
            input
                .get("key")
                .and_then(Value::as_str)
                .or_else(|| input.get("field").and_then(|f| f.get("key")).and_then(Value::as_str))
        })
    }
}

/// A UI page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Unique scene key, e.g. `scene_2`.
    pub key: String,
    /// Display name.
    pub name: String,
    /// URL slug.
    #[serde(default)]
    pub slug: String,
    /// Scene type tag.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub scene_type: Option<String>,
    /// Views in display order.
    #[serde(default)]
    pub views: Vec<View>,
    /// Slug or key of the parent scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Menu page slugs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_pages: Option<Vec<String>>,
    /// Whether a login is required.
    #[serde(default)]
    pub authenticated: bool,
    /// Role restrictions, kept verbatim.
    #[serde(default)]
    pub groups: Vec<Value>,
}
