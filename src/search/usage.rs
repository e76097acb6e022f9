//! Usage records produced by the search engine.

use serde::{Deserialize, Serialize};

use crate::model::SortOrder;

/// Where a reference was found. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    /// Another object's outbound connection targets the object.
    ConnectionOutbound,
    /// An object's inbound list names the object as source.
    ConnectionInbound,
    /// The field realizes an outbound connection.
    ConnectionField,
    /// The field is an object's default sort.
    ObjectSort,
    /// The field is an object's display identifier.
    ObjectIdentifier,
    /// The field appears in another field's formula.
    FieldEquation,
    /// A view reads its records from the object.
    ViewSource,
    /// A view is scoped by a parent record of the object.
    ViewParentSource,
    /// A view column shows the field.
    ViewColumn,
    /// A view sorts on the field.
    ViewSort,
    /// A view's parent binding goes through the field.
    ViewParentConnection,
    /// A view scopes records through the field.
    ViewConnectionKey,
    /// A form input writes the field.
    FormInput,
}

/// Coarse grouping of location types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageCategory {
    /// Connection edges and connection fields.
    Connection,
    /// Object sort and identifier settings.
    ObjectSetting,
    /// Formula references.
    Formula,
    /// Display views.
    View,
    /// Form inputs.
    Form,
}

impl LocationType {
    /// Every location type, in search order.
    pub const ALL: [Self; 13] = [
        Self::ConnectionOutbound,
        Self::ConnectionInbound,
        Self::ConnectionField,
        Self::ObjectSort,
        Self::ObjectIdentifier,
        Self::FieldEquation,
        Self::ViewSource,
        Self::ViewParentSource,
        Self::ViewColumn,
        Self::ViewSort,
        Self::ViewParentConnection,
        Self::ViewConnectionKey,
        Self::FormInput,
    ];

    /// Snake-case tag as serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionOutbound => "connection_outbound",
            Self::ConnectionInbound => "connection_inbound",
            Self::ConnectionField => "connection_field",
            Self::ObjectSort => "object_sort",
            Self::ObjectIdentifier => "object_identifier",
            Self::FieldEquation => "field_equation",
            Self::ViewSource => "view_source",
            Self::ViewParentSource => "view_parent_source",
            Self::ViewColumn => "view_column",
            Self::ViewSort => "view_sort",
            Self::ViewParentConnection => "view_parent_connection",
            Self::ViewConnectionKey => "view_connection_key",
            Self::FormInput => "form_input",
        }
    }

    /// Category of this location type.
    #[must_use]
    pub fn category(self) -> UsageCategory {
        match self {
            Self::ConnectionOutbound | Self::ConnectionInbound | Self::ConnectionField => {
                UsageCategory::Connection
            }
            Self::ObjectSort | Self::ObjectIdentifier => UsageCategory::ObjectSetting,
            Self::FieldEquation => UsageCategory::Formula,
            Self::ViewSource
            | Self::ViewParentSource
            | Self::ViewColumn
            | Self::ViewSort
            | Self::ViewParentConnection
            | Self::ViewConnectionKey => UsageCategory::View,
            Self::FormInput => UsageCategory::Form,
        }
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Details of a connection usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionDetails {
    /// Object owning the connection field.
    pub source_object: String,
    /// Display name of the source object.
    pub source_object_name: String,
    /// Object the connection points at.
    pub target_object: String,
    /// Display name of the target object.
    pub target_object_name: String,
    /// Connection field key.
    pub connection_field: String,
    /// Connection display name.
    pub connection_name: String,
    /// Relationship label such as `many to one`.
    pub relationship: String,
}

/// Details of an object sort or identifier usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSettingDetails {
    /// Object carrying the setting.
    pub object_key: String,
    /// Display name of the object.
    pub object_name: String,
    /// Sort direction, for sort settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

/// Details of a formula usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaDetails {
    /// Object owning the formula field.
    pub object_key: String,
    /// Display name of the object.
    pub object_name: String,
    /// Formula field key.
    pub field_key: String,
    /// Formula field name.
    pub field_name: String,
    /// Raw formula text.
    pub equation: String,
}

/// Details of a view or form usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewDetails {
    /// Containing scene.
    pub scene_key: String,
    /// Scene display name.
    pub scene_name: String,
    /// Scene slug.
    pub scene_slug: String,
    /// View key.
    pub view_key: String,
    /// View display name.
    pub view_name: String,
    /// View type tag.
    pub view_type: String,
    /// Primary source object of the view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_object: Option<String>,
    /// Column header, for column usages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_header: Option<String>,
    /// Sort direction, for sort usages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

/// Structured payload of a [`Usage`], shaped by its location type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UsageDetails {
    /// Connection usages.
    Connection(ConnectionDetails),
    /// Object settings.
    ObjectSetting(ObjectSettingDetails),
    /// Formula references.
    Formula(FormulaDetails),
    /// View and form usages.
    View(ViewDetails),
}

/// One structural reference to an object or field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Usage {
    /// Where the reference lives.
    pub location_type: LocationType,
    /// Human-readable description.
    pub context: String,
    /// Structured details.
    pub details: UsageDetails,
}

impl Usage {
    /// Object on the other end of the reference: the object that owns the
    /// connection, setting or formula, or the source object of the view.
    #[must_use]
    pub fn referencing_object(&self) -> Option<&str> {
        match &self.details {
            UsageDetails::Connection(d) => Some(if self.location_type == LocationType::ConnectionInbound {
                &d.target_object
            } else {
                &d.source_object
            }),
            UsageDetails::ObjectSetting(d) => Some(&d.object_key),
            UsageDetails::Formula(d) => Some(&d.object_key),
            UsageDetails::View(d) => d.source_object.as_deref(),
        }
    }

    /// Scene containing the reference, for view and form usages.
    #[must_use]
    pub fn scene_key(&self) -> Option<&str> {
        match &self.details {
            UsageDetails::View(d) => Some(&d.scene_key),
            _ => None,
        }
    }

    /// View details, for view and form usages.
    #[must_use]
    pub fn view(&self) -> Option<&ViewDetails> {
        match &self.details {
            UsageDetails::View(d) => Some(d),
            _ => None,
        }
    }
}

/// Usages of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldUsages {
    /// Field key.
    pub field_key: String,
    /// Field display name.
    pub field_name: String,
    /// Field type tag.
    pub field_type: String,
    /// Usages in search order.
    pub usages: Vec<Usage>,
}

/// Result of searching an object: object-level usages and per-field buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityUsages {
    /// Object key.
    pub object_key: String,
    /// Object display name.
    pub object_name: String,
    /// References to the object itself.
    pub object_usages: Vec<Usage>,
    /// One bucket per owned field with at least one usage, in field order.
    pub field_usages: Vec<FieldUsages>,
}

impl EntityUsages {
    /// Every usage, object-level first, then field buckets in order.
    pub fn all_usages(&self) -> impl Iterator<Item = &Usage> {
        self.object_usages.iter().chain(self.field_usages.iter().flat_map(|f| f.usages.iter()))
    }

    /// Total number of usages.
    #[must_use]
    pub fn total(&self) -> usize {
        self.object_usages.len() + self.field_usages.iter().map(|f| f.usages.len()).sum::<usize>()
    }
}
