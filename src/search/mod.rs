//! Usage search: every structural reference to an object or field.
//!
//! Results follow document order. Object searches cascade into each owned
//! field and keep only the fields that are referenced somewhere.

pub mod usage;

pub use usage::{
    ConnectionDetails, EntityUsages, FieldUsages, FormulaDetails, LocationType,
    ObjectSettingDetails, Usage, UsageCategory, UsageDetails, ViewDetails,
};

use crate::error::{Result, SleuthError};
use crate::graph::{ConnectionEdge, Graph, ViewRef};
use crate::model::{KnackObject, SortOrder};

/// Searches a built [`Graph`] for usages.
#[derive(Debug, Clone, Copy)]
pub struct UsageSearch<'g> {
    graph: &'g Graph,
}

impl<'g> UsageSearch<'g> {
    /// Creates a search over `graph`.
    #[must_use]
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    /// Finds every reference to an object and, in cascade, to its fields.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::NotFound`] if no object has the key.
    pub fn search_entity(&self, object_key: &str) -> Result<EntityUsages> {
        let target = self
            .graph
            .object(object_key)
            .ok_or_else(|| SleuthError::NotFound(format!("object '{object_key}'")))?;

        let mut object_usages = Vec::new();
        for other in self.graph.objects() {
            for edge in self.graph.outbound(&other.key) {
                if edge.target == target.key {
                    object_usages.push(self.connection_usage(
                        LocationType::ConnectionOutbound,
                        edge,
                        format!(
                            "{} ({}) connects to this object via {} ({})",
                            other.name, other.key, edge.name, edge.field_key
                        ),
                    )?);
                }
            }
            for edge in self.graph.inbound(&other.key) {
                if edge.source == target.key {
                    object_usages.push(self.connection_usage(
                        LocationType::ConnectionInbound,
                        edge,
                        format!(
                            "This object connects to {} ({}) via {} ({})",
                            other.name, other.key, edge.name, edge.field_key
                        ),
                    )?);
                }
            }
        }

        for at in self.graph.views() {
            let Some(source) = &at.view.source else { continue };
            if source.object == target.key {
                object_usages.push(view_usage(
                    LocationType::ViewSource,
                    at,
                    format!(
                        "Data source of {} view '{}' in scene '{}'",
                        at.view.view_type, at.view.name, at.scene.name
                    ),
                    None,
                    None,
                ));
            }
            if source.parent_source.as_ref().is_some_and(|p| p.object == target.key) {
                object_usages.push(view_usage(
                    LocationType::ViewParentSource,
                    at,
                    format!(
                        "Parent record source of {} view '{}' in scene '{}'",
                        at.view.view_type, at.view.name, at.scene.name
                    ),
                    None,
                    None,
                ));
            }
        }

        let mut field_usages = Vec::new();
        for field in &target.fields {
            let usages = self.search_field(&field.key)?;
            if !usages.is_empty() {
                field_usages.push(FieldUsages {
                    field_key: field.key.clone(),
                    field_name: field.name.clone(),
                    field_type: field.field_type.clone(),
                    usages,
                });
            }
        }

        tracing::debug!(
            object = %target.key,
            object_usages = object_usages.len(),
            referenced_fields = field_usages.len(),
            "object search complete"
        );
        Ok(EntityUsages {
            object_key: target.key.clone(),
            object_name: target.name.clone(),
            object_usages,
            field_usages,
        })
    }

    /// Finds every reference to a field.
    ///
    /// Formula references are matched on the literal `{field_key}` token.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::NotFound`] if no field has the key.
    pub fn search_field(&self, field_key: &str) -> Result<Vec<Usage>> {
        let target = self
            .graph
            .field(field_key)
            .ok_or_else(|| SleuthError::NotFound(format!("field '{field_key}'")))?;
        let key = target.field.key.as_str();
        let mut usages = Vec::new();

        for object in self.graph.objects() {
            for edge in self.graph.outbound(&object.key) {
                if edge.field_key == key {
                    usages.push(self.connection_usage(
                        LocationType::ConnectionField,
                        edge,
                        format!(
                            "Connection field on {} linking to {} via {}",
                            object.name,
                            self.name_of(&edge.target)?,
                            edge.name
                        ),
                    )?);
                }
            }
        }

        for object in self.graph.objects() {
            if let Some(sort) = object.sort.as_ref().filter(|s| s.field == key) {
                usages.push(object_setting_usage(
                    LocationType::ObjectSort,
                    object,
                    format!("Default sort ({}) of {}", sort.order.as_str(), object.name),
                    Some(sort.order),
                ));
            }
            if object.identifier.as_deref() == Some(key) {
                usages.push(object_setting_usage(
                    LocationType::ObjectIdentifier,
                    object,
                    format!("Display identifier of {}", object.name),
                    None,
                ));
            }
        }

        let token = format!("{{{key}}}");
        for object in self.graph.objects() {
            for field in object.fields.iter().filter(|f| f.key != key) {
                let Some(equation) = field.equation_text() else { continue };
                if equation.contains(&token) {
                    usages.push(Usage {
                        location_type: LocationType::FieldEquation,
                        context: format!(
                            "Referenced in formula of {} ({}) on {}",
                            field.name, field.key, object.name
                        ),
                        details: UsageDetails::Formula(FormulaDetails {
                            object_key: object.key.clone(),
                            object_name: object.name.clone(),
                            field_key: field.key.clone(),
                            field_name: field.name.clone(),
                            equation,
                        }),
                    });
                }
            }
        }

        for at in self.graph.views() {
            for column in at.view.columns.iter().filter(|c| c.field_key() == Some(key)) {
                let header = column.header.clone().unwrap_or_else(|| target.field.name.clone());
                usages.push(view_usage(
                    LocationType::ViewColumn,
                    at,
                    format!(
                        "Column '{header}' in {} view '{}' on scene '{}'",
                        at.view.view_type, at.view.name, at.scene.name
                    ),
                    Some(header),
                    None,
                ));
            }
        }

        for at in self.graph.views() {
            let Some(source) = &at.view.source else { continue };
            for sort in source.sort.iter().flatten().filter(|s| s.field == key) {
                usages.push(view_usage(
                    LocationType::ViewSort,
                    at,
                    format!(
                        "Sort ({}) of view '{}' on scene '{}'",
                        sort.order.as_str(),
                        at.view.name,
                        at.scene.name
                    ),
                    None,
                    Some(sort.order),
                ));
            }
            if source.parent_source.as_ref().is_some_and(|p| p.connection == key) {
                usages.push(view_usage(
                    LocationType::ViewParentConnection,
                    at,
                    format!(
                        "Parent connection of view '{}' on scene '{}'",
                        at.view.name, at.scene.name
                    ),
                    None,
                    None,
                ));
            }
            if source.connection_key.as_deref() == Some(key) {
                usages.push(view_usage(
                    LocationType::ViewConnectionKey,
                    at,
                    format!(
                        "Connection key of view '{}' on scene '{}'",
                        at.view.name, at.scene.name
                    ),
                    None,
                    None,
                ));
            }
        }

        for at in self.graph.views() {
            for _ in at.view.input_field_keys().filter(|k| *k == key) {
                usages.push(view_usage(
                    LocationType::FormInput,
                    at,
                    format!("Input of form '{}' on scene '{}'", at.view.name, at.scene.name),
                    None,
                    None,
                ));
            }
        }

        Ok(usages)
    }

    fn name_of(&self, object_key: &str) -> Result<&'g str> {
        self.graph.object(object_key).map(|o| o.name.as_str()).ok_or_else(|| {
            SleuthError::Internal(format!("indexed connection names unknown object {object_key}"))
        })
    }

    fn connection_usage(
        &self,
        location_type: LocationType,
        edge: &ConnectionEdge,
        context: String,
    ) -> Result<Usage> {
        Ok(Usage {
            location_type,
            context,
            details: UsageDetails::Connection(ConnectionDetails {
                source_object: edge.source.clone(),
                source_object_name: self.name_of(&edge.source)?.to_string(),
                target_object: edge.target.clone(),
                target_object_name: self.name_of(&edge.target)?.to_string(),
                connection_field: edge.field_key.clone(),
                connection_name: edge.name.clone(),
                relationship: edge.relationship(),
            }),
        })
    }
}

fn object_setting_usage(
    location_type: LocationType,
    object: &KnackObject,
    context: String,
    sort_order: Option<SortOrder>,
) -> Usage {
    Usage {
        location_type,
        context,
        details: UsageDetails::ObjectSetting(ObjectSettingDetails {
            object_key: object.key.clone(),
            object_name: object.name.clone(),
            sort_order,
        }),
    }
}

fn view_usage(
    location_type: LocationType,
    at: ViewRef<'_>,
    context: String,
    column_header: Option<String>,
    sort_order: Option<SortOrder>,
) -> Usage {
    Usage {
        location_type,
        context,
        details: UsageDetails::View(ViewDetails {
            scene_key: at.scene.key.clone(),
            scene_name: at.scene.name.clone(),
            scene_slug: at.scene.slug.clone(),
            view_key: at.view.key.clone(),
            view_name: at.view.name.clone(),
            view_type: at.view.view_type.clone(),
            source_object: at.view.source.as_ref().map(|s| s.object.clone()),
            column_header,
            sort_order,
        }),
    }
}
