//! Immutable metadata graph with forward and backward indices.
//!
//! A [`Graph`] is built once from a parsed export. Construction checks every
//! key referenced by connections, views and formulas; afterwards all lookups
//! are infallible with respect to document integrity. Rebuilding means
//! constructing a new `Graph`.

mod validate;

pub(crate) use validate::field_tokens;

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Result, SleuthError};
use crate::model::{AppExport, Application, Cardinality, KnackField, KnackObject, Scene, View};

/// Which side of a connection an edge list was declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Declared in the target object's inbound list.
    Inbound,
    /// Declared in the source object's outbound list.
    Outbound,
}

/// A directed connection between two objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionEdge {
    /// Object owning the connection field.
    pub source: String,
    /// Object the connection points at.
    pub target: String,
    /// Connection field on the source object.
    pub field_key: String,
    /// Display name of the connection.
    pub name: String,
    /// Cardinality on the source side.
    pub has: Cardinality,
    /// Cardinality on the target side.
    pub belongs_to: Cardinality,
    /// Where the edge was declared.
    pub direction: Direction,
}

impl ConnectionEdge {
    /// Relationship label such as `many to one`.
    #[must_use]
    pub fn relationship(&self) -> String {
        format!("{} to {}", self.has.as_str(), self.belongs_to.as_str())
    }
}

/// A field together with its owning object.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    /// Owning object.
    pub object: &'a KnackObject,
    /// The field.
    pub field: &'a KnackField,
}

/// A view together with its scene.
#[derive(Debug, Clone, Copy)]
pub struct ViewRef<'a> {
    /// Containing scene.
    pub scene: &'a Scene,
    /// The view.
    pub view: &'a View,
}

/// Result of resolving a user-supplied identifier.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    /// An object matched.
    Object(&'a KnackObject),
    /// A field matched.
    Field(FieldRef<'a>),
}

/// The indexed application graph.
#[derive(Debug)]
pub struct Graph {
    app: Application,
    object_index: HashMap<String, usize>,
    field_index: HashMap<String, (usize, usize)>,
    scene_index: HashMap<String, usize>,
    inbound: Vec<Vec<ConnectionEdge>>,
    outbound: Vec<Vec<ConnectionEdge>>,
    view_counts: Vec<usize>,
}

impl Graph {
    /// Builds the graph from a parsed export.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::Validation`] on duplicate object, field or scene
    /// keys and [`SleuthError::Reference`] when a connection, view, sort,
    /// identifier or formula names a key that does not exist.
    pub fn build(export: AppExport) -> Result<Self> {
        let app = export.application;

        let mut object_index = HashMap::with_capacity(app.objects.len());
        let mut field_index = HashMap::new();
        for (oi, object) in app.objects.iter().enumerate() {
            if object_index.insert(object.key.clone(), oi).is_some() {
                return Err(SleuthError::Validation(format!(
                    "duplicate object key '{}'",
                    object.key
                )));
            }
            for (fi, field) in object.fields.iter().enumerate() {
                if field_index.insert(field.key.clone(), (oi, fi)).is_some() {
                    return Err(SleuthError::Validation(format!(
                        "duplicate field key '{}'",
                        field.key
                    )));
                }
            }
        }

        let mut scene_index = HashMap::with_capacity(app.scenes.len());
        for (si, scene) in app.scenes.iter().enumerate() {
            if scene_index.insert(scene.key.clone(), si).is_some() {
                return Err(SleuthError::Validation(format!(
                    "duplicate scene key '{}'",
                    scene.key
                )));
            }
        }

        validate::check_references(&app, &object_index, &field_index)?;

        let inbound = app
            .objects
            .iter()
            .map(|object| {
                object
                    .connections
                    .inbound
                    .iter()
                    .map(|conn| ConnectionEdge {
                        source: conn.object.clone(),
                        target: object.key.clone(),
                        field_key: conn.key.clone(),
                        name: conn.name.clone(),
                        has: conn.has,
                        belongs_to: conn.belongs_to,
                        direction: Direction::Inbound,
                    })
                    .collect()
            })
            .collect();
        let outbound = app
            .objects
            .iter()
            .map(|object| {
                object
                    .connections
                    .outbound
                    .iter()
                    .map(|conn| ConnectionEdge {
                        source: object.key.clone(),
                        target: conn.object.clone(),
                        field_key: conn.key.clone(),
                        name: conn.name.clone(),
                        has: conn.has,
                        belongs_to: conn.belongs_to,
                        direction: Direction::Outbound,
                    })
                    .collect()
            })
            .collect();

        let mut view_counts = vec![0; app.objects.len()];
        for scene in &app.scenes {
            for view in &scene.views {
                if let Some(source) = &view.source {
                    if let Some(&oi) = object_index.get(&source.object) {
                        view_counts[oi] += 1;
                    }
                }
            }
        }

        let graph = Self {
            app,
            object_index,
            field_index,
            scene_index,
            inbound,
            outbound,
            view_counts,
        };
        tracing::debug!(
            objects = graph.app.objects.len(),
            fields = graph.field_index.len(),
            scenes = graph.app.scenes.len(),
            views = graph.view_total(),
            "metadata graph built"
        );
        Ok(graph)
    }

    /// The underlying application document.
    #[must_use]
    pub fn application(&self) -> &Application {
        &self.app
    }

    /// Objects in document order.
    #[must_use]
    pub fn objects(&self) -> &[KnackObject] {
        &self.app.objects
    }

    /// Scenes in document order.
    #[must_use]
    pub fn scenes(&self) -> &[Scene] {
        &self.app.scenes
    }

    /// Every view with its scene, in document order.
    pub fn views(&self) -> impl Iterator<Item = ViewRef<'_>> {
        self.app
            .scenes
            .iter()
            .flat_map(|scene| scene.views.iter().map(move |view| ViewRef { scene, view }))
    }

    /// Number of views across all scenes.
    #[must_use]
    pub fn view_total(&self) -> usize {
        self.app.scenes.iter().map(|scene| scene.views.len()).sum()
    }

    /// Number of fields across all objects.
    #[must_use]
    pub fn field_total(&self) -> usize {
        self.field_index.len()
    }

    /// Looks up an object by exact key.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<&KnackObject> {
        self.object_index.get(key).map(|&oi| &self.app.objects[oi])
    }

    /// Document position of an object.
    #[must_use]
    pub fn object_position(&self, key: &str) -> Option<usize> {
        self.object_index.get(key).copied()
    }

    /// Looks up a field and its owner by exact key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<FieldRef<'_>> {
        self.field_index.get(key).map(|&(oi, fi)| {
            let object = &self.app.objects[oi];
            FieldRef { object, field: &object.fields[fi] }
        })
    }

    /// Looks up a scene by exact key.
    #[must_use]
    pub fn scene(&self, key: &str) -> Option<&Scene> {
        self.scene_index.get(key).map(|&si| &self.app.scenes[si])
    }

    /// Connections targeting the object; empty for unknown keys.
    #[must_use]
    pub fn inbound(&self, key: &str) -> &[ConnectionEdge] {
        self.object_index.get(key).map_or(&[], |&oi| self.inbound[oi].as_slice())
    }

    /// Connections originating at the object; empty for unknown keys.
    #[must_use]
    pub fn outbound(&self, key: &str) -> &[ConnectionEdge] {
        self.object_index.get(key).map_or(&[], |&oi| self.outbound[oi].as_slice())
    }

    /// Number of views whose primary source is the object.
    #[must_use]
    pub fn view_count(&self, key: &str) -> usize {
        self.object_index.get(key).map_or(0, |&oi| self.view_counts[oi])
    }

    /// Record count of the object; absent counts as zero.
    #[must_use]
    pub fn record_count(&self, key: &str) -> u64 {
        self.app.record_count(key)
    }

    /// Resolves an object by key or display name.
    ///
    /// Tries the exact key, then the key ignoring case, then the display
    /// name ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::AmbiguousLookup`] when several objects match at
    /// the same step and [`SleuthError::NotFound`] when none do.
    pub fn resolve_object(&self, query: &str) -> Result<&KnackObject> {
        let query = query.trim();
        if let Some(object) = self.object(query) {
            return Ok(object);
        }
        if let Some(found) = self.unique_object(query, |o| o.key.eq_ignore_ascii_case(query)) {
            return found;
        }
        if let Some(found) = self.unique_object(query, |o| o.name.eq_ignore_ascii_case(query)) {
            return found;
        }
        Err(SleuthError::NotFound(format!("object '{query}'")))
    }

    /// Resolves a field by key or display name, with the same steps as
    /// [`Graph::resolve_object`].
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::AmbiguousLookup`] when several fields match at
    /// the same step and [`SleuthError::NotFound`] when none do.
    pub fn resolve_field(&self, query: &str) -> Result<FieldRef<'_>> {
        let query = query.trim();
        if let Some(field) = self.field(query) {
            return Ok(field);
        }
        if let Some(found) = self.unique_field(query, |f| f.key.eq_ignore_ascii_case(query)) {
            return found;
        }
        if let Some(found) = self.unique_field(query, |f| f.name.eq_ignore_ascii_case(query)) {
            return found;
        }
        Err(SleuthError::NotFound(format!("field '{query}'")))
    }

    /// Resolves an identifier that may name either an object or a field.
    ///
    /// Exact keys first (objects, then fields), then keys ignoring case,
    /// then display names ignoring case. Objects win over fields at each step.
    ///
    /// # Errors
    ///
    /// Returns [`SleuthError::AmbiguousLookup`] when several candidates of the
    /// same kind match at one step and [`SleuthError::NotFound`] when nothing matches.
    pub fn resolve(&self, query: &str) -> Result<Resolved<'_>> {
        let query = query.trim();
        if let Some(object) = self.object(query) {
            return Ok(Resolved::Object(object));
        }
        if let Some(field) = self.field(query) {
            return Ok(Resolved::Field(field));
        }

        if let Some(found) = self.unique_object(query, |o| o.key.eq_ignore_ascii_case(query)) {
            return found.map(Resolved::Object);
        }
        if let Some(found) = self.unique_field(query, |f| f.key.eq_ignore_ascii_case(query)) {
            return found.map(Resolved::Field);
        }
        if let Some(found) = self.unique_object(query, |o| o.name.eq_ignore_ascii_case(query)) {
            return found.map(Resolved::Object);
        }
        if let Some(found) = self.unique_field(query, |f| f.name.eq_ignore_ascii_case(query)) {
            return found.map(Resolved::Field);
        }
        Err(SleuthError::NotFound(format!("no object or field matches '{query}'")))
    }

    fn unique_object<F>(&self, query: &str, predicate: F) -> Option<Result<&KnackObject>>
    where
        F: Fn(&KnackObject) -> bool,
    {
        let hits: Vec<&KnackObject> = self.app.objects.iter().filter(|o| predicate(o)).collect();
        match hits.as_slice() {
            [] => None,
            [only] => Some(Ok(*only)),
            many => Some(Err(SleuthError::AmbiguousLookup {
                query: query.to_string(),
                candidates: many.iter().map(|o| o.key.clone()).collect(),
            })),
        }
    }

    fn unique_field<F>(&self, query: &str, predicate: F) -> Option<Result<FieldRef<'_>>>
    where
        F: Fn(&KnackField) -> bool,
    {
        let hits: Vec<FieldRef<'_>> = self
            .app
            .objects
            .iter()
            .flat_map(|object| {
                object.fields.iter().map(move |field| FieldRef { object, field })
            })
            .filter(|r| predicate(r.field))
            .collect();
        match hits.as_slice() {
            [] => None,
            [only] => Some(Ok(*only)),
            many => Some(Err(SleuthError::AmbiguousLookup {
                query: query.to_string(),
                candidates: many.iter().map(|r| r.field.key.clone()).collect(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{linked, sample_app, scenario_ab};

    #[test]
    fn indexes_sample_application() {
        let graph = Graph::build(sample_app()).unwrap();
        assert_eq!(graph.objects().len(), 5);
        assert_eq!(graph.field_total(), 17);
        assert_eq!(graph.view_total(), 5);
        assert_eq!(graph.field("field_25").unwrap().object.key, "object_3");
        assert_eq!(graph.scene("scene_2").unwrap().slug, "project-details");
        assert_eq!(graph.object_position("object_4"), Some(3));
    }

    #[test]
    fn afferent_and_efferent_lists_follow_declarations() {
        let graph = Graph::build(sample_app()).unwrap();
        assert_eq!(graph.inbound("object_1").len(), 2);
        assert_eq!(graph.outbound("object_1").len(), 0);
        assert_eq!(graph.outbound("object_4").len(), 2);
        let edge = &graph.outbound("object_4")[0];
        assert_eq!(edge.source, "object_4");
        assert_eq!(edge.target, "object_3");
        assert_eq!(edge.field_key, "field_31");
        assert_eq!(edge.direction, Direction::Outbound);
        let back = &graph.inbound("object_3")[0];
        assert_eq!(back.source, "object_4");
        assert_eq!(back.target, "object_3");
        assert_eq!(back.direction, Direction::Inbound);
        assert!(graph.inbound("object_404").is_empty());
    }

    #[test]
    fn counts_views_and_records_per_object() {
        let graph = Graph::build(sample_app()).unwrap();
        assert_eq!(graph.view_count("object_2"), 2);
        assert_eq!(graph.view_count("object_3"), 1);
        assert_eq!(graph.view_count("object_5"), 0);
        assert_eq!(graph.record_count("object_4"), 900);
        assert_eq!(graph.record_count("object_404"), 0);
    }

    #[test]
    fn self_connection_counts_once_per_side() {
        let graph = Graph::build(linked(1, &[(0, 0)])).unwrap();
        assert_eq!(graph.inbound("object_0").len(), 1);
        assert_eq!(graph.outbound("object_0").len(), 1);
    }

    #[test]
    fn scenario_has_one_connection_each_way() {
        let graph = Graph::build(scenario_ab()).unwrap();
        assert_eq!(graph.inbound("object_a").len(), 1);
        assert_eq!(graph.outbound("object_b").len(), 1);
    }

    #[test]
    fn resolves_objects_by_key_or_name() {
        let graph = Graph::build(sample_app()).unwrap();
        assert_eq!(graph.resolve_object("object_2").unwrap().name, "Customers");
        assert_eq!(graph.resolve_object("OBJECT_2").unwrap().name, "Customers");
        assert_eq!(graph.resolve_object("  tasks ").unwrap().key, "object_4");
        assert!(matches!(graph.resolve_object("Invoices"), Err(SleuthError::NotFound(_))));
    }

    #[test]
    fn ambiguous_field_name_is_reported() {
        let graph = Graph::build(sample_app()).unwrap();
        let err = graph.resolve_field("Name").unwrap_err();
        match err {
            SleuthError::AmbiguousLookup { candidates, .. } => {
                assert_eq!(candidates, vec!["field_1", "field_10", "field_30"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(graph.resolve_field("budget").unwrap().field.key, "field_23");
    }

    fn with_duplicate_object_name() -> crate::model::AppExport {
        let mut value: serde_json::Value =
            serde_json::from_str(crate::model::fixtures::SAMPLE_APP_JSON).unwrap();
        value["application"]["objects"][4]["name"] = "Customers".into();
        crate::model::AppExport::from_value(value).unwrap()
    }

    #[test]
    fn ambiguous_object_name_is_reported() {
        let graph = Graph::build(with_duplicate_object_name()).unwrap();
        for result in [
            graph.resolve_object("customers").map(|o| o.key.clone()),
            graph.resolve("customers").map(|_| String::new()),
        ] {
            match result {
                Err(SleuthError::AmbiguousLookup { query, candidates }) => {
                    assert_eq!(query, "customers");
                    assert_eq!(candidates, vec!["object_2", "object_5"]);
                }
                other => panic!("expected ambiguity, got {other:?}"),
            }
        }
        // Keys stay unambiguous.
        assert_eq!(graph.resolve_object("object_5").unwrap().name, "Customers");
    }

    #[test]
    fn resolve_prefers_objects_over_fields() {
        let graph = Graph::build(sample_app()).unwrap();
        // "Customer" names a field only; "Customers" names the object and nothing else.
        assert!(matches!(graph.resolve("Customers").unwrap(), Resolved::Object(o) if o.key == "object_2"));
        assert!(matches!(graph.resolve("customer").unwrap(), Resolved::Field(f) if f.field.key == "field_21"));
        assert!(matches!(graph.resolve("field_32").unwrap(), Resolved::Field(_)));
        assert!(matches!(graph.resolve("Name"), Err(SleuthError::AmbiguousLookup { .. })));
        assert!(matches!(graph.resolve("nothing"), Err(SleuthError::NotFound(_))));
    }

    #[test]
    fn graph_is_shareable_across_threads() {
        let graph = std::sync::Arc::new(Graph::build(sample_app()).unwrap());
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let graph = std::sync::Arc::clone(&graph);
                scope.spawn(move || assert_eq!(graph.inbound("object_1").len(), 2));
            }
        });
    }
}
