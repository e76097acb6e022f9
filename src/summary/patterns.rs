//! Data, UI, access and technical-debt sections of the summary.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use super::{ratio, round3, tally};
use crate::coupling::CouplingAnalysis;
use crate::error::Result;
use crate::graph::{field_tokens, Graph};
use crate::model::Scene;
use crate::search::UsageSearch;

/// How records of a temporal object evolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Has a status field.
    StatefulEntity,
    /// Has creation or modification timestamps only.
    Timestamped,
}

/// An object whose records move through a lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemporalObject {
    /// Object key.
    pub object_key: String,
    /// Display name.
    pub object_name: String,
    /// Lifecycle kind.
    pub lifecycle: Lifecycle,
}

/// Formula usage across the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationComplexity {
    /// Number of computed fields.
    pub total_formula_fields: usize,
    /// Computed fields per type tag.
    pub by_type: BTreeMap<String, usize>,
    /// Longest chain of formulas referencing formulas.
    pub max_chain_depth: usize,
    /// Human-readable interpretation.
    pub interpretation: String,
}

/// Lifecycle and formula patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataPatterns {
    /// Objects with lifecycle fields.
    pub temporal_objects: Vec<TemporalObject>,
    /// Formula figures.
    pub calculation_complexity: CalculationComplexity,
}

/// Depth of the scene hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationDepth {
    /// Deepest scene, counting the scene itself.
    pub max_depth: usize,
    /// Mean depth over all scenes.
    pub average_depth: f64,
    /// Human-readable interpretation.
    pub interpretation: String,
}

/// Scene and view structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiArchitecture {
    /// Scenes requiring a login.
    pub authenticated_scenes: usize,
    /// Scenes open to the public.
    pub public_scenes: usize,
    /// Views per type tag.
    pub view_types: BTreeMap<String, usize>,
    /// Hierarchy depth.
    pub navigation_depth: NavigationDepth,
}

/// User objects and role restrictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPatterns {
    /// Keys of user-role profile objects.
    pub user_objects: Vec<String>,
    /// Keys of scenes restricted to specific roles.
    pub role_restricted_scenes: Vec<String>,
}

/// Unused and overloaded parts of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnicalDebt {
    /// Fields referenced nowhere.
    pub orphaned_fields: Vec<String>,
    /// Non-profile objects with no connections and no views.
    pub orphaned_objects: Vec<String>,
    /// Objects with five or more inbound connections.
    pub bottleneck_objects: Vec<String>,
    /// Objects with five or more outbound connections.
    pub high_fan_out_objects: Vec<String>,
    /// Human-readable interpretation.
    pub interpretation: String,
}

pub(super) fn data_patterns(graph: &Graph) -> DataPatterns {
    let temporal_objects = graph
        .objects()
        .iter()
        .filter(|o| o.is_temporal())
        .map(|o| TemporalObject {
            object_key: o.key.clone(),
            object_name: o.name.clone(),
            lifecycle: if o.fields.iter().any(|f| f.name.to_ascii_lowercase().contains("status"))
            {
                Lifecycle::StatefulEntity
            } else {
                Lifecycle::Timestamped
            },
        })
        .collect();

    let formulas: Vec<_> =
        graph.objects().iter().flat_map(|o| o.fields.iter()).filter(|f| f.is_formula()).collect();
    let total_formula_fields = formulas.len();
    let mut depths = HashMap::new();
    let max_chain_depth = formulas
        .iter()
        .map(|f| chain_depth(graph, &f.key, &mut depths, &mut HashSet::new()))
        .max()
        .unwrap_or(0);

    DataPatterns {
        temporal_objects,
        calculation_complexity: CalculationComplexity {
            total_formula_fields,
            by_type: tally(formulas.iter().map(|f| f.field_type.as_str())),
            max_chain_depth,
            interpretation: if total_formula_fields > 30 {
                "High calculation complexity - heavy business logic in formulas".into()
            } else if total_formula_fields > 10 {
                "Moderate calculation complexity".into()
            } else {
                "Low calculation complexity".into()
            },
        },
    }
}

/// Length of the longest formula chain ending at `key`.
///
/// A formula counts 1 plus the deepest formula it references; plain fields
/// count 0. Cycles are cut where they close.
fn chain_depth(
    graph: &Graph,
    key: &str,
    memo: &mut HashMap<String, usize>,
    visiting: &mut HashSet<String>,
) -> usize {
    if let Some(&depth) = memo.get(key) {
        return depth;
    }
    let Some(found) = graph.field(key) else { return 0 };
    if !found.field.is_formula() || !visiting.insert(key.to_string()) {
        return 0;
    }
    let equation = found.field.equation_text().unwrap_or_default();
    let deepest = field_tokens(&equation)
        .map(|token| chain_depth(graph, token, memo, visiting))
        .max()
        .unwrap_or(0);
    visiting.remove(key);
    memo.insert(key.to_string(), deepest + 1);
    deepest + 1
}

pub(super) fn ui_architecture(graph: &Graph) -> UiArchitecture {
    let scenes = graph.scenes();
    let authenticated_scenes = scenes.iter().filter(|s| s.authenticated).count();

    let depths: Vec<usize> = scenes.iter().map(|s| scene_depth(scenes, s)).collect();
    let max_depth = depths.iter().copied().max().unwrap_or(0);
    let average_depth = round3(ratio(depths.iter().sum(), depths.len()));

    UiArchitecture {
        authenticated_scenes,
        public_scenes: scenes.len() - authenticated_scenes,
        view_types: tally(graph.views().map(|at| at.view.view_type.as_str())),
        navigation_depth: NavigationDepth {
            max_depth,
            average_depth,
            interpretation: if max_depth > 4 {
                "Deep navigation hierarchy - users click through many levels".into()
            } else if max_depth > 2 {
                "Moderate navigation depth".into()
            } else {
                "Flat navigation".into()
            },
        },
    }
}

/// Number of scenes from the root down to `scene`, inclusive.
///
/// Parents are referenced by slug or key; an unknown parent ends the chain.
fn scene_depth(scenes: &[Scene], scene: &Scene) -> usize {
    let mut depth = 1;
    let mut seen: HashSet<&str> = HashSet::from([scene.key.as_str()]);
    let mut current = scene;
    while let Some(parent) = current.parent.as_deref() {
        let Some(next) = scenes.iter().find(|s| s.slug == parent || s.key == parent) else {
            break;
        };
        if !seen.insert(next.key.as_str()) {
            break;
        }
        depth += 1;
        current = next;
    }
    depth
}

pub(super) fn access_patterns(graph: &Graph) -> AccessPatterns {
    AccessPatterns {
        user_objects: graph
            .objects()
            .iter()
            .filter(|o| o.is_user_profile())
            .map(|o| o.key.clone())
            .collect(),
        role_restricted_scenes: graph
            .scenes()
            .iter()
            .filter(|s| !s.groups.is_empty())
            .map(|s| s.key.clone())
            .collect(),
    }
}

pub(super) fn technical_debt(graph: &Graph, coupling: &CouplingAnalysis) -> Result<TechnicalDebt> {
    let search = UsageSearch::new(graph);
    let mut orphaned_fields = Vec::new();
    for object in graph.objects() {
        for field in &object.fields {
            if search.search_field(&field.key)?.is_empty() {
                orphaned_fields.push(field.key.clone());
            }
        }
    }

    let orphaned_objects: Vec<String> = coupling
        .metrics()
        .iter()
        .filter(|m| !m.is_user_profile && m.total == 0 && m.view_count == 0)
        .map(|m| m.object_key.clone())
        .collect();
    let bottleneck_objects: Vec<String> =
        coupling.metrics().iter().filter(|m| m.afferent >= 5).map(|m| m.object_key.clone()).collect();
    let high_fan_out_objects: Vec<String> =
        coupling.metrics().iter().filter(|m| m.efferent >= 5).map(|m| m.object_key.clone()).collect();

    let flagged = orphaned_objects.len() + bottleneck_objects.len() + high_fan_out_objects.len();
    let interpretation = if flagged == 0 && orphaned_fields.is_empty() {
        "No significant technical debt indicators".to_string()
    } else {
        format!(
            "{} unused fields, {} orphaned objects, {} bottlenecks, {} high fan-out objects",
            orphaned_fields.len(),
            orphaned_objects.len(),
            bottleneck_objects.len(),
            high_fan_out_objects.len()
        )
    };

    Ok(TechnicalDebt {
        orphaned_fields,
        orphaned_objects,
        bottleneck_objects,
        high_fan_out_objects,
        interpretation,
    })
}
