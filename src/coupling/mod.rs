//! Coupling metrics, centrality, importance and domain-role classification.
//!
//! Afferent coupling (Ca) is the number of inbound connections declared on
//! an object, efferent coupling (Ce) the number of outbound ones. Both feed
//! normalized centrality and importance scores, which in turn drive the
//! role assigned to each object.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::config::AnalysisPolicy;
use crate::graph::Graph;

/// Architectural role of an object in the domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainRole {
    /// Highly central object whose records move through a lifecycle.
    Transactional,
    /// Small lookup table referenced by others.
    Reference,
    /// Among the most important objects by volume and connectivity.
    Core,
    /// Everything else.
    Supporting,
}

impl DomainRole {
    /// Snake-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transactional => "transactional",
            Self::Reference => "reference",
            Self::Core => "core",
            Self::Supporting => "supporting",
        }
    }
}

/// How a hub object participates in the connection graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HubRole {
    /// Many objects depend on it; it depends on few.
    DependencyRoot,
    /// It pulls together many other objects.
    Aggregator,
    /// Heavily connected in both directions.
    CentralComplex,
    /// Above the hub threshold without a dominant direction.
    ModeratelyConnected,
}

impl HubRole {
    /// Human-readable interpretation.
    #[must_use]
    pub fn interpretation(self) -> &'static str {
        match self {
            Self::DependencyRoot => "Central dependency - many objects rely on this, keep it stable",
            Self::Aggregator => "Aggregator - pulls together data from many sources",
            Self::CentralComplex => "Core hub - heavily connected, review for decomposition",
            Self::ModeratelyConnected => "Moderately connected",
        }
    }
}

/// Coupling figures and classification for one object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouplingMetrics {
    /// Object key.
    pub object_key: String,
    /// Object display name.
    pub object_name: String,
    /// Inbound connection count (Ca).
    pub afferent: usize,
    /// Outbound connection count (Ce).
    pub efferent: usize,
    /// Ca + Ce.
    pub total: usize,
    /// Views whose primary source is this object.
    pub view_count: usize,
    /// Record count; zero when unknown.
    pub record_count: u64,
    /// Number of fields.
    pub field_count: usize,
    /// Connectivity and view usage, normalized to [0, 1].
    pub centrality: f64,
    /// Record volume and connectivity, normalized to [0, 1].
    pub importance: f64,
    /// Whether the object is a user-role profile.
    pub is_user_profile: bool,
    /// Whether the object has lifecycle fields.
    pub is_temporal: bool,
    /// Assigned domain role.
    pub role: DomainRole,
    /// Hub interpretation, when the object meets the hub threshold.
    pub hub: Option<HubRole>,
}

/// A directed edge of the connection graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    /// Source object key.
    pub from: String,
    /// Target object key.
    pub to: String,
    /// Connection field key.
    pub via: String,
    /// Connection display name.
    pub name: String,
    /// Relationship label such as `many_to_one`.
    #[serde(rename = "type")]
    pub relationship: String,
}

/// Objects and their outbound connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionGraph {
    /// Object keys in document order.
    pub nodes: Vec<String>,
    /// One edge per declared outbound connection.
    pub edges: Vec<GraphEdge>,
}

/// Coupling metrics for every object plus the derived connection graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouplingAnalysis {
    metrics: Vec<CouplingMetrics>,
    connection_graph: ConnectionGraph,
}

impl CouplingAnalysis {
    /// Computes metrics and roles for every object in `graph`.
    #[must_use]
    pub fn compute(graph: &Graph, policy: &AnalysisPolicy) -> Self {
        let objects = graph.objects();
        let max_connections = objects
            .iter()
            .map(|o| graph.inbound(&o.key).len() + graph.outbound(&o.key).len())
            .max()
            .unwrap_or(0);
        let max_views = objects.iter().map(|o| graph.view_count(&o.key)).max().unwrap_or(0);
        let max_records = objects.iter().map(|o| graph.record_count(&o.key)).max().unwrap_or(0);

        let mut metrics: Vec<CouplingMetrics> = objects
            .iter()
            .map(|object| {
                let afferent = graph.inbound(&object.key).len();
                let efferent = graph.outbound(&object.key).len();
                let total = afferent + efferent;
                let view_count = graph.view_count(&object.key);
                let record_count = graph.record_count(&object.key);
                CouplingMetrics {
                    object_key: object.key.clone(),
                    object_name: object.name.clone(),
                    afferent,
                    efferent,
                    total,
                    view_count,
                    record_count,
                    field_count: object.fields.len(),
                    centrality: 0.7 * ratio(total as u64, max_connections as u64)
                        + 0.3 * ratio(view_count as u64, max_views as u64),
                    importance: 0.6 * ratio(record_count, max_records)
                        + 0.4 * ratio(total as u64, max_connections as u64),
                    is_user_profile: object.is_user_profile(),
                    is_temporal: object.is_temporal(),
                    role: DomainRole::Supporting,
                    hub: hub_role(afferent, efferent, policy),
                }
            })
            .collect();

        let core = core_selection(&metrics, policy);
        for m in &mut metrics {
            m.role = classify(m, core.contains(&m.object_key), policy);
        }

        let connection_graph = ConnectionGraph {
            nodes: objects.iter().map(|o| o.key.clone()).collect(),
            edges: objects
                .iter()
                .flat_map(|o| graph.outbound(&o.key))
                .map(|edge| GraphEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    via: edge.field_key.clone(),
                    name: edge.name.clone(),
                    relationship: format!("{}_to_{}", edge.has.as_str(), edge.belongs_to.as_str()),
                })
                .collect(),
        };

        tracing::debug!(
            objects = metrics.len(),
            core = core.len(),
            edges = connection_graph.edges.len(),
            "coupling analysis complete"
        );
        Self { metrics, connection_graph }
    }

    /// Metrics in document order.
    #[must_use]
    pub fn metrics(&self) -> &[CouplingMetrics] {
        &self.metrics
    }

    /// Metrics of one object.
    #[must_use]
    pub fn get(&self, object_key: &str) -> Option<&CouplingMetrics> {
        self.metrics.iter().find(|m| m.object_key == object_key)
    }

    /// Objects with the given role, in document order.
    pub fn with_role(&self, role: DomainRole) -> impl Iterator<Item = &CouplingMetrics> {
        self.metrics.iter().filter(move |m| m.role == role)
    }

    /// Hub objects, most connected first; ties keep document order.
    #[must_use]
    pub fn hubs(&self) -> Vec<&CouplingMetrics> {
        let mut hubs: Vec<&CouplingMetrics> =
            self.metrics.iter().filter(|m| m.hub.is_some()).collect();
        hubs.sort_by(|a, b| b.total.cmp(&a.total));
        hubs
    }

    /// The undirected-for-clustering connection graph.
    #[must_use]
    pub fn connection_graph(&self) -> &ConnectionGraph {
        &self.connection_graph
    }
}

/// `value / max` clipped to [0, 1]; zero when `max` is zero.
#[allow(clippy::cast_precision_loss)]
fn ratio(value: u64, max: u64) -> f64 {
    if max == 0 {
        0.0
    } else {
        (value as f64 / max as f64).clamp(0.0, 1.0)
    }
}

fn hub_role(afferent: usize, efferent: usize, policy: &AnalysisPolicy) -> Option<HubRole> {
    let total = afferent + efferent;
    if total < policy.hub_threshold {
        return None;
    }
    let factor = policy.hub_direction_factor;
    Some(if afferent > factor * efferent {
        HubRole::DependencyRoot
    } else if efferent > factor * afferent {
        HubRole::Aggregator
    } else if total >= policy.major_hub_min {
        HubRole::CentralComplex
    } else {
        HubRole::ModeratelyConnected
    })
}

/// Keys of the top objects by importance, excluding user profiles.
///
/// Ties at the boundary are broken by key so the selection is stable.
fn core_selection(metrics: &[CouplingMetrics], policy: &AnalysisPolicy) -> HashSet<String> {
    let mut candidates: Vec<&CouplingMetrics> =
        metrics.iter().filter(|m| !m.is_user_profile).collect();
    if candidates.is_empty() {
        return HashSet::new();
    }
    let size = core_size(candidates.len(), policy);
    candidates.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.object_key.cmp(&b.object_key))
    });
    candidates.into_iter().take(size).map(|m| m.object_key.clone()).collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn core_size(candidates: usize, policy: &AnalysisPolicy) -> usize {
    let raw = (candidates as f64 * policy.core_fraction).ceil() as usize;
    raw.clamp(1, policy.core_max.max(1))
}

#[allow(clippy::cast_precision_loss)]
fn classify(m: &CouplingMetrics, in_core: bool, policy: &AnalysisPolicy) -> DomainRole {
    if m.centrality > policy.transactional_centrality_cutoff && m.is_temporal {
        DomainRole::Transactional
    } else if m.field_count <= policy.reference_max_fields
        && m.afferent > 0
        && m.afferent as f64 >= policy.reference_inbound_ratio * m.efferent as f64
    {
        DomainRole::Reference
    } else if in_core {
        DomainRole::Core
    } else {
        DomainRole::Supporting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{linked, sample_app, scenario_ab};

    fn analysis(export: crate::model::AppExport) -> CouplingAnalysis {
        CouplingAnalysis::compute(&Graph::build(export).unwrap(), &AnalysisPolicy::default())
    }

    #[test]
    fn afferent_and_efferent_match_declarations() {
        let result = analysis(sample_app());
        let pairs: Vec<(usize, usize)> =
            result.metrics().iter().map(|m| (m.afferent, m.efferent)).collect();
        assert_eq!(pairs, vec![(2, 0), (1, 1), (1, 1), (0, 2), (0, 0)]);
    }

    #[test]
    fn scenario_coupling() {
        let result = analysis(scenario_ab());
        assert_eq!(result.get("object_a").unwrap().afferent, 1);
        assert_eq!(result.get("object_b").unwrap().efferent, 1);
    }

    #[test]
    fn centrality_combines_connections_and_views() {
        let result = analysis(sample_app());
        let centrality = |key: &str| result.get(key).unwrap().centrality;
        assert!((centrality("object_1") - 0.7).abs() < 1e-9);
        assert!((centrality("object_2") - 1.0).abs() < 1e-9);
        assert!((centrality("object_3") - 0.85).abs() < 1e-9);
        assert!(centrality("object_5").abs() < 1e-9);
    }

    #[test]
    fn importance_weights_records_and_connections() {
        let result = analysis(sample_app());
        assert!((result.get("object_4").unwrap().importance - 1.0).abs() < 1e-9);
        let expected = 0.6 * 120.0 / 900.0 + 0.4;
        assert!((result.get("object_3").unwrap().importance - expected).abs() < 1e-9);
    }

    #[test]
    fn roles_follow_first_matching_rule() {
        let result = analysis(sample_app());
        let role = |key: &str| result.get(key).unwrap().role;
        assert_eq!(role("object_1"), DomainRole::Reference);
        assert_eq!(role("object_2"), DomainRole::Supporting);
        assert_eq!(role("object_3"), DomainRole::Transactional);
        assert_eq!(role("object_4"), DomainRole::Core);
        assert_eq!(role("object_5"), DomainRole::Supporting);
    }

    #[test]
    fn empty_graph_scores_zero() {
        let result = analysis(linked(3, &[]));
        for m in result.metrics() {
            assert!(m.centrality.abs() < f64::EPSILON);
            assert!(m.importance.abs() < f64::EPSILON);
            assert!(m.hub.is_none());
        }
    }

    #[test]
    fn core_ties_break_by_key() {
        // Ten identical isolated objects: two core slots go to the lowest keys.
        let result = analysis(linked(10, &[]));
        let core: Vec<&str> =
            result.with_role(DomainRole::Core).map(|m| m.object_key.as_str()).collect();
        assert_eq!(core, vec!["object_0", "object_1"]);
    }

    #[test]
    fn hub_roles_reflect_direction() {
        // object_0 is pointed at by four objects; object_5 points at three.
        let result = analysis(linked(
            9,
            &[(1, 0), (2, 0), (3, 0), (4, 0), (5, 6), (5, 7), (5, 8)],
        ));
        assert_eq!(result.get("object_0").unwrap().hub, Some(HubRole::DependencyRoot));
        assert_eq!(result.get("object_5").unwrap().hub, Some(HubRole::Aggregator));
        assert!(result.get("object_1").unwrap().hub.is_none());
        let hubs: Vec<&str> = result.hubs().iter().map(|m| m.object_key.as_str()).collect();
        assert_eq!(hubs, vec!["object_0", "object_5"]);
    }

    #[test]
    fn direction_factor_and_central_size_come_from_policy() {
        // object_0: three inbound, one outbound.
        let export = linked(5, &[(1, 0), (2, 0), (3, 0), (0, 4)]);
        let graph = Graph::build(export).unwrap();

        let default = CouplingAnalysis::compute(&graph, &AnalysisPolicy::default());
        assert_eq!(default.get("object_0").unwrap().hub, Some(HubRole::DependencyRoot));

        let balanced = AnalysisPolicy { hub_direction_factor: 3, ..AnalysisPolicy::default() };
        let result = CouplingAnalysis::compute(&graph, &balanced);
        assert_eq!(result.get("object_0").unwrap().hub, Some(HubRole::ModeratelyConnected));

        let central =
            AnalysisPolicy { hub_direction_factor: 3, major_hub_min: 4, ..AnalysisPolicy::default() };
        let result = CouplingAnalysis::compute(&graph, &central);
        assert_eq!(result.get("object_0").unwrap().hub, Some(HubRole::CentralComplex));
    }

    #[test]
    fn connection_graph_has_one_edge_per_outbound_connection() {
        let result = analysis(sample_app());
        let graph = result.connection_graph();
        assert_eq!(graph.nodes.len(), 5);
        assert_eq!(graph.edges.len(), 4);
        assert_eq!(graph.edges[0].from, "object_2");
        assert_eq!(graph.edges[0].to, "object_1");
        assert_eq!(graph.edges[0].relationship, "many_to_one");
    }
}
