//! Application-wide architecture summary.
//!
//! Runs coupling, clustering and usage search over every object and folds
//! the results into one report.

mod patterns;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::cluster::{detect_clusters, Cluster};
use crate::config::AnalysisPolicy;
use crate::coupling::{ConnectionGraph, CouplingAnalysis, CouplingMetrics, DomainRole, HubRole};
use crate::error::Result;
use crate::graph::Graph;

pub use patterns::{
    AccessPatterns, CalculationComplexity, DataPatterns, Lifecycle, NavigationDepth,
    TechnicalDebt, TemporalObject, UiArchitecture,
};

/// Size figures of the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityMetrics {
    /// Number of objects.
    pub total_objects: usize,
    /// Number of fields.
    pub total_fields: usize,
    /// Number of scenes.
    pub total_scenes: usize,
    /// Number of views.
    pub total_views: usize,
    /// Number of records.
    pub total_records: u64,
    /// Declared connections over possible directed object pairs.
    pub connection_density: f64,
}

/// Identity and size of the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationOverview {
    /// Display name.
    pub name: String,
    /// Application id.
    pub id: String,
    /// Size figures.
    pub complexity_metrics: ComplexityMetrics,
}

/// Condensed view of one object's metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    /// Object key.
    pub object_key: String,
    /// Display name.
    pub object_name: String,
    /// Record count.
    pub record_count: u64,
    /// Field count.
    pub field_count: usize,
    /// Inbound connections.
    pub afferent: usize,
    /// Outbound connections.
    pub efferent: usize,
    /// Centrality, rounded to three places.
    pub centrality: f64,
    /// Importance, rounded to three places.
    pub importance: f64,
}

impl From<&CouplingMetrics> for EntitySummary {
    fn from(m: &CouplingMetrics) -> Self {
        Self {
            object_key: m.object_key.clone(),
            object_name: m.object_name.clone(),
            record_count: m.record_count,
            field_count: m.field_count,
            afferent: m.afferent,
            efferent: m.efferent,
            centrality: round3(m.centrality),
            importance: round3(m.importance),
        }
    }
}

/// A reference-data object and the objects that point at it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceEntity {
    /// The object.
    #[serde(flatten)]
    pub entity: EntitySummary,
    /// Names of objects connecting to it.
    pub used_by: Vec<String>,
}

/// Objects grouped by domain role.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainModel {
    /// User-role profile objects.
    pub user_profiles: Vec<EntitySummary>,
    /// Core objects, most important first.
    pub core_entities: Vec<EntitySummary>,
    /// Transactional objects.
    pub transactional_entities: Vec<EntitySummary>,
    /// Reference-data objects.
    pub reference_data: Vec<ReferenceEntity>,
    /// Everything else.
    pub supporting_entities: Vec<EntitySummary>,
}

/// A hub object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubSummary {
    /// Object key.
    pub object_key: String,
    /// Display name.
    pub object_name: String,
    /// Total connections.
    pub total_connections: usize,
    /// Inbound connections.
    pub inbound: usize,
    /// Outbound connections.
    pub outbound: usize,
    /// Hub interpretation.
    pub role: HubRole,
    /// Human-readable interpretation.
    pub interpretation: String,
}

/// Connections, hubs and clusters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipMap {
    /// Objects and outbound connections.
    pub connection_graph: ConnectionGraph,
    /// Hubs, most connected first.
    pub hub_objects: Vec<HubSummary>,
    /// Every cluster, including singletons.
    pub dependency_clusters: Vec<Cluster>,
    /// False when clustering hit its iteration cap.
    pub clusters_converged: bool,
}

/// Overall architectural shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitecturalStyle {
    /// A few heavily connected hubs with weak clustering.
    HubAndSpoke,
    /// Most objects sit in cohesive clusters.
    Modular,
    /// Neither pattern dominates.
    Mixed,
}

impl ArchitecturalStyle {
    /// Snake-case label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HubAndSpoke => "hub_and_spoke",
            Self::Modular => "modular",
            Self::Mixed => "mixed",
        }
    }
}

/// Two objects sharing many outbound targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouplingPair {
    /// First object key.
    pub object_a: String,
    /// Second object key.
    pub object_b: String,
    /// Number of distinct shared outbound targets.
    pub shared_targets: usize,
}

/// How easily the schema can grow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extensibility {
    /// Share of objects in multi-member clusters.
    pub modularity_score: f64,
    /// Object pairs sharing at least three outbound targets, top five.
    pub tight_coupling_pairs: Vec<CouplingPair>,
    /// Overall shape.
    pub architectural_style: ArchitecturalStyle,
    /// Human-readable interpretation.
    pub interpretation: String,
}

/// The complete application summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSummary {
    /// Identity and size.
    pub application: ApplicationOverview,
    /// Objects by role.
    pub domain_model: DomainModel,
    /// Connections, hubs and clusters.
    pub relationship_map: RelationshipMap,
    /// Lifecycle and formula patterns.
    pub data_patterns: DataPatterns,
    /// Scene and view structure.
    pub ui_architecture: UiArchitecture,
    /// User objects and role restrictions.
    pub access_patterns: AccessPatterns,
    /// Unused and overloaded parts of the schema.
    pub technical_debt_indicators: TechnicalDebt,
    /// Modularity and coupling.
    pub extensibility_assessment: Extensibility,
}

/// Builds the application summary.
///
/// # Errors
///
/// Returns [`SleuthError::Internal`](crate::error::SleuthError::Internal) if
/// the graph's indices are inconsistent.
pub fn summarize(graph: &Graph, policy: &AnalysisPolicy) -> Result<AppSummary> {
    let coupling = CouplingAnalysis::compute(graph, policy);
    let names: HashMap<String, String> =
        graph.objects().iter().map(|o| (o.key.clone(), o.name.clone())).collect();
    let clusters = detect_clusters(coupling.connection_graph(), &names, policy);

    let object_count = graph.objects().len();
    let connection_sum: usize = coupling.metrics().iter().map(|m| m.total).sum();
    let application = ApplicationOverview {
        name: graph.application().name.clone(),
        id: graph.application().id.clone(),
        complexity_metrics: ComplexityMetrics {
            total_objects: object_count,
            total_fields: graph.field_total(),
            total_scenes: graph.scenes().len(),
            total_views: graph.view_total(),
            total_records: graph.application().total_records(),
            connection_density: round3(density(connection_sum, object_count)),
        },
    };

    let hub_objects = coupling
        .hubs()
        .into_iter()
        .filter_map(|m| {
            let role = m.hub?;
            Some(HubSummary {
                object_key: m.object_key.clone(),
                object_name: m.object_name.clone(),
                total_connections: m.total,
                inbound: m.afferent,
                outbound: m.efferent,
                role,
                interpretation: role.interpretation().to_string(),
            })
        })
        .collect::<Vec<_>>();

    let modularity_score = if object_count == 0 {
        0.0
    } else {
        let clustered: usize = clusters.multi_member().map(|c| c.objects.len()).sum();
        round3(ratio(clustered, object_count))
    };
    let has_major_hub = coupling.metrics().iter().any(|m| m.total >= policy.major_hub_min);
    let architectural_style =
        if has_major_hub && modularity_score < policy.hub_and_spoke_modularity_max {
            ArchitecturalStyle::HubAndSpoke
        } else if modularity_score > policy.modular_modularity_min {
            ArchitecturalStyle::Modular
        } else {
            ArchitecturalStyle::Mixed
        };
    let extensibility_assessment = Extensibility {
        modularity_score,
        tight_coupling_pairs: tight_coupling_pairs(graph, policy.tight_coupling_min_shared),
        architectural_style,
        interpretation: match architectural_style {
            ArchitecturalStyle::HubAndSpoke => {
                "Hub-and-spoke: changes to hub objects ripple widely; extend at the spokes".into()
            }
            ArchitecturalStyle::Modular => {
                "Modular: cohesive clusters can evolve independently".into()
            }
            ArchitecturalStyle::Mixed => {
                "Mixed: some clustering, review cross-cluster connections before extending".into()
            }
        },
    };

    let summary = AppSummary {
        application,
        domain_model: domain_model(graph, &coupling),
        relationship_map: RelationshipMap {
            connection_graph: coupling.connection_graph().clone(),
            hub_objects,
            dependency_clusters: clusters.clusters,
            clusters_converged: clusters.converged,
        },
        data_patterns: patterns::data_patterns(graph),
        ui_architecture: patterns::ui_architecture(graph),
        access_patterns: patterns::access_patterns(graph),
        technical_debt_indicators: patterns::technical_debt(graph, &coupling)?,
        extensibility_assessment,
    };
    tracing::info!(objects = object_count, "application summary built");
    Ok(summary)
}

fn domain_model(graph: &Graph, coupling: &CouplingAnalysis) -> DomainModel {
    let mut model = DomainModel::default();
    for m in coupling.metrics() {
        if m.is_user_profile {
            model.user_profiles.push(m.into());
            continue;
        }
        match m.role {
            DomainRole::Core => model.core_entities.push(m.into()),
            DomainRole::Transactional => model.transactional_entities.push(m.into()),
            DomainRole::Reference => {
                let mut used_by: Vec<String> = Vec::new();
                for edge in graph.inbound(&m.object_key) {
                    if let Some(source) = graph.object(&edge.source) {
                        if !used_by.contains(&source.name) {
                            used_by.push(source.name.clone());
                        }
                    }
                }
                model.reference_data.push(ReferenceEntity { entity: m.into(), used_by });
            }
            DomainRole::Supporting => model.supporting_entities.push(m.into()),
        }
    }
    model.core_entities.sort_by(|a, b| {
        b.importance.total_cmp(&a.importance).then_with(|| a.object_key.cmp(&b.object_key))
    });
    model
}

fn tight_coupling_pairs(graph: &Graph, min_shared: usize) -> Vec<CouplingPair> {
    let targets: Vec<(&str, Vec<&str>)> = graph
        .objects()
        .iter()
        .map(|o| {
            let mut t: Vec<&str> =
                graph.outbound(&o.key).iter().map(|e| e.target.as_str()).collect();
            t.sort_unstable();
            t.dedup();
            (o.key.as_str(), t)
        })
        .collect();

    let mut pairs = Vec::new();
    for (i, (a, ta)) in targets.iter().enumerate() {
        for (b, tb) in &targets[i + 1..] {
            let shared = ta.iter().filter(|t| tb.contains(t)).count();
            if shared >= min_shared {
                pairs.push(CouplingPair {
                    object_a: (*a).to_string(),
                    object_b: (*b).to_string(),
                    shared_targets: shared,
                });
            }
        }
    }
    pairs.sort_by(|x, y| y.shared_targets.cmp(&x.shared_targets));
    pairs.truncate(5);
    pairs
}

#[allow(clippy::cast_precision_loss)]
fn density(connection_sum: usize, objects: usize) -> f64 {
    if objects < 2 {
        0.0
    } else {
        connection_sum as f64 / (objects * (objects - 1)) as f64
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Occurrence counts keyed by label, in label order.
fn tally<'a>(labels: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}
