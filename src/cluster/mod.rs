//! Dependency clusters: groups of objects more densely connected inside
//! than out.
//!
//! The connection graph is treated as undirected. Every object starts in
//! its own group; the pair of groups with the highest share of connections
//! between them (over all connections touching either group) is merged
//! while that share exceeds the cohesion floor.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::AnalysisPolicy;
use crate::coupling::ConnectionGraph;

/// Cohesion bucket of a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CohesionLevel {
    /// Above the high-cohesion threshold.
    High,
    /// Between the floor and the high threshold.
    Medium,
    /// Below the floor.
    Low,
}

/// A group of objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Member object keys, in document order.
    pub objects: Vec<String>,
    /// Member display names, aligned with `objects`.
    pub object_names: Vec<String>,
    /// Connections with both ends in the cluster.
    pub internal_connections: usize,
    /// Connections with exactly one end in the cluster.
    pub external_connections: usize,
    /// Internal connections over all connections touching the cluster.
    pub cohesion: f64,
    /// Bucketed cohesion.
    pub cohesion_level: CohesionLevel,
}

/// Result of cluster detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterReport {
    /// Clusters ordered by their first member's document position.
    pub clusters: Vec<Cluster>,
    /// Number of merges performed.
    pub merges: usize,
    /// False when the iteration cap stopped the merge loop early.
    pub converged: bool,
}

impl ClusterReport {
    /// Clusters with more than one member.
    pub fn multi_member(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(|c| c.objects.len() > 1)
    }

    /// The cluster containing `object_key`.
    #[must_use]
    pub fn cluster_of(&self, object_key: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.objects.iter().any(|k| k == object_key))
    }
}

#[derive(Debug, Clone)]
struct Group {
    members: Vec<usize>,
    intra: usize,
    touching: usize,
}

/// Partitions the nodes of `graph` into clusters.
///
/// `names` maps object keys to display names; missing names fall back to
/// the key.
///
/// Merging stops after `policy.max_cluster_iterations` merges. A capped run
/// still returns a complete partition in which every node lands in exactly
/// one cluster; only [`ClusterReport::converged`] records the early stop.
#[must_use]
pub fn detect_clusters(
    graph: &ConnectionGraph,
    names: &HashMap<String, String>,
    policy: &AnalysisPolicy,
) -> ClusterReport {
    let position: HashMap<&str, usize> =
        graph.nodes.iter().enumerate().map(|(i, key)| (key.as_str(), i)).collect();

    let mut groups: Vec<Option<Group>> = (0..graph.nodes.len())
        .map(|i| Some(Group { members: vec![i], intra: 0, touching: 0 }))
        .collect();
    let mut between: BTreeMap<(usize, usize), usize> = BTreeMap::new();

    for edge in &graph.edges {
        let (Some(&a), Some(&b)) = (position.get(edge.from.as_str()), position.get(edge.to.as_str()))
        else {
            continue;
        };
        if a == b {
            if let Some(group) = groups[a].as_mut() {
                group.intra += 1;
                group.touching += 1;
            }
        } else {
            for end in [a, b] {
                if let Some(group) = groups[end].as_mut() {
                    group.touching += 1;
                }
            }
            *between.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
    }

    let mut merges = 0;
    let mut converged = true;
    loop {
        let Some(((x, y), shared)) = best_pair(&groups, &between, policy.cohesion_floor) else {
            break;
        };
        if merges >= policy.max_cluster_iterations {
            converged = false;
            tracing::warn!(
                limit = policy.max_cluster_iterations,
                "cluster merge limit reached before convergence"
            );
            break;
        }

        let Some(absorbed) = groups[y].take() else { break };
        if let Some(group) = groups[x].as_mut() {
            group.members.extend(absorbed.members);
            group.members.sort_unstable();
            group.intra += absorbed.intra + shared;
            group.touching = group.touching + absorbed.touching - shared;
        }

        between.remove(&(x, y));
        let moved: Vec<((usize, usize), usize)> = between
            .iter()
            .filter(|((a, b), _)| *a == y || *b == y)
            .map(|(pair, count)| (*pair, *count))
            .collect();
        for (pair, count) in moved {
            between.remove(&pair);
            let other = if pair.0 == y { pair.1 } else { pair.0 };
            *between.entry((x.min(other), x.max(other))).or_insert(0) += count;
        }
        merges += 1;
    }

    let clusters = groups
        .into_iter()
        .flatten()
        .map(|group| {
            let objects: Vec<String> =
                group.members.iter().map(|&i| graph.nodes[i].clone()).collect();
            let object_names = objects
                .iter()
                .map(|key| names.get(key).cloned().unwrap_or_else(|| key.clone()))
                .collect();
            let cohesion = share(group.intra, group.touching);
            Cluster {
                objects,
                object_names,
                internal_connections: group.intra,
                external_connections: group.touching - group.intra,
                cohesion,
                cohesion_level: level(cohesion, policy),
            }
        })
        .collect();

    tracing::debug!(merges, converged, "cluster detection complete");
    ClusterReport { clusters, merges, converged }
}

/// The mergeable pair with the highest ratio above `floor`.
///
/// Pairs are scanned in index order and only a strictly better ratio
/// replaces the current best, so ties go to the earliest pair.
fn best_pair(
    groups: &[Option<Group>],
    between: &BTreeMap<(usize, usize), usize>,
    floor: f64,
) -> Option<((usize, usize), usize)> {
    let mut best: Option<((usize, usize), usize, f64)> = None;
    for (&(x, y), &shared) in between {
        let (Some(gx), Some(gy)) = (groups[x].as_ref(), groups[y].as_ref()) else { continue };
        let ratio = share(shared, gx.touching + gy.touching - shared);
        if ratio > floor && best.is_none_or(|(_, _, top)| ratio > top) {
            best = Some(((x, y), shared, ratio));
        }
    }
    best.map(|(pair, shared, _)| (pair, shared))
}

#[allow(clippy::cast_precision_loss)]
fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn level(cohesion: f64, policy: &AnalysisPolicy) -> CohesionLevel {
    if cohesion > policy.cohesion_high {
        CohesionLevel::High
    } else if cohesion >= policy.cohesion_floor {
        CohesionLevel::Medium
    } else {
        CohesionLevel::Low
    }
}
