//! Change-impact analysis with risk scoring.
//!
//! Direct impacts are the references to the target itself. For an object
//! target the analysis cascades into its fields: every referenced field is
//! a cascade impact, and the objects and scenes behind those references
//! are reported as affected.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::AnalysisPolicy;
use crate::coupling::{CouplingAnalysis, DomainRole};
use crate::error::Result;
use crate::graph::{Graph, Resolved};
use crate::search::{LocationType, Usage, UsageCategory, UsageDetails, UsageSearch};

/// Whether the analyzed identifier named an object or a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// An object.
    Object,
    /// A field.
    Field,
}

impl TargetKind {
    /// Lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Field => "field",
        }
    }
}

/// The analyzed object or field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactTarget {
    /// Object or field.
    pub kind: TargetKind,
    /// Key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Owning object, for field targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    /// Field type tag, for field targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    /// Domain role of the object (or the field's owner).
    pub role: DomainRole,
    /// Short description for reports.
    pub description: String,
}

/// A connection affected by the change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionImpact {
    /// Location type of the reference.
    pub location_type: LocationType,
    /// Object on the other end.
    pub object_key: String,
    /// Display name of that object.
    pub object_name: String,
    /// Connection field key.
    pub connection_field: String,
    /// Connection display name.
    pub connection_name: String,
    /// Relationship label.
    pub relationship: String,
    /// Human-readable description.
    pub description: String,
}

/// A view or form affected by the change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewImpact {
    /// Location type of the reference.
    pub location_type: LocationType,
    /// View key.
    pub view_key: String,
    /// View display name.
    pub view_name: String,
    /// View type tag.
    pub view_type: String,
    /// Containing scene.
    pub scene_key: String,
    /// Scene display name.
    pub scene_name: String,
    /// Human-readable description.
    pub description: String,
}

/// A scene touched by a direct impact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneImpact {
    /// Scene key.
    pub scene_key: String,
    /// Scene display name.
    pub scene_name: String,
    /// Scene slug.
    pub scene_slug: String,
}

/// A formula affected by the change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaImpact {
    /// Formula field key.
    pub field_key: String,
    /// Formula field name.
    pub field_name: String,
    /// Object owning the formula field.
    pub object_key: String,
    /// Raw formula text.
    pub equation: String,
}

/// An object sort or identifier setting affected by the change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingImpact {
    /// Sort or identifier.
    pub location_type: LocationType,
    /// Object carrying the setting.
    pub object_key: String,
    /// Display name of the object.
    pub object_name: String,
}

/// References to the target itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectImpacts {
    /// Connection references.
    pub connections: Vec<ConnectionImpact>,
    /// Display view references.
    pub views: Vec<ViewImpact>,
    /// Distinct scenes of the view and form references, first seen first.
    pub scenes: Vec<SceneImpact>,
    /// Form input references.
    pub forms: Vec<ViewImpact>,
    /// Formula references.
    pub formulas: Vec<FormulaImpact>,
    /// Object sort and identifier settings.
    pub object_settings: Vec<SettingImpact>,
}

impl DirectImpacts {
    /// Number of direct impacts; scenes are derived and not counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.connections.len()
            + self.views.len()
            + self.forms.len()
            + self.formulas.len()
            + self.object_settings.len()
    }
}

/// A field of the target object that is referenced elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffectedField {
    /// Field key.
    pub field_key: String,
    /// Field display name.
    pub field_name: String,
    /// Field type tag.
    pub field_type: String,
    /// Number of references.
    pub usage_count: usize,
    /// The references.
    pub usages: Vec<Usage>,
}

/// Knock-on effects through the target's fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CascadeImpacts {
    /// Referenced fields of the target object.
    pub affected_fields: Vec<AffectedField>,
    /// Other objects referencing those fields.
    pub affected_objects: Vec<String>,
    /// Scenes across all direct and cascade references.
    pub affected_scenes: Vec<String>,
}

/// Breaking-change likelihood bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Likelihood {
    /// Score 0.
    None,
    /// Low score.
    Low,
    /// Medium score.
    Medium,
    /// High score.
    High,
}

impl Likelihood {
    /// Buckets an impact score.
    #[must_use]
    pub fn from_score(score: usize, policy: &AnalysisPolicy) -> Self {
        if score == 0 {
            Self::None
        } else if score <= policy.risk_low_max {
            Self::Low
        } else if score <= policy.risk_medium_max {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// User-facing workflows touched by the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Workflow {
    /// Form inputs.
    #[serde(rename = "data entry forms")]
    DataEntryForms,
    /// Display views.
    #[serde(rename = "data display views")]
    DataDisplayViews,
    /// Connections.
    #[serde(rename = "related data relationships")]
    RelatedDataRelationships,
    /// Formulas.
    #[serde(rename = "calculated fields and formulas")]
    CalculatedFieldsAndFormulas,
}

impl Workflow {
    /// Label as serialized.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DataEntryForms => "data entry forms",
            Self::DataDisplayViews => "data display views",
            Self::RelatedDataRelationships => "related data relationships",
            Self::CalculatedFieldsAndFormulas => "calculated fields and formulas",
        }
    }
}

/// Risk figures for the change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    /// Likelihood bucket.
    pub breaking_change_likelihood: Likelihood,
    /// Direct plus cascade impacts.
    pub impact_score: usize,
    /// Affected workflows, in fixed order.
    pub affected_user_workflows: Vec<Workflow>,
}

/// Totals used for the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactMetadata {
    /// Direct impacts.
    pub total_direct_impacts: usize,
    /// Cascade impacts (referenced fields).
    pub total_cascade_impacts: usize,
}

/// Complete change-impact report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactReport {
    /// The analyzed object or field.
    pub target: ImpactTarget,
    /// References to the target itself.
    pub direct_impacts: DirectImpacts,
    /// Knock-on effects.
    pub cascade_impacts: CascadeImpacts,
    /// Score and likelihood.
    pub risk_assessment: RiskAssessment,
    /// Totals.
    pub metadata: ImpactMetadata,
}

/// Analyzes the impact of changing the object or field named by `query`.
///
/// `query` is resolved with [`Graph::resolve`].
///
/// # Errors
///
/// Returns [`SleuthError::NotFound`](crate::error::SleuthError::NotFound) or
/// [`SleuthError::AmbiguousLookup`](crate::error::SleuthError::AmbiguousLookup)
/// when the identifier does not resolve to exactly one object or field.
pub fn analyze(
    graph: &Graph,
    coupling: &CouplingAnalysis,
    policy: &AnalysisPolicy,
    query: &str,
) -> Result<ImpactReport> {
    let search = UsageSearch::new(graph);
    let role_of = |key: &str| coupling.get(key).map_or(DomainRole::Supporting, |m| m.role);

    let (target, direct_usages, affected_fields) = match graph.resolve(query)? {
        Resolved::Object(object) => {
            let usages = search.search_entity(&object.key)?;
            let target = ImpactTarget {
                kind: TargetKind::Object,
                key: object.key.clone(),
                name: object.name.clone(),
                object_key: None,
                field_type: None,
                role: role_of(&object.key),
                description: format!("Object: {}", object.name),
            };
            let affected: Vec<AffectedField> = usages
                .field_usages
                .into_iter()
                .map(|bucket| AffectedField {
                    usage_count: bucket.usages.len(),
                    field_key: bucket.field_key,
                    field_name: bucket.field_name,
                    field_type: bucket.field_type,
                    usages: bucket.usages,
                })
                .collect();
            (target, usages.object_usages, affected)
        }
        Resolved::Field(found) => {
            let usages = search.search_field(&found.field.key)?;
            let target = ImpactTarget {
                kind: TargetKind::Field,
                key: found.field.key.clone(),
                name: found.field.name.clone(),
                object_key: Some(found.object.key.clone()),
                field_type: Some(found.field.field_type.clone()),
                role: role_of(&found.object.key),
                description: format!(
                    "Field: {} ({}) on {}",
                    found.field.name, found.field.field_type, found.object.name
                ),
            };
            (target, usages, Vec::new())
        }
    };

    let direct_impacts = partition(&direct_usages);
    let cascade_usages: Vec<&Usage> =
        affected_fields.iter().flat_map(|f| f.usages.iter()).collect();

    let mut affected_objects: Vec<String> = Vec::new();
    for usage in &cascade_usages {
        if let Some(key) = usage.referencing_object() {
            if key != target.key && !affected_objects.iter().any(|k| k == key) {
                affected_objects.push(key.to_string());
            }
        }
    }
    let mut affected_scenes: Vec<String> = Vec::new();
    for usage in direct_usages.iter().chain(cascade_usages.iter().copied()) {
        if let Some(scene) = usage.scene_key() {
            if !affected_scenes.iter().any(|s| s == scene) {
                affected_scenes.push(scene.to_string());
            }
        }
    }

    let total_direct_impacts = direct_impacts.total();
    let total_cascade_impacts = affected_fields.len();
    let impact_score = total_direct_impacts + total_cascade_impacts;
    let affected_user_workflows =
        workflows(direct_usages.iter().chain(cascade_usages.iter().copied()));

    tracing::info!(key = %target.key, impact_score, "impact analysis complete");

    Ok(ImpactReport {
        target,
        direct_impacts,
        cascade_impacts: CascadeImpacts { affected_fields, affected_objects, affected_scenes },
        risk_assessment: RiskAssessment {
            breaking_change_likelihood: Likelihood::from_score(impact_score, policy),
            impact_score,
            affected_user_workflows,
        },
        metadata: ImpactMetadata { total_direct_impacts, total_cascade_impacts },
    })
}

fn partition(usages: &[Usage]) -> DirectImpacts {
    let mut impacts = DirectImpacts::default();
    for usage in usages {
        match &usage.details {
            UsageDetails::Connection(d) => {
                let other_is_target = matches!(
                    usage.location_type,
                    LocationType::ConnectionInbound | LocationType::ConnectionField
                );
                let (object_key, object_name) = if other_is_target {
                    (&d.target_object, &d.target_object_name)
                } else {
                    (&d.source_object, &d.source_object_name)
                };
                impacts.connections.push(ConnectionImpact {
                    location_type: usage.location_type,
                    object_key: object_key.clone(),
                    object_name: object_name.clone(),
                    connection_field: d.connection_field.clone(),
                    connection_name: d.connection_name.clone(),
                    relationship: d.relationship.clone(),
                    description: usage.context.clone(),
                });
            }
            UsageDetails::ObjectSetting(d) => impacts.object_settings.push(SettingImpact {
                location_type: usage.location_type,
                object_key: d.object_key.clone(),
                object_name: d.object_name.clone(),
            }),
            UsageDetails::Formula(d) => impacts.formulas.push(FormulaImpact {
                field_key: d.field_key.clone(),
                field_name: d.field_name.clone(),
                object_key: d.object_key.clone(),
                equation: d.equation.clone(),
            }),
            UsageDetails::View(d) => {
                let impact = ViewImpact {
                    location_type: usage.location_type,
                    view_key: d.view_key.clone(),
                    view_name: d.view_name.clone(),
                    view_type: d.view_type.clone(),
                    scene_key: d.scene_key.clone(),
                    scene_name: d.scene_name.clone(),
                    description: usage.context.clone(),
                };
                if usage.location_type.category() == UsageCategory::Form {
                    impacts.forms.push(impact);
                } else {
                    impacts.views.push(impact);
                }
                if !impacts.scenes.iter().any(|s| s.scene_key == d.scene_key) {
                    impacts.scenes.push(SceneImpact {
                        scene_key: d.scene_key.clone(),
                        scene_name: d.scene_name.clone(),
                        scene_slug: d.scene_slug.clone(),
                    });
                }
            }
        }
    }
    impacts
}

fn workflows<'a>(usages: impl Iterator<Item = &'a Usage>) -> Vec<Workflow> {
    let found: BTreeSet<Workflow> = usages
        .filter_map(|usage| match usage.location_type.category() {
            UsageCategory::Form => Some(Workflow::DataEntryForms),
            UsageCategory::View => Some(Workflow::DataDisplayViews),
            UsageCategory::Connection => Some(Workflow::RelatedDataRelationships),
            UsageCategory::Formula => Some(Workflow::CalculatedFieldsAndFormulas),
            UsageCategory::ObjectSetting => None,
        })
        .collect();
    found.into_iter().collect()
}
