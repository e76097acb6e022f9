//! Markdown documents for impact reports and application summaries.

use crate::graph::Graph;
use crate::impact::ImpactReport;
use crate::summary::AppSummary;

use super::{thousands, BuilderLinks};

fn section<T>(
    lines: &mut Vec<String>,
    title: &str,
    items: &[T],
    empty: &str,
    line: impl Fn(&T) -> String,
) {
    lines.push(String::new());
    lines.push(format!("### {title} ({})", items.len()));
    if items.is_empty() {
        lines.push(format!("*{empty}*"));
    }
    lines.extend(items.iter().map(line));
}

/// Renders an impact report.
///
/// Scene names are looked up in `graph`; scenes no longer present fall back
/// to their key.
#[must_use]
pub fn impact(report: &ImpactReport, graph: &Graph, links: &BuilderLinks) -> String {
    let target = &report.target;
    let risk = &report.risk_assessment;
    let direct = &report.direct_impacts;
    let cascade = &report.cascade_impacts;
    let workflows: Vec<&str> = risk.affected_user_workflows.iter().map(|w| w.as_str()).collect();

    let mut lines = vec![
        format!("# Impact Analysis: {}", target.name),
        String::new(),
        format!("**Type:** {}  ", target.kind.as_str()),
        format!("**Key:** `{}`  ", target.key),
        format!("**Role:** {}  ", target.role.as_str()),
        format!("**Description:** {}  ", target.description),
        String::new(),
        "## Risk Assessment".into(),
        String::new(),
        format!("- **Breaking Change Likelihood:** {}", risk.breaking_change_likelihood.as_str()),
        format!("- **Impact Score:** {}", risk.impact_score),
        format!(
            "- **Affected Workflows:** {}",
            if workflows.is_empty() { "None".to_string() } else { workflows.join(", ") }
        ),
        String::new(),
        "## Direct Impacts".into(),
    ];

    section(&mut lines, "Connections", &direct.connections, "No connection impacts", |c| {
        format!("- {}", c.description)
    });
    section(&mut lines, "Views", &direct.views, "No view impacts", |v| {
        format!("- **{}** (`{}`) - {} in scene {}", v.view_name, v.view_key, v.view_type, v.scene_name)
    });
    section(&mut lines, "Forms", &direct.forms, "No form impacts", |f| {
        format!("- **{}** (`{}`) in scene {}", f.view_name, f.view_key, f.scene_name)
    });
    section(&mut lines, "Formulas", &direct.formulas, "No formula impacts", |f| {
        format!("- **{}** (`{}`): `{}`", f.field_name, f.field_key, f.equation)
    });
    section(&mut lines, "Object Settings", &direct.object_settings, "No object setting impacts", |s| {
        format!("- {} on **{}** (`{}`)", s.location_type, s.object_name, s.object_key)
    });

    lines.push(String::new());
    lines.push("## Cascade Impacts".into());
    section(&mut lines, "Affected Fields", &cascade.affected_fields, "No field cascade impacts", |f| {
        format!("- **{}** (`{}`) - {} - {} usages", f.field_name, f.field_key, f.field_type, f.usage_count)
    });
    section(&mut lines, "Affected Objects", &cascade.affected_objects, "No other objects affected", |key| {
        let name = graph.object(key).map_or(key.as_str(), |o| o.name.as_str());
        format!("- **{name}** (`{key}`)")
    });
    section(&mut lines, "Affected Scenes", &cascade.affected_scenes, "No scenes affected", |key| {
        match graph.scene(key) {
            Some(scene) => format!("- **{}** (`{key}`) - /{}", scene.name, scene.slug),
            None => format!("- `{key}`"),
        }
    });

    lines.extend([
        String::new(),
        "## Summary".into(),
        String::new(),
        format!("- **Total Direct Impacts:** {}", report.metadata.total_direct_impacts),
        format!("- **Total Cascade Impacts:** {}", report.metadata.total_cascade_impacts),
    ]);

    if !cascade.affected_scenes.is_empty() {
        let mut keys: Vec<&str> = cascade.affected_scenes.iter().map(String::as_str).collect();
        keys.sort_unstable();
        lines.extend([
            String::new(),
            "## Builder Pages to Review".into(),
            String::new(),
            format!("**{} scenes affected**", keys.len()),
            String::new(),
        ]);
        for key in keys {
            let name = graph.scene(key).map_or(key, |s| s.name.as_str());
            lines.push(format!("- [{name}]({})", links.page_url(key)));
        }
    }
    lines.join("\n")
}

/// Renders an application summary.
#[must_use]
pub fn summary(summary: &AppSummary) -> String {
    let app = &summary.application;
    let metrics = &app.complexity_metrics;
    let domain = &summary.domain_model;
    let relationships = &summary.relationship_map;
    let calc = &summary.data_patterns.calculation_complexity;
    let ui = &summary.ui_architecture;
    let access = &summary.access_patterns;
    let debt = &summary.technical_debt_indicators;
    let ext = &summary.extensibility_assessment;

    let mut lines = vec![
        format!("# Application Architecture Summary: {}", app.name),
        String::new(),
        format!("**Application ID:** `{}`", app.id),
        String::new(),
        "## Complexity Metrics".into(),
        String::new(),
        format!("- **Objects:** {}", metrics.total_objects),
        format!("- **Fields:** {}", metrics.total_fields),
        format!("- **Scenes:** {}", metrics.total_scenes),
        format!("- **Views:** {}", metrics.total_views),
        format!("- **Records:** {}", thousands(metrics.total_records)),
        format!("- **Connection Density:** {}", metrics.connection_density),
        String::new(),
        "## Domain Model".into(),
    ];

    section(&mut lines, "User Profiles", &domain.user_profiles, "None", |e| {
        format!("- **{}** (`{}`) - {} records", e.object_name, e.object_key, thousands(e.record_count))
    });
    section(&mut lines, "Core Entities", &domain.core_entities, "None", |e| {
        format!(
            "- **{}** (`{}`) - Importance: {:.2}, Centrality: {}, Records: {}",
            e.object_name,
            e.object_key,
            e.importance,
            e.centrality,
            thousands(e.record_count)
        )
    });
    section(&mut lines, "Transactional Entities", &domain.transactional_entities, "None", |e| {
        format!("- **{}** - {} records", e.object_name, thousands(e.record_count))
    });
    section(&mut lines, "Reference Data", &domain.reference_data, "None", |r| {
        format!("- **{}** - Used by {} objects", r.entity.object_name, r.used_by.len())
    });
    section(&mut lines, "Supporting Entities", &domain.supporting_entities, "None", |e| {
        format!("- **{}** (`{}`)", e.object_name, e.object_key)
    });

    lines.extend([
        String::new(),
        "## Relationship Topology".into(),
        String::new(),
        format!("**Total Connections:** {}", relationships.connection_graph.edges.len()),
    ]);
    section(&mut lines, "Hub Objects", &relationships.hub_objects, "None", |h| {
        format!(
            "- **{}** - {} connections ({} in, {} out)\n  - _{}_",
            h.object_name, h.total_connections, h.inbound, h.outbound, h.interpretation
        )
    });
    let multi: Vec<_> = relationships.dependency_clusters.iter().filter(|c| c.objects.len() > 1).collect();
    section(&mut lines, "Dependency Clusters", &multi, "No multi-object clusters", |c| {
        format!("- {} ({} cohesion)", c.object_names.join(", "), c.cohesion)
    });
    if !relationships.clusters_converged {
        lines.push("*Cluster detection stopped at its iteration limit*".into());
    }

    lines.extend([
        String::new(),
        "## Data Patterns".into(),
        String::new(),
        format!("- Temporal objects: {}", summary.data_patterns.temporal_objects.len()),
        format!("- Formula fields: {}", calc.total_formula_fields),
        format!("- Max formula chain depth: {}", calc.max_chain_depth),
        format!("- Assessment: {}", calc.interpretation),
        String::new(),
        "## UI Architecture".into(),
        String::new(),
        format!("- Authenticated scenes: {}", ui.authenticated_scenes),
        format!("- Public scenes: {}", ui.public_scenes),
        format!(
            "- Navigation depth: {} (max), {} (avg)",
            ui.navigation_depth.max_depth, ui.navigation_depth.average_depth
        ),
        format!("- Complexity: {}", ui.navigation_depth.interpretation),
        String::new(),
        "### View Types".into(),
    ]);
    let mut view_types: Vec<(&String, &usize)> = ui.view_types.iter().collect();
    view_types.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    lines.extend(view_types.into_iter().map(|(kind, count)| format!("- {kind}: {count}")));

    lines.extend([
        String::new(),
        "## Access Patterns".into(),
        String::new(),
        format!(
            "- User objects: {}",
            if access.user_objects.is_empty() { "None".to_string() } else { access.user_objects.join(", ") }
        ),
        format!("- Role-restricted scenes: {}", access.role_restricted_scenes.len()),
        String::new(),
        "## Technical Debt".into(),
        String::new(),
        format!("- Orphaned fields: {}", debt.orphaned_fields.len()),
        format!("- Orphaned objects: {}", debt.orphaned_objects.len()),
        format!("- Bottleneck objects: {}", debt.bottleneck_objects.len()),
        format!("- High fan-out objects: {}", debt.high_fan_out_objects.len()),
        format!("- Assessment: {}", debt.interpretation),
        String::new(),
        "## Extensibility".into(),
        String::new(),
        format!("- Modularity score: {}", ext.modularity_score),
        format!("- Architectural style: {}", ext.architectural_style.as_str()),
        format!("- Assessment: {}", ext.interpretation),
        format!("- Tight coupling pairs: {}", ext.tight_coupling_pairs.len()),
    ]);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisPolicy, Settings};
    use crate::coupling::CouplingAnalysis;
    use crate::model::fixtures::sample_app;

    #[test]
    fn impact_markdown_has_sections_and_pages() {
        let graph = Graph::build(sample_app()).unwrap();
        let policy = AnalysisPolicy::default();
        let coupling = CouplingAnalysis::compute(&graph, &policy);
        let report = crate::impact::analyze(&graph, &coupling, &policy, "object_2").unwrap();
        let links = BuilderLinks::new(&Settings::default(), graph.application());

        let text = impact(&report, &graph, &links);
        assert!(text.starts_with("# Impact Analysis: Customers"));
        assert!(text.contains("**Type:** object"));
        assert!(text.contains("- **Breaking Change Likelihood:** medium"));
        assert!(text.contains("### Affected Fields ("));
        assert!(text.contains("## Builder Pages to Review"));
        assert!(text.contains("(https://builder.knack.com/acme/portal/pages/scene_1)"));
    }

    #[test]
    fn impact_markdown_for_unused_field() {
        let graph = Graph::build(sample_app()).unwrap();
        let policy = AnalysisPolicy::default();
        let coupling = CouplingAnalysis::compute(&graph, &policy);
        let report = crate::impact::analyze(&graph, &coupling, &policy, "field_40").unwrap();
        let links = BuilderLinks::new(&Settings::default(), graph.application());

        let text = impact(&report, &graph, &links);
        assert!(text.contains("*No connection impacts*"));
        assert!(text.contains("- **Affected Workflows:** None"));
        assert!(!text.contains("Builder Pages"));
    }

    #[test]
    fn summary_markdown_covers_every_section() {
        let graph = Graph::build(sample_app()).unwrap();
        let summary = crate::summary::summarize(&graph, &AnalysisPolicy::default()).unwrap();
        let text = super::summary(&summary);
        for heading in [
            "# Application Architecture Summary: Project Tracker",
            "## Complexity Metrics",
            "## Domain Model",
            "## Relationship Topology",
            "## Data Patterns",
            "## UI Architecture",
            "## Access Patterns",
            "## Technical Debt",
            "## Extensibility",
        ] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("- **Records:** 1,068"));
        assert!(text.contains("- table: 2"));
    }
}
