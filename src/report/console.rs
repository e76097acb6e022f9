//! Plain-text terminal output.

use crate::graph::{ConnectionEdge, FieldRef, Graph};
use crate::model::KnackObject;
use crate::search::{EntityUsages, Usage};

use super::{thousands, BuilderLinks};

/// Row order of [`object_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectOrder {
    /// Alphabetical by display name.
    Name,
    /// Largest record count first.
    Rows,
}

/// Usage listing for an object and, optionally, its fields.
#[must_use]
pub fn entity_search(
    object: &KnackObject,
    usages: &EntityUsages,
    show_fields: bool,
    links: &BuilderLinks,
) -> String {
    let mut lines = vec![
        format!("Object: {} ({}) - {} fields", object.name, object.key, object.fields.len()),
        String::new(),
        format!("Object-level usages: {}", usages.object_usages.len()),
    ];
    if usages.object_usages.is_empty() {
        lines.push("  No direct object usages found".into());
    }
    lines.extend(usages.object_usages.iter().map(|u| usage_line(u, 2)));

    let mut scenes: Vec<&str> = usages.object_usages.iter().filter_map(Usage::scene_key).collect();
    if show_fields {
        lines.push(String::new());
        if usages.field_usages.is_empty() {
            lines.push("No field usages found".into());
        } else {
            lines.push(format!(
                "Field-level usages: {} fields with usages",
                usages.field_usages.len()
            ));
        }
        for bucket in &usages.field_usages {
            lines.push(String::new());
            lines.push(format!(
                "  {} ({}) - {} - {} usages",
                bucket.field_name,
                bucket.field_key,
                bucket.field_type,
                bucket.usages.len()
            ));
            lines.extend(bucket.usages.iter().map(|u| usage_line(u, 4)));
            scenes.extend(bucket.usages.iter().filter_map(Usage::scene_key));
        }
    }

    push_pages(&mut lines, links, scenes);
    lines.join("\n")
}

/// Usage listing for a single field.
#[must_use]
pub fn field_search(found: FieldRef<'_>, usages: &[Usage], links: &BuilderLinks) -> String {
    let mut lines = vec![
        format!(
            "Field: {} ({}) - {} on {} ({})",
            found.field.name, found.field.key, found.field.field_type, found.object.name,
            found.object.key
        ),
        String::new(),
        format!("Usages: {}", usages.len()),
    ];
    if usages.is_empty() {
        lines.push("  No usages found".into());
    }
    lines.extend(usages.iter().map(|u| usage_line(u, 2)));
    push_pages(&mut lines, links, usages.iter().filter_map(Usage::scene_key).collect());
    lines.join("\n")
}

fn usage_line(usage: &Usage, indent: usize) -> String {
    format!("{:indent$}- [{}] {}", "", usage.location_type, usage.context)
}

fn push_pages(lines: &mut Vec<String>, links: &BuilderLinks, scenes: Vec<&str>) {
    let pages = links.pages(scenes);
    if pages.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("Builder pages to review: {} scenes", pages.len()));
    lines.extend(pages.into_iter().map(|url| format!("  {url}")));
}

/// Table of every object with record, field and connection counts.
#[must_use]
pub fn object_table(graph: &Graph, order: ObjectOrder) -> String {
    let mut objects: Vec<&KnackObject> = graph.objects().iter().collect();
    match order {
        ObjectOrder::Name => objects.sort_by_cached_key(|o| (o.name.to_lowercase(), o.key.clone())),
        ObjectOrder::Rows => objects.sort_by_cached_key(|o| {
            (std::cmp::Reverse(graph.record_count(&o.key)), o.name.to_lowercase())
        }),
    }

    let rows: Vec<[String; 7]> = objects
        .iter()
        .map(|o| {
            let ca = graph.inbound(&o.key).len();
            let ce = graph.outbound(&o.key).len();
            [
                o.key.clone(),
                o.name.clone(),
                thousands(graph.record_count(&o.key)),
                o.fields.len().to_string(),
                ca.to_string(),
                ce.to_string(),
                (ca + ce).to_string(),
            ]
        })
        .collect();

    let headers = ["KEY", "NAME", "ROWS", "FIELDS", "CA", "CE", "TOTAL"];
    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }
    let [kw, nw, rw, fw, aw, ew, tw] = widths;

    let mut lines = vec![
        format!("{} - Objects", graph.application().name),
        String::new(),
        format!(
            "{:<kw$}  {:<nw$}  {:>rw$}  {:>fw$}  {:>aw$}  {:>ew$}  {:>tw$}",
            headers[0], headers[1], headers[2], headers[3], headers[4], headers[5], headers[6]
        ),
        format!(
            "{:-<kw$}  {:-<nw$}  {:->rw$}  {:->fw$}  {:->aw$}  {:->ew$}  {:->tw$}",
            "", "", "", "", "", "", ""
        ),
    ];
    for [key, name, records, fields, ca, ce, total] in &rows {
        lines.push(format!(
            "{key:<kw$}  {name:<nw$}  {records:>rw$}  {fields:>fw$}  {ca:>aw$}  {ce:>ew$}  {total:>tw$}"
        ));
    }

    let record_sum: u64 = objects.iter().map(|o| graph.record_count(&o.key)).sum();
    let ca_sum: usize = objects.iter().map(|o| graph.inbound(&o.key).len()).sum();
    let ce_sum: usize = objects.iter().map(|o| graph.outbound(&o.key).len()).sum();
    lines.push(String::new());
    lines.push(format!(
        "Total: {} objects | {} rows | {} fields | Ca: {ca_sum} | Ce: {ce_sum} | {} connections",
        objects.len(),
        thousands(record_sum),
        graph.field_total(),
        ca_sum + ce_sum
    ));
    lines.join("\n")
}

/// Inbound and outbound dependencies of one object.
#[must_use]
pub fn coupling_view(graph: &Graph, object: &KnackObject) -> String {
    let inbound = graph.inbound(&object.key);
    let outbound = graph.outbound(&object.key);
    let mut lines = vec![
        format!("Object: {} ({})", object.name, object.key),
        format!("Ca: {} | Ce: {}", inbound.len(), outbound.len()),
        String::new(),
    ];

    if inbound.is_empty() {
        lines.push("Afferent coupling (Ca): 0 objects depend on this".into());
    } else {
        lines.push(format!("Afferent coupling (Ca): {} objects depend on this", inbound.len()));
        lines.extend(dependency_lines(graph, inbound, "<-", |edge| &edge.source));
    }
    lines.push(String::new());
    if outbound.is_empty() {
        lines.push("Efferent coupling (Ce): this object depends on no other objects".into());
    } else {
        lines.push(format!("Efferent coupling (Ce): {} objects this depends on", outbound.len()));
        lines.extend(dependency_lines(graph, outbound, "->", |edge| &edge.target));
    }
    lines.join("\n")
}

fn dependency_lines<'g>(
    graph: &'g Graph,
    edges: &'g [ConnectionEdge],
    arrow: &str,
    other_end: impl Fn(&'g ConnectionEdge) -> &'g String,
) -> Vec<String> {
    let mut rows: Vec<(&str, &str, &ConnectionEdge)> = edges
        .iter()
        .map(|edge| {
            let key = other_end(edge);
            let name = graph.object(key).map_or("", |o| o.name.as_str());
            (name, key.as_str(), edge)
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));
    rows.into_iter()
        .map(|(name, key, edge)| {
            format!(
                "  {arrow} {name} ({key})\n     via {} ({}) [{}]",
                edge.name,
                edge.field_key,
                edge.relationship()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::model::fixtures::sample_app;
    use crate::search::UsageSearch;

    fn graph() -> Graph {
        Graph::build(sample_app()).unwrap()
    }

    #[test]
    fn entity_search_lists_usages_and_pages() {
        let graph = graph();
        let links = BuilderLinks::new(&Settings::default(), graph.application());
        let usages = UsageSearch::new(&graph).search_entity("object_2").unwrap();
        let object = graph.object("object_2").unwrap();

        let text = entity_search(object, &usages, true, &links);
        assert!(text.starts_with("Object: Customers (object_2) - 3 fields"));
        assert!(text.contains("[connection_outbound]"));
        assert!(text.contains("Name (field_10) - short_text - 4 usages"));
        assert!(text.contains("https://builder.knack.com/acme/portal/pages/scene_1"));

        let brief = entity_search(object, &usages, false, &links);
        assert!(!brief.contains("Field-level usages"));
    }

    #[test]
    fn field_search_without_usages() {
        let graph = graph();
        let links = BuilderLinks::new(&Settings::default(), graph.application());
        let found = graph.field("field_40").unwrap();
        let text = field_search(found, &[], &links);
        assert!(text.contains("No usages found"));
        assert!(!text.contains("Builder pages"));
    }

    #[test]
    fn object_table_sorts_and_totals() {
        let graph = graph();
        let by_name = object_table(&graph, ObjectOrder::Name);
        let names: Vec<&str> = by_name
            .lines()
            .skip(4)
            .take(5)
            .map(|line| line.split_whitespace().nth(1).unwrap())
            .collect();
        assert_eq!(names, vec!["Accounts", "Customers", "Projects", "Regions", "Tasks"]);
        assert!(by_name.contains("Total: 5 objects | 1,068 rows | 17 fields"));

        let by_rows = object_table(&graph, ObjectOrder::Rows);
        let first = by_rows.lines().nth(4).unwrap();
        assert!(first.starts_with("object_4"));
    }

    #[test]
    fn coupling_view_names_both_directions() {
        let graph = graph();
        let text = coupling_view(&graph, graph.object("object_3").unwrap());
        assert!(text.contains("Ca: 1 | Ce: 1"));
        assert!(text.contains("<- Tasks (object_4)"));
        assert!(text.contains("-> Customers (object_2)"));
        assert!(text.contains("via Customer (field_21)"));
    }
}
