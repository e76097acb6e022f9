//! Shared test documents.

use serde_json::{json, Value};

use super::AppExport;

/// Raw text of the project-tracker sample application.
pub(crate) const SAMPLE_APP_JSON: &str = include_str!("../../tests/fixtures/sample_app.json");

/// The project-tracker sample application.
pub(crate) fn sample_app() -> AppExport {
    AppExport::from_json_str(SAMPLE_APP_JSON).unwrap()
}

/// Two objects: B has a connection field pointing at A; one table view over
/// A shows A's second field.
pub(crate) fn scenario_ab() -> AppExport {
    AppExport::from_value(json!({"application": {
        "name": "Scenario",
        "id": "scenario",
        "objects": [
            {
                "key": "object_a", "name": "A",
                "connections": {"inbound": [
                    {"has": "many", "key": "field_b1", "name": "A link", "object": "object_b", "belongs_to": "one"}
                ], "outbound": []},
                "fields": [
                    {"key": "field_a1", "name": "Title", "type": "short_text"},
                    {"key": "field_a2", "name": "Notes", "type": "paragraph_text"}
                ]
            },
            {
                "key": "object_b", "name": "B",
                "connections": {"inbound": [], "outbound": [
                    {"has": "many", "key": "field_b1", "name": "A link", "object": "object_a", "belongs_to": "one"}
                ]},
                "fields": [
                    {"key": "field_b1", "name": "A link", "type": "connection"}
                ]
            }
        ],
        "scenes": [{
            "key": "scene_1", "name": "A Page", "slug": "a-page",
            "views": [{
                "key": "view_1", "name": "A Table", "type": "table",
                "source": {"object": "object_a"},
                "columns": [{"type": "field", "field": {"key": "field_a2"}, "header": "Notes"}]
            }]
        }]
    }}))
    .unwrap()
}

/// `count` objects named `object_0..` with one connection per `(source, target)`
/// pair, declared on both sides.
pub(crate) fn linked(count: usize, edges: &[(usize, usize)]) -> AppExport {
    let mut objects: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "key": format!("object_{i}"),
                "name": format!("Object {i}"),
                "connections": {"inbound": [], "outbound": []},
                "fields": [{"key": format!("field_{i}_name"), "name": "Name", "type": "short_text"}]
            })
        })
        .collect();

    for (n, &(source, target)) in edges.iter().enumerate() {
        let field_key = format!("field_link_{n}");
        let conn = json!({
            "has": "many", "key": field_key, "name": format!("Link {n}"),
            "object": format!("object_{target}"), "belongs_to": "one"
        });
        let reverse = json!({
            "has": "many", "key": field_key, "name": format!("Link {n}"),
            "object": format!("object_{source}"), "belongs_to": "one"
        });
        objects[source]["fields"].as_array_mut().unwrap().push(json!({
            "key": field_key, "name": format!("Link {n}"), "type": "connection"
        }));
        objects[source]["connections"]["outbound"].as_array_mut().unwrap().push(conn);
        objects[target]["connections"]["inbound"].as_array_mut().unwrap().push(reverse);
    }

    AppExport::from_value(json!({"application": {
        "name": "Linked", "id": "linked", "objects": objects, "scenes": []
    }}))
    .unwrap()
}
