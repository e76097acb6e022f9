use serde_json::{json, Map, Value};

use super::json_type;
use crate::model::{Application, Connection, KnackField, KnackObject};

/// Builds a draft-07 JSON Schema with one definition per object.
#[must_use]
pub fn to_json_schema(app: &Application) -> Value {
    let mut properties = Map::new();
    let mut definitions = Map::new();
    for object in &app.objects {
        definitions.insert(object.key.clone(), object_schema(app, object));
        let reference = format!("#/definitions/{}", object.key);
        properties.insert(
            object.key.clone(),
            json!({ "type": "array", "items": { "$ref": reference } }),
        );
    }

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": app.name,
        "description": app
            .description
            .clone()
            .unwrap_or_else(|| format!("Database schema for {}", app.name)),
        "type": "object",
        "x-knack-app-id": app.id,
        "x-knack-slug": app.slug,
        "properties": properties,
        "definitions": definitions,
    })
}

fn object_schema(app: &Application, object: &KnackObject) -> Value {
    let properties: Map<String, Value> =
        object.fields.iter().map(|f| (f.key.clone(), field_schema(f))).collect();
    let required: Vec<&str> =
        object.fields.iter().filter(|f| f.required).map(|f| f.key.as_str()).collect();

    let mut map = Map::new();
    map.insert("type".into(), json!("object"));
    map.insert("title".into(), json!(object.name));
    map.insert("x-knack-key".into(), json!(object.key));
    map.insert("properties".into(), Value::Object(properties));
    map.insert("x-record-count".into(), json!(app.record_count(&object.key)));
    if object.user {
        map.insert("x-user-object".into(), Value::Bool(true));
    }
    if let Some(identifier) = &object.identifier {
        map.insert("x-identifier-field".into(), json!(identifier));
    }
    if !required.is_empty() {
        map.insert("required".into(), json!(required));
    }

    let mut connections = Map::new();
    if !object.connections.outbound.is_empty() {
        connections.insert(
            "outbound".into(),
            object.connections.outbound.iter().map(|c| connection(c, "target_object")).collect(),
        );
    }
    if !object.connections.inbound.is_empty() {
        connections.insert(
            "inbound".into(),
            object.connections.inbound.iter().map(|c| connection(c, "source_object")).collect(),
        );
    }
    if !connections.is_empty() {
        map.insert("x-connections".into(), Value::Object(connections));
    }
    Value::Object(map)
}

fn connection(conn: &Connection, other_end: &str) -> Value {
    let mut map = Map::new();
    map.insert("key".into(), json!(conn.key));
    map.insert("name".into(), json!(conn.name));
    map.insert(other_end.into(), json!(conn.object));
    map.insert("has".into(), json!(conn.has));
    map.insert("belongs_to".into(), json!(conn.belongs_to));
    Value::Object(map)
}

fn field_schema(field: &KnackField) -> Value {
    let mut map = Map::new();
    map.insert("type".into(), json!(json_type(&field.field_type)));
    map.insert("title".into(), json!(field.name));
    map.insert("x-knack-type".into(), json!(field.field_type));
    map.insert("x-knack-key".into(), json!(field.key));
    if field.required {
        map.insert("x-required".into(), Value::Bool(true));
    }
    if field.unique {
        map.insert("x-unique".into(), Value::Bool(true));
    }
    let format = match field.field_type.as_str() {
        "email" => Some("email"),
        "date" => Some("date"),
        "date_time" => Some("date-time"),
        "time" => Some("time"),
        "link" => Some("uri"),
        _ => None,
    };
    if let Some(format) = format {
        map.insert("format".into(), json!(format));
    }
    if let Some(rel) = &field.relationship {
        map.insert("x-relationship".into(), json!(rel));
    }
    if let Some(format) = &field.format {
        map.insert("x-format".into(), json!(format));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::sample_app;

    #[test]
    fn definitions_carry_knack_annotations() {
        let schema = to_json_schema(&sample_app().application);
        assert_eq!(schema["$schema"], "http://json-schema.org/draft-07/schema#");
        assert_eq!(schema["x-knack-app-id"], "app_tracker_01");
        assert_eq!(schema["properties"]["object_2"]["items"]["$ref"], "#/definitions/object_2");

        let customers = &schema["definitions"]["object_2"];
        assert_eq!(customers["x-record-count"], 40);
        assert_eq!(customers["x-identifier-field"], "field_10");
        assert_eq!(customers["properties"]["field_10"]["type"], "string");
        assert_eq!(customers["x-connections"]["outbound"][0]["target_object"], "object_1");
        assert_eq!(customers["x-connections"]["inbound"][0]["source_object"], "object_3");

        let accounts = &schema["definitions"]["object_1"];
        assert_eq!(accounts["x-user-object"], true);
        assert_eq!(accounts["properties"]["field_2"]["format"], "email");
    }

    #[test]
    fn orphan_object_has_no_connections_block() {
        let schema = to_json_schema(&sample_app().application);
        assert!(schema["definitions"]["object_5"].get("x-connections").is_none());
    }
}
