//! JSON Schema normalization for tool parameters
//!
//! Model backends validate generated arguments against the advertised schema
//! and will invent extra fields unless every object level forbids them.

use serde_json::{Map, Value};

const COMPOSITE_KEYWORDS: [&str; 3] = ["oneOf", "anyOf", "allOf"];

/// Return a copy of `schema` where every object node has `additionalProperties: false`
///
/// Recurses through `properties`, `items` (single schema or tuple form) and
/// every branch of `oneOf` / `anyOf` / `allOf`. Non-object values are returned
/// unchanged. The input is never mutated and the transformation is idempotent.
pub fn ensure_no_additional_properties(schema: &Value) -> Value {
    let Value::Object(node) = schema else {
        return schema.clone();
    };

    let mut out = node.clone();

    if has_type(node, "object") {
        out.insert("additionalProperties".to_string(), Value::Bool(false));
        if let Some(Value::Object(properties)) = node.get("properties") {
            let normalized: Map<String, Value> = properties
                .iter()
                .map(|(name, prop)| (name.clone(), ensure_no_additional_properties(prop)))
                .collect();
            out.insert("properties".to_string(), Value::Object(normalized));
        }
    }

    if has_type(node, "array") {
        match node.get("items") {
            Some(Value::Array(tuple)) => {
                let normalized = tuple.iter().map(ensure_no_additional_properties).collect();
                out.insert("items".to_string(), Value::Array(normalized));
            }
            Some(items) => {
                out.insert("items".to_string(), ensure_no_additional_properties(items));
            }
            None => {}
        }
    }

    for keyword in COMPOSITE_KEYWORDS {
        if let Some(Value::Array(branches)) = node.get(keyword) {
            let normalized = branches.iter().map(ensure_no_additional_properties).collect();
            out.insert(keyword.to_string(), Value::Array(normalized));
        }
    }

    Value::Object(out)
}

/// `"type": "x"` or `"type": [..., "x", ...]`
fn has_type(node: &Map<String, Value>, wanted: &str) -> bool {
    match node.get("type") {
        Some(Value::String(t)) => t == wanted,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nested_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "filter": {
                    "type": "object",
                    "properties": {
                        "tags": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": { "name": { "type": "string" } }
                            }
                        }
                    }
                },
                "target": {
                    "oneOf": [
                        { "type": "object", "properties": { "id": { "type": "integer" } } },
                        { "type": "string" }
                    ]
                },
                "mode": {
                    "anyOf": [{ "type": "object" }, { "type": "null" }]
                },
                "extra": {
                    "allOf": [{ "type": "object", "properties": {} }]
                },
                "pair": {
                    "type": "array",
                    "items": [{ "type": "object" }, { "type": "number" }]
                },
                "maybe": { "type": ["object", "null"] }
            },
            "required": ["query"]
        })
    }

    /// Collect every object node reachable through the keywords we normalize.
    fn object_nodes<'a>(schema: &'a Value, out: &mut Vec<&'a Value>) {
        let Value::Object(node) = schema else { return };
        if has_type(node, "object") {
            out.push(schema);
        }
        if let Some(Value::Object(props)) = node.get("properties") {
            props.values().for_each(|p| object_nodes(p, out));
        }
        match node.get("items") {
            Some(Value::Array(items)) => items.iter().for_each(|i| object_nodes(i, out)),
            Some(items) => object_nodes(items, out),
            None => {}
        }
        for keyword in COMPOSITE_KEYWORDS {
            if let Some(Value::Array(branches)) = node.get(keyword) {
                branches.iter().for_each(|b| object_nodes(b, out));
            }
        }
    }

    #[test]
    fn test_every_nested_object_is_closed() {
        let normalized = ensure_no_additional_properties(&nested_schema());

        let mut nodes = Vec::new();
        object_nodes(&normalized, &mut nodes);
        assert_eq!(nodes.len(), 8);
        for node in nodes {
            assert_eq!(node["additionalProperties"], json!(false), "open node: {}", node);
        }
    }

    #[test]
    fn test_input_is_not_mutated() {
        let original = nested_schema();
        let snapshot = original.clone();

        let _ = ensure_no_additional_properties(&original);

        assert_eq!(original, snapshot);
        assert!(original.get("additionalProperties").is_none());
    }

    #[test]
    fn test_idempotent() {
        let once = ensure_no_additional_properties(&nested_schema());
        let twice = ensure_no_additional_properties(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_open_map_schema_is_forced_closed() {
        let schema = json!({ "type": "object", "additionalProperties": { "type": "string" } });
        let normalized = ensure_no_additional_properties(&schema);
        assert_eq!(normalized["additionalProperties"], json!(false));
    }

    #[test]
    fn test_non_object_values_pass_through() {
        assert_eq!(ensure_no_additional_properties(&json!(true)), json!(true));
        assert_eq!(
            ensure_no_additional_properties(&json!({ "type": "string" })),
            json!({ "type": "string" })
        );
    }

    #[test]
    fn test_unrelated_keys_are_preserved() {
        let schema = json!({
            "type": "object",
            "description": "args",
            "required": ["a"],
            "properties": { "a": { "type": "string", "enum": ["x", "y"] } }
        });
        let normalized = ensure_no_additional_properties(&schema);
        assert_eq!(normalized["description"], "args");
        assert_eq!(normalized["required"], json!(["a"]));
        assert_eq!(normalized["properties"]["a"]["enum"], json!(["x", "y"]));
    }
}
