//! Schema massaging for strict structured outputs.

use serde_json::{Map, Value};

/// Rewrites a JSON schema into the subset accepted in strict mode.
///
/// Strict mode rejects object schemas that leave `additionalProperties`
/// open or omit any property from `required`. Both are filled in where the
/// caller left them unset, explicit values are kept as given.
pub fn strict_schema(mut schema: Value) -> Value {
    tighten(&mut schema);
    schema
}

/// Keywords whose value is a single subschema.
const SUBSCHEMA_KEYWORDS: &[&str] =
    &["items", "additionalProperties", "not", "if", "then", "else"];
/// Keywords whose value is an array of subschemas.
const SUBSCHEMA_LIST_KEYWORDS: &[&str] =
    &["prefixItems", "anyOf", "oneOf", "allOf"];
/// Keywords whose value maps names to subschemas.
const SUBSCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "$defs", "definitions"];

/// Tightens one schema and walks only the positions that hold
/// subschemas, so property names and `enum`/`const`/`default` values are
/// never mistaken for schemas.
fn tighten(schema: &mut Value) {
    let Value::Object(object) = schema else {
        return;
    };
    if is_object_schema(object) {
        tighten_object(object);
    }
    for (keyword, value) in object.iter_mut() {
        let keyword = keyword.as_str();
        if SUBSCHEMA_KEYWORDS.contains(&keyword) {
            tighten(value);
        } else if SUBSCHEMA_LIST_KEYWORDS.contains(&keyword) {
            if let Value::Array(schemas) = value {
                schemas.iter_mut().for_each(tighten);
            }
        } else if SUBSCHEMA_MAP_KEYWORDS.contains(&keyword) {
            if let Value::Object(schemas) = value {
                schemas.values_mut().for_each(tighten);
            }
        }
    }
}

fn is_object_schema(object: &Map<String, Value>) -> bool {
    object.get("type").and_then(Value::as_str) == Some("object")
        || object.get("properties").is_some_and(Value::is_object)
}

fn tighten_object(object: &mut Map<String, Value>) {
    if !object.contains_key("required") {
        let properties = object.get("properties").and_then(Value::as_object);
        if let Some(properties) = properties {
            let mut required: Vec<_> = properties.keys().cloned().collect();
            required.sort();
            object.insert(
                "required".to_owned(),
                required.into_iter().map(Value::String).collect(),
            );
        }
    }
    object
        .entry("additionalProperties")
        .or_insert(Value::Bool(false));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_nested_objects() {
        let schema = json!({
            "type": "object",
            "properties": {
                "people": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": { "name": { "type": "string" } }
                    }
                }
            }
        });
        let strict = strict_schema(schema);
        assert_eq!(strict["additionalProperties"], json!(false));
        assert_eq!(strict["required"], json!(["people"]));
        let item = &strict["properties"]["people"]["items"];
        assert_eq!(item["additionalProperties"], json!(false));
        assert_eq!(item["required"], json!(["name"]));
    }

    #[test]
    fn test_property_named_properties() {
        let schema = json!({
            "type": "object",
            "properties": {
                "properties": {
                    "type": "array",
                    "items": { "type": "string" }
                }
            }
        });
        let strict = strict_schema(schema);
        let properties = strict["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(
            strict["properties"]["properties"],
            json!({ "type": "array", "items": { "type": "string" } })
        );
        assert_eq!(strict["required"], json!(["properties"]));
    }

    #[test]
    fn test_defs_and_literal_values() {
        let schema = json!({
            "type": "object",
            "properties": {
                "owner": { "$ref": "#/$defs/Person" },
                "kind": {
                    "enum": [{ "type": "object", "properties": {} }],
                    "default": { "properties": { "x": 1 } }
                }
            },
            "$defs": {
                "Person": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "pets": {
                            "anyOf": [
                                { "type": "object", "properties": { "n": {} } },
                                { "type": "null" }
                            ]
                        }
                    }
                }
            }
        });
        let strict = strict_schema(schema);
        let person = &strict["$defs"]["Person"];
        assert_eq!(person["additionalProperties"], json!(false));
        assert_eq!(person["required"], json!(["name", "pets"]));
        let variant = &person["properties"]["pets"]["anyOf"][0];
        assert_eq!(variant["required"], json!(["n"]));
        assert!(strict["$defs"].get("additionalProperties").is_none());

        let kind = &strict["properties"]["kind"];
        assert_eq!(kind["enum"], json!([{ "type": "object", "properties": {} }]));
        assert_eq!(kind["default"], json!({ "properties": { "x": 1 } }));
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let schema = json!({
            "type": "object",
            "properties": { "a": {}, "b": {} },
            "required": ["a"],
            "additionalProperties": true
        });
        assert_eq!(strict_schema(schema.clone()), schema);
    }
}
