//! Strict JSON schemas for OpenAI structured outputs, derived with `schemars`.
//!
//! OpenAI's strict mode rejects a schema unless:
//! 1. every object sets `additionalProperties: false`
//! 2. every property is listed in `required` (optional fields stay nullable)
//! 3. there are no `$ref` pointers left to resolve
//!
//! [`StructuredOutput::strict_schema`] rewrites the schemars output in a single
//! walk that inlines definitions and tightens objects as it goes.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Types that can be requested as OpenAI structured output.
///
/// Blanket-implemented for anything that is `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Strict-mode compatible schema for this type.
    fn strict_schema() -> Value {
        let root = serde_json::to_value(schema_for!(Self)).unwrap_or_default();
        let Value::Object(mut root) = root else {
            return Value::Object(Map::new());
        };

        let definitions = root
            .remove("definitions")
            .and_then(|d| match d {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();
        root.remove("$schema");

        let mut schema = Value::Object(root);
        strictify(&mut schema, &definitions, 0);
        schema
    }

    /// Name sent alongside the schema.
    fn output_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Recursion guard for self-referential definitions.
const MAX_INLINE_DEPTH: usize = 16;

fn strictify(value: &mut Value, definitions: &Map<String, Value>, depth: usize) {
    match value {
        Value::Object(map) => {
            if depth < MAX_INLINE_DEPTH {
                if let Some(definition) = resolve_ref(map, definitions) {
                    *value = definition;
                    strictify(value, definitions, depth + 1);
                    return;
                }
            }

            if map.get("type").and_then(Value::as_str) == Some("object") {
                tighten_object(map);
            }

            for child in map.values_mut() {
                strictify(child, definitions, depth);
            }
        }
        Value::Array(items) => {
            for item in items {
                strictify(item, definitions, depth);
            }
        }
        _ => {}
    }
}

fn resolve_ref(map: &Map<String, Value>, definitions: &Map<String, Value>) -> Option<Value> {
    let pointer = map.get("$ref")?.as_str()?;
    let name = pointer.strip_prefix(DEFINITIONS_PREFIX)?;
    definitions.get(name).cloned()
}

fn tighten_object(map: &mut Map<String, Value>) {
    map.insert("additionalProperties".into(), Value::Bool(false));

    let required: Vec<Value> = map
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().map(Value::String).collect())
        .unwrap_or_default();
    map.insert("required".into(), Value::Array(required));
}
