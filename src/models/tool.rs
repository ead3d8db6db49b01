use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

lazy_static! {
    static ref TOOL_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// The contract of a tool as seen by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// A json schema of the expected input
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new<N, D>(name: N, description: D, parameters: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        ToolSpec {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Tool names end up inside the bracketed action list of the prompt, so only a conservative
    /// character set is accepted.
    pub fn has_valid_name(&self) -> bool {
        TOOL_NAME.is_match(&self.name)
    }

    /// Check `input` against the top level of the parameter schema.
    ///
    /// Only `type`, `required` and the primitive `type` of each declared property are enforced;
    /// nested schemas are left to the tool's own deserialization.
    pub fn validate_input(&self, input: &Value) -> Result<(), String> {
        if let Some(expected) = self.parameters.get("type").and_then(Value::as_str) {
            if !matches_type(expected, input) {
                return Err(format!("expected {}, got {}", expected, type_name(input)));
            }
        }

        let Some(object) = input.as_object() else {
            return Ok(());
        };

        if let Some(required) = self.parameters.get("required").and_then(Value::as_array) {
            for field in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(field) {
                    return Err(format!("missing field `{}`", field));
                }
            }
        }

        if let Some(properties) = self.parameters.get("properties").and_then(Value::as_object) {
            for (field, schema) in properties {
                let (Some(value), Some(expected)) = (
                    object.get(field),
                    schema.get("type").and_then(Value::as_str),
                ) else {
                    continue;
                };
                if !matches_type(expected, value) {
                    return Err(format!(
                        "field `{}` should be {}, got {}",
                        field,
                        expected,
                        type_name(value)
                    ));
                }
            }
        }

        Ok(())
    }
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
