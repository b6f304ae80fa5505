//! Preparing model supplied arguments before a handler sees them
use jsonschema::Validator;
use serde_json::{Map, Number, Value};

use crate::errors::{PlatformError, PlatformResult};

/// Convert string arguments to the scalar type their schema declares
///
/// Models regularly send `"3"` for an integer or `"true"` for a boolean. Values that do
/// not parse are left alone for validation to report.
pub fn coerce(arguments: &Map<String, Value>, schema: Option<&Value>) -> Map<String, Value> {
    let Some(properties) = schema
        .and_then(|schema| schema.get("properties"))
        .and_then(Value::as_object)
    else {
        return arguments.clone();
    };

    arguments
        .iter()
        .map(|(name, value)| {
            let coerced = match (value, properties.get(name).and_then(declared_type)) {
                (Value::String(raw), Some(kind)) => coerce_string(raw, kind),
                _ => None,
            };
            (name.clone(), coerced.unwrap_or_else(|| value.clone()))
        })
        .collect()
}

/// The declared type of a property, skipping `null` in type unions
fn declared_type(property: &Value) -> Option<&str> {
    match property.get("type")? {
        Value::String(kind) => Some(kind.as_str()),
        Value::Array(kinds) => kinds
            .iter()
            .filter_map(Value::as_str)
            .find(|kind| *kind != "null"),
        _ => None,
    }
}

fn coerce_string(raw: &str, kind: &str) -> Option<Value> {
    let raw = raw.trim();
    match kind {
        "integer" => raw.parse::<i64>().ok().map(Value::from),
        "number" => raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        "boolean" => match raw.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// Compile a tool's parameter schema
pub fn compile(tool: &str, schema: &Value) -> PlatformResult<Validator> {
    jsonschema::validator_for(schema).map_err(|e| {
        PlatformError::InvalidConfiguration(format!(
            "Invalid parameter schema for tool \"{tool}\": {e}"
        ))
    })
}

/// Check arguments against a compiled schema, reporting every violation
pub fn validate(validator: &Validator, tool: &str, arguments: &Map<String, Value>) -> PlatformResult<()> {
    let instance = Value::Object(arguments.clone());
    if validator.validate(&instance).is_ok() {
        return Ok(());
    }

    let message = validator
        .iter_errors(&instance)
        .map(|err| format!("{} at {}", err, err.instance_path))
        .collect::<Vec<_>>()
        .join("; ");
    Err(PlatformError::InvalidParameters {
        tool: tool.to_string(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {"type": "string"},
                "days": {"type": "integer"},
                "threshold": {"type": ["number", "null"]},
                "metric": {"type": "boolean"}
            },
            "required": ["city"]
        })
    }

    fn arguments(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_coerce_scalars() {
        let coerced = coerce(
            &arguments(json!({"city": "42", "days": "3", "threshold": "0.5", "metric": "TRUE"})),
            Some(&schema()),
        );

        assert_eq!(
            Value::Object(coerced),
            json!({"city": "42", "days": 3, "threshold": 0.5, "metric": true})
        );
    }

    #[test]
    fn test_uncoercible_values_are_kept() {
        let coerced = coerce(&arguments(json!({"days": "soon"})), Some(&schema()));
        assert_eq!(coerced["days"], "soon");

        let untouched = coerce(&arguments(json!({"days": "3"})), None);
        assert_eq!(untouched["days"], "3");
    }

    #[test]
    fn test_validate_reports_violations() {
        let validator = compile("get_weather", &schema()).unwrap();
        assert!(validate(&validator, "get_weather", &arguments(json!({"city": "Paris"}))).is_ok());

        let err = validate(&validator, "get_weather", &arguments(json!({"days": "soon"}))).unwrap_err();
        let PlatformError::InvalidParameters { tool, message } = err else {
            panic!("expected invalid parameters");
        };
        assert_eq!(tool, "get_weather");
        assert!(message.contains("city"));
        assert!(message.contains("/days"));
    }

    #[test]
    fn test_invalid_schema() {
        let err = compile("broken", &json!({"type": "no-such-type"})).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidConfiguration(_)));
    }
}
