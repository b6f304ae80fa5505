use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    /// Read usage from a response's `usage` object, given the provider's key names
    pub fn from_response(data: &Value, input_key: &str, output_key: &str) -> Option<Self> {
        let usage = data.get("usage")?;

        // counts that do not fit are dropped rather than truncated
        let count = |key: &str| {
            usage
                .get(key)
                .and_then(Value::as_i64)
                .and_then(|v| i32::try_from(v).ok())
        };

        let input_tokens = count(input_key);
        let output_tokens = count(output_key);
        let total_tokens = count("total_tokens").or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => input.checked_add(output),
            _ => None,
        });

        Some(Usage::new(input_tokens, output_tokens, total_tokens))
    }
}

/// Provider details kept next to a converted result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub usage: Option<Usage>,
    /// The untouched response body
    pub raw: Option<Value>,
}

impl Metadata {
    pub fn from_raw(raw: Value, usage: Option<Usage>) -> Self {
        Self {
            usage,
            raw: Some(raw),
        }
    }
}
