use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

use super::normalizer::{kinds, unexpected, ContractData, DataKind, Normalizer};
use super::Contract;
use crate::errors::{PlatformError, PlatformResult};
use crate::models::tool::Tool;

lazy_static! {
    static ref FUNCTION_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Provider function names must match `[a-zA-Z0-9_-]+`
pub fn is_valid_function_name(name: &str) -> bool {
    FUNCTION_NAME.is_match(name)
}

/// Check a set of tools before it is offered to a model
pub(crate) fn validate_tools(tools: &[Tool]) -> PlatformResult<()> {
    let mut names = HashSet::new();
    for tool in tools {
        if !is_valid_function_name(&tool.name) {
            return Err(PlatformError::InvalidArgument(format!(
                "The tool name '{}' has invalid characters, it must match [a-zA-Z0-9_-]+",
                tool.name
            )));
        }
        if !names.insert(tool.name.as_str()) {
            return Err(PlatformError::InvalidArgument(format!(
                "Duplicate tool name: {}",
                tool.name
            )));
        }
    }
    Ok(())
}

/// `{type: function, function: {name, description, parameters?}}`
pub struct ToolNormalizer;

impl Normalizer for ToolNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::Tool])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        let ContractData::Tool(tool) = data else {
            return Err(unexpected("ToolNormalizer", data.kind()));
        };

        let mut function = json!({
            "name": tool.name,
            "description": tool.description,
        });
        if let Some(parameters) = &tool.parameters {
            function["parameters"] = parameters.clone();
        }
        Ok(json!({"type": "function", "function": function}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::ExecutionReference;

    fn tool(name: &str) -> Tool {
        Tool::new(
            ExecutionReference::new("handler"),
            name,
            "A test tool",
            Some(json!({
                "type": "object",
                "properties": {
                    "input": {"type": "string", "description": "Test parameter"}
                },
                "required": ["input"]
            })),
        )
    }

    #[test]
    fn test_tool_option() -> PlatformResult<()> {
        let wire = Contract::default().create_tool_option(&[tool("test_tool")])?;

        assert_eq!(wire[0]["type"], "function");
        assert_eq!(wire[0]["function"]["name"], "test_tool");
        assert_eq!(wire[0]["function"]["parameters"]["required"][0], "input");
        Ok(())
    }

    #[test]
    fn test_tool_without_parameters() -> PlatformResult<()> {
        let tool = Tool::new(ExecutionReference::new("clock"), "now", "Current time", None);
        let wire = Contract::default().normalize(ContractData::Tool(&tool))?;
        assert!(wire["function"].get("parameters").is_none());
        Ok(())
    }

    #[test]
    fn test_duplicate_tool_names() {
        let err = Contract::default()
            .create_tool_option(&[tool("test_tool"), tool("test_tool")])
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate tool name: test_tool");
    }

    #[test]
    fn test_is_valid_function_name() {
        assert!(is_valid_function_name("hello-world"));
        assert!(is_valid_function_name("hello_world"));
        assert!(!is_valid_function_name("hello world"));
        assert!(!is_valid_function_name("hello@world"));
    }
}
