use async_trait::async_trait;
use jsonschema::Validator;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::arguments;
use super::Toolbox;
use crate::errors::{PlatformError, PlatformResult};
use crate::models::tool::{Tool, ToolCall};

/// Runs the tools that reference it
///
/// `method` is the method of the tool's execution reference, letting one handler back
/// several tools.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn invoke(&self, method: &str, arguments: Map<String, Value>) -> anyhow::Result<Value>;
}

/// Adapts an async closure into a handler that ignores the method
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn invoke(&self, _method: &str, arguments: Map<String, Value>) -> anyhow::Result<Value> {
        (self.0)(arguments).await
    }
}

/// A toolbox running in process handlers
pub struct LocalToolbox {
    tools: BTreeMap<String, Tool>,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    validators: HashMap<String, Validator>,
}

impl LocalToolbox {
    pub fn builder() -> LocalToolboxBuilder {
        LocalToolboxBuilder::default()
    }
}

#[async_trait]
impl Toolbox for LocalToolbox {
    fn tools(&self) -> &BTreeMap<String, Tool> {
        &self.tools
    }

    async fn execute(&self, call: &ToolCall) -> PlatformResult<String> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| PlatformError::ToolNotFound(call.name.clone()))?;
        let handler = self
            .handlers
            .get(&tool.reference.handler)
            .ok_or_else(|| PlatformError::ToolNotFound(call.name.clone()))?;

        let arguments = arguments::coerce(&call.arguments, tool.parameters.as_ref());
        if let Some(validator) = self.validators.get(&tool.name) {
            arguments::validate(validator, &tool.name, &arguments)?;
        }

        debug!(tool = %tool.name, id = %call.id, "executing tool");
        let value = handler
            .invoke(&tool.reference.method, arguments)
            .await
            .map_err(|source| PlatformError::ToolExecution {
                tool: tool.name.clone(),
                source,
            })?;

        Ok(match value {
            Value::String(text) => text,
            other => other.to_string(),
        })
    }
}

/// Collects tools and handlers, checking them once in [`LocalToolboxBuilder::build`]
#[derive(Default)]
pub struct LocalToolboxBuilder {
    tools: Vec<Tool>,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl LocalToolboxBuilder {
    /// Register a handler under the name tools reference it by
    pub fn handler<S, H>(mut self, name: S, handler: H) -> Self
    where
        S: Into<String>,
        H: ToolHandler + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    /// Register an async closure as a handler
    pub fn function<S, F, Fut>(self, name: S, function: F) -> Self
    where
        S: Into<String>,
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.handler(name, FnHandler(function))
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn build(self) -> PlatformResult<LocalToolbox> {
        let mut tools = BTreeMap::new();
        let mut validators = HashMap::new();

        for tool in self.tools {
            if !self.handlers.contains_key(&tool.reference.handler) {
                return Err(PlatformError::InvalidConfiguration(format!(
                    "Tool \"{}\" references the unknown handler \"{}\"",
                    tool.name, tool.reference.handler
                )));
            }
            if let Some(schema) = &tool.parameters {
                validators.insert(tool.name.clone(), arguments::compile(&tool.name, schema)?);
            }
            if tools.contains_key(&tool.name) {
                return Err(PlatformError::InvalidConfiguration(format!(
                    "Duplicate tool name: {}",
                    tool.name
                )));
            }
            tools.insert(tool.name.clone(), tool);
        }

        Ok(LocalToolbox {
            tools,
            handlers: self.handlers,
            validators,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tool::ExecutionReference;
    use anyhow::anyhow;
    use serde_json::json;
    use tracing_test::traced_test;

    struct Calculator;

    #[async_trait]
    impl ToolHandler for Calculator {
        async fn invoke(
            &self,
            method: &str,
            arguments: Map<String, Value>,
        ) -> anyhow::Result<Value> {
            let operand = |name: &str| {
                arguments
                    .get(name)
                    .and_then(Value::as_i64)
                    .ok_or_else(|| anyhow!("{name} is missing"))
            };
            let (a, b) = (operand("a")?, operand("b")?);
            match method {
                "add" => Ok(json!(a + b)),
                "divide" if b == 0 => Err(anyhow!("division by zero")),
                "divide" => Ok(json!(a / b)),
                other => Err(anyhow!("unknown method {other}")),
            }
        }
    }

    fn operands() -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
            "required": ["a", "b"]
        }))
    }

    fn toolbox() -> LocalToolbox {
        LocalToolbox::builder()
            .handler("calculator", Calculator)
            .function("clock", |_| async { Ok::<_, anyhow::Error>(json!("12:00")) })
            .tool(Tool::new(
                ExecutionReference::with_method("calculator", "add"),
                "add",
                "Add two integers",
                operands(),
            ))
            .tool(Tool::new(
                ExecutionReference::with_method("calculator", "divide"),
                "divide",
                "Divide two integers",
                operands(),
            ))
            .tool(Tool::new(
                ExecutionReference::new("clock"),
                "now",
                "The current time",
                None,
            ))
            .build()
            .unwrap()
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall::new("call_1", name).with_argument_value(arguments)
    }

    #[tokio::test]
    async fn test_execute_routes_by_reference() -> PlatformResult<()> {
        let toolbox = toolbox();
        assert_eq!(toolbox.tools().len(), 3);

        // results that are not strings are JSON encoded
        assert_eq!(toolbox.execute(&call("add", json!({"a": 2, "b": 3}))).await?, "5");
        assert_eq!(toolbox.execute(&call("now", json!({}))).await?, "12:00");
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_execution_is_logged() -> PlatformResult<()> {
        toolbox().execute(&call("now", json!({}))).await?;
        assert!(logs_contain("executing tool"));
        Ok(())
    }

    #[tokio::test]
    async fn test_string_arguments_are_coerced() -> PlatformResult<()> {
        let result = toolbox()
            .execute(&call("divide", json!({"a": "9", "b": "3"})))
            .await?;
        assert_eq!(result, "3");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = toolbox().execute(&call("multiply", json!({}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Tool not found: multiply");
    }

    #[tokio::test]
    async fn test_invalid_parameters() {
        let err = toolbox()
            .execute(&call("add", json!({"a": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::InvalidParameters { ref tool, .. } if tool == "add"));
    }

    #[tokio::test]
    async fn test_handler_failure() {
        let err = toolbox()
            .execute(&call("divide", json!({"a": 1, "b": 0})))
            .await
            .unwrap_err();
        let PlatformError::ToolExecution { tool, source } = err else {
            panic!("expected a tool execution error");
        };
        assert_eq!(tool, "divide");
        assert_eq!(source.to_string(), "division by zero");
    }

    #[test]
    fn test_build_checks_references_and_names() {
        let err = LocalToolbox::builder()
            .tool(Tool::new(ExecutionReference::new("missing"), "ghost", "", None))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, PlatformError::InvalidConfiguration(_)));

        let err = LocalToolbox::builder()
            .function("clock", |_| async { Ok::<_, anyhow::Error>(json!("12:00")) })
            .tool(Tool::new(ExecutionReference::new("clock"), "now", "", None))
            .tool(Tool::new(ExecutionReference::new("clock"), "now", "", None))
            .build()
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Duplicate tool name: now");
    }
}
