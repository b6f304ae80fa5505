use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use super::Toolbox;
use crate::errors::PlatformResult;
use crate::models::tool::{Tool, ToolCall};

/// A tool call together with the result it produced
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallTrace {
    pub call: ToolCall,
    pub result: String,
}

/// Records every successful call made through the wrapped toolbox
pub struct TraceableToolbox<T> {
    inner: T,
    calls: Mutex<Vec<ToolCallTrace>>,
}

impl<T: Toolbox> TraceableToolbox<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// The recorded calls in invocation order
    pub fn calls(&self) -> Vec<ToolCallTrace> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl<T: Toolbox> Toolbox for TraceableToolbox<T> {
    fn tools(&self) -> &BTreeMap<String, Tool> {
        self.inner.tools()
    }

    async fn execute(&self, call: &ToolCall) -> PlatformResult<String> {
        let result = self.inner.execute(call).await?;
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ToolCallTrace {
                call: call.clone(),
                result: result.clone(),
            });
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PlatformError;
    use crate::models::tool::ExecutionReference;

    struct FixedToolbox {
        tools: BTreeMap<String, Tool>,
    }

    impl FixedToolbox {
        fn new() -> Self {
            let tool = Tool::new(ExecutionReference::new("Foo\\Bar"), "bar", "description", None);
            Self {
                tools: BTreeMap::from([("tool".to_string(), tool)]),
            }
        }
    }

    #[async_trait]
    impl Toolbox for FixedToolbox {
        fn tools(&self) -> &BTreeMap<String, Tool> {
            &self.tools
        }

        async fn execute(&self, call: &ToolCall) -> PlatformResult<String> {
            match call.name.as_str() {
                "fail" => Err(PlatformError::ToolNotFound(call.name.clone())),
                _ => Ok("tool_result".to_string()),
            }
        }
    }

    #[test]
    fn test_tools_are_forwarded() {
        let traceable = TraceableToolbox::new(FixedToolbox::new());
        assert_eq!(traceable.tools(), FixedToolbox::new().tools());
    }

    #[tokio::test]
    async fn test_execute_records_the_call() -> PlatformResult<()> {
        let traceable = TraceableToolbox::new(FixedToolbox::new());
        let call = ToolCall::new("foo", "__invoke");

        let result = traceable.execute(&call).await?;

        assert_eq!(result, "tool_result");
        let calls = traceable.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].call, call);
        assert_eq!(calls[0].result, "tool_result");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_calls_are_not_recorded() {
        let traceable = TraceableToolbox::new(FixedToolbox::new());

        assert!(traceable.execute(&ToolCall::new("1", "fail")).await.is_err());
        traceable.execute(&ToolCall::new("2", "ok")).await.unwrap();

        let calls = traceable.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].call.id, "2");
    }
}
