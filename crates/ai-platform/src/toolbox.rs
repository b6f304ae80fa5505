//! Tools a model can ask to run, and the boxes that run them
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::PlatformResult;
use crate::models::tool::{Tool, ToolCall};

pub mod arguments;
pub mod local;
pub mod traceable;

pub use local::{FnHandler, LocalToolbox, LocalToolboxBuilder, ToolHandler};
pub use traceable::{ToolCallTrace, TraceableToolbox};

/// A set of tools offered to a model together with the means to run them
#[async_trait]
pub trait Toolbox: Send + Sync {
    /// The available tools keyed by name
    fn tools(&self) -> &BTreeMap<String, Tool>;

    /// Run a tool call, returning the result as text for the model
    async fn execute(&self, call: &ToolCall) -> PlatformResult<String>;
}

#[async_trait]
impl<T: Toolbox + ?Sized> Toolbox for Arc<T> {
    fn tools(&self) -> &BTreeMap<String, Tool> {
        (**self).tools()
    }

    async fn execute(&self, call: &ToolCall) -> PlatformResult<String> {
        (**self).execute(call).await
    }
}
