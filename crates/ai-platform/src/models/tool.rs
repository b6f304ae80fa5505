use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Locates the handler that runs a tool
///
/// `handler` names a handler registered with a toolbox and `method` selects the
/// operation on it, so one handler can back several tools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionReference {
    pub handler: String,
    pub method: String,
}

impl ExecutionReference {
    pub const DEFAULT_METHOD: &'static str = "call";

    pub fn new<S: Into<String>>(handler: S) -> Self {
        Self::with_method(handler, Self::DEFAULT_METHOD)
    }

    pub fn with_method<H: Into<String>, M: Into<String>>(handler: H, method: M) -> Self {
        Self {
            handler: handler.into(),
            method: method.into(),
        }
    }
}

/// A tool that can be used by a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// Where the implementation of the tool lives
    pub reference: ExecutionReference,
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema of the parameters the tool accepts, if it takes any
    pub parameters: Option<Value>,
}

impl Tool {
    pub fn new<N, D>(
        reference: ExecutionReference,
        name: N,
        description: D,
        parameters: Option<Value>,
    ) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            reference,
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A request from a model to run a tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Provider assigned id, echoed back with the result
    pub id: String,
    /// The name of the tool to execute
    pub name: String,
    /// The arguments for the execution
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Build the arguments from a JSON value, anything but an object yields no arguments
    pub fn with_argument_value(self, arguments: Value) -> Self {
        match arguments {
            Value::Object(map) => self.with_arguments(map),
            _ => self,
        }
    }
}
