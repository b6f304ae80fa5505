use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{0}")]
    InvalidConfiguration(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Model \"{0}\" is not supported by any registered client")]
    UnsupportedModel(String),

    #[error("Model \"{model}\" does not support \"{capability}\"")]
    MissingModelSupport { model: String, capability: String },

    #[error("Could not normalize: {0}")]
    Normalization(String),

    #[error("Cannot read a {actual} result as {expected}")]
    ResultType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters for tool \"{tool}\": {message}")]
    InvalidParameters { tool: String, message: String },

    #[error("Execution of tool \"{tool}\" failed: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Tool loop stopped after {0} rounds without a final answer")]
    ToolLoopLimit(usize),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider responded with status {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Context length exceeded. Message: {0}")]
    ContextLengthExceeded(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        PlatformError::Transport(err.to_string())
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;
