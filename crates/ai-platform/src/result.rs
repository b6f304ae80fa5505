//! Uniform results of model invocations
use serde_json::Value;

use crate::errors::{PlatformError, PlatformResult};
use crate::models::tool::ToolCall;

pub mod image;
pub mod metadata;
pub mod stream;

pub use image::{Base64Image, GeneratedImage, UrlImage};
pub use metadata::{Metadata, Usage};
pub use stream::{Delta, DeltaStream, StreamResult, ToolCallAccumulator, ToolCallDelta};

#[derive(Debug, Clone, PartialEq)]
pub struct TextResult {
    pub text: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredResult {
    pub value: Value,
    pub metadata: Metadata,
}

/// A model asking for tools to be run before it answers
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallsResult {
    pub tool_calls: Vec<ToolCall>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vector(pub Vec<f32>);

impl Vector {
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorResult {
    pub vectors: Vec<Vector>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub images: Vec<GeneratedImage>,
    /// The prompt the provider actually used, when it rewrote the given one
    pub revised_prompt: Option<String>,
    pub metadata: Metadata,
}

/// The outcome of a model invocation
///
/// Use the accessor matching the variant; any other accessor fails with
/// [`PlatformError::ResultType`].
#[derive(Debug)]
pub enum ModelResult {
    Text(TextResult),
    Structured(StructuredResult),
    ToolCalls(ToolCallsResult),
    Vectors(VectorResult),
    Images(ImageResult),
    Stream(StreamResult),
}

impl ModelResult {
    pub fn text<S: Into<String>>(text: S, metadata: Metadata) -> Self {
        ModelResult::Text(TextResult {
            text: text.into(),
            metadata,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelResult::Text(_) => "text",
            ModelResult::Structured(_) => "structured",
            ModelResult::ToolCalls(_) => "tool calls",
            ModelResult::Vectors(_) => "vectors",
            ModelResult::Images(_) => "images",
            ModelResult::Stream(_) => "stream",
        }
    }

    fn mismatch(&self, expected: &'static str) -> PlatformError {
        PlatformError::ResultType {
            expected,
            actual: self.kind(),
        }
    }

    pub fn as_text(&self) -> PlatformResult<&str> {
        match self {
            ModelResult::Text(result) => Ok(&result.text),
            _ => Err(self.mismatch("text")),
        }
    }

    pub fn as_structured(&self) -> PlatformResult<&Value> {
        match self {
            ModelResult::Structured(result) => Ok(&result.value),
            _ => Err(self.mismatch("structured")),
        }
    }

    pub fn as_tool_calls(&self) -> PlatformResult<&[ToolCall]> {
        match self {
            ModelResult::ToolCalls(result) => Ok(&result.tool_calls),
            _ => Err(self.mismatch("tool calls")),
        }
    }

    pub fn as_vectors(&self) -> PlatformResult<&[Vector]> {
        match self {
            ModelResult::Vectors(result) => Ok(&result.vectors),
            _ => Err(self.mismatch("vectors")),
        }
    }

    pub fn as_images(&self) -> PlatformResult<&[GeneratedImage]> {
        match self {
            ModelResult::Images(result) => Ok(&result.images),
            _ => Err(self.mismatch("images")),
        }
    }

    /// Hand out the delta stream; a second call yields an empty stream
    pub fn as_stream(&mut self) -> PlatformResult<DeltaStream> {
        match self {
            ModelResult::Stream(result) => Ok(result.take()),
            _ => Err(self.mismatch("stream")),
        }
    }

    /// Provider metadata; streams carry none
    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            ModelResult::Text(result) => Some(&result.metadata),
            ModelResult::Structured(result) => Some(&result.metadata),
            ModelResult::ToolCalls(result) => Some(&result.metadata),
            ModelResult::Vectors(result) => Some(&result.metadata),
            ModelResult::Images(result) => Some(&result.metadata),
            ModelResult::Stream(_) => None,
        }
    }
}
