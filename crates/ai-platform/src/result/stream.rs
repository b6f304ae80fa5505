use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{Map, Value};
use std::fmt;

use crate::errors::PlatformResult;
use crate::models::tool::ToolCall;

/// One incremental fragment of a streamed result
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Text(String),
    ToolCall(ToolCallDelta),
}

/// A fragment of a tool call; `index` identifies the call the fragment belongs to
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolCallDelta {
    pub index: usize,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: String,
}

pub type DeltaStream = BoxStream<'static, PlatformResult<Delta>>;

/// A streamed result
///
/// The stream is single pass: once [`StreamResult::take`] handed it out, later calls
/// return an empty stream. Dropping the stream before it ends closes the connection.
pub struct StreamResult {
    stream: Option<DeltaStream>,
}

impl StreamResult {
    pub fn new(stream: DeltaStream) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn take(&mut self) -> DeltaStream {
        self.stream
            .take()
            .unwrap_or_else(|| stream::empty().boxed())
    }

    pub fn is_consumed(&self) -> bool {
        self.stream.is_none()
    }

    /// Drain the stream and concatenate its text deltas
    pub async fn collect_text(&mut self) -> PlatformResult<String> {
        let mut stream = self.take();
        let mut text = String::new();
        while let Some(delta) = stream.next().await {
            if let Delta::Text(fragment) = delta? {
                text.push_str(&fragment);
            }
        }
        Ok(text)
    }
}

impl fmt::Debug for StreamResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResult")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Assembles streamed tool call fragments into complete calls
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: Vec<ToolCallDelta>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, delta: &ToolCallDelta) {
        match self.calls.iter_mut().find(|call| call.index == delta.index) {
            Some(call) => {
                if delta.id.is_some() {
                    call.id = delta.id.clone();
                }
                if delta.name.is_some() {
                    call.name = delta.name.clone();
                }
                call.arguments.push_str(&delta.arguments);
            }
            None => self.calls.push(delta.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// The completed calls in index order
    pub fn finish(mut self) -> PlatformResult<Vec<ToolCall>> {
        self.calls.sort_by_key(|call| call.index);
        self.calls
            .into_iter()
            .map(|call| -> PlatformResult<ToolCall> {
                let arguments = if call.arguments.trim().is_empty() {
                    Map::new()
                } else {
                    match serde_json::from_str::<Value>(&call.arguments)? {
                        Value::Object(map) => map,
                        _ => Map::new(),
                    }
                };
                Ok(ToolCall::new(call.id.unwrap_or_default(), call.name.unwrap_or_default())
                    .with_arguments(arguments))
            })
            .collect()
    }
}
