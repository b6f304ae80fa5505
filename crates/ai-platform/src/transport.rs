//! The boundary between model clients and the HTTP stack
//!
//! Model clients only ever talk to a [`Transport`]. Connection pooling, TLS, retries and
//! timeouts are concerns of the implementation behind it.
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use eventsource_stream::{Event, Eventsource};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::errors::{PlatformError, PlatformResult};

pub mod event_source;
pub mod http;
#[cfg(test)]
pub mod mock;

pub use event_source::EventSourceTransport;
pub use http::ReqwestTransport;
pub use reqwest::Method;

pub type ByteStream = BoxStream<'static, PlatformResult<Bytes>>;
pub type EventStream = BoxStream<'static, PlatformResult<Event>>;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Text(String),
}

/// Headers and body of an outgoing request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn text<S: Into<String>>(mut self, body: S) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }

    /// Look up a header, ignoring the case of its name
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the body asks the provider for a server-sent event stream
    pub fn is_stream_request(&self) -> bool {
        matches!(
            &self.body,
            Some(RequestBody::Json(body)) if body.get("stream") == Some(&Value::Bool(true))
        )
    }
}

enum ResponseBody {
    Complete(Bytes),
    Streaming(ByteStream),
}

/// A response as handed back by a transport
///
/// The body is read lazily. Dropping the response, or any stream derived from it,
/// releases the underlying connection.
pub struct TransportResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: ResponseBody,
}

impl TransportResponse {
    pub fn new<B: Into<Bytes>>(status: u16, body: B) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: ResponseBody::Complete(body.into()),
        }
    }

    pub fn from_json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string()).with_header("content-type", "application/json")
    }

    pub fn from_stream(status: u16, body: ByteStream) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: ResponseBody::Streaming(body),
        }
    }

    pub fn with_header<K: AsRef<str>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub async fn bytes(self) -> PlatformResult<Bytes> {
        match self.body {
            ResponseBody::Complete(bytes) => Ok(bytes),
            ResponseBody::Streaming(mut stream) => {
                let mut buffer = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buffer.extend_from_slice(&chunk?);
                }
                Ok(buffer.freeze())
            }
        }
    }

    pub async fn text(self) -> PlatformResult<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json(self) -> PlatformResult<Value> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn into_byte_stream(self) -> ByteStream {
        match self.body {
            ResponseBody::Complete(bytes) => stream::once(async move { Ok(bytes) }).boxed(),
            ResponseBody::Streaming(stream) => stream,
        }
    }

    /// Parse the body as a server-sent event stream
    pub fn events(self) -> EventStream {
        self.into_byte_stream()
            .eventsource()
            .map(|event| {
                event.map_err(|e| PlatformError::Transport(format!("SSE parsing error: {e}")))
            })
            .boxed()
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Sends requests on behalf of model clients
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> PlatformResult<TransportResponse>;

    /// Whether this transport already negotiates server-sent event streams
    fn supports_event_source(&self) -> bool {
        false
    }
}
