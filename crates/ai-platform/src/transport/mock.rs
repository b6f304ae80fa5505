use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Mutex;

use super::{Method, RequestOptions, Transport, TransportResponse};
use crate::errors::PlatformResult;

/// A request seen by the mock transport
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub url: String,
    pub options: RequestOptions,
}

type Responder = Box<dyn Fn(&CapturedRequest) -> TransportResponse + Send + Sync>;

/// A transport that records every request and answers from a closure
pub struct MockTransport {
    responder: Responder,
    requests: Mutex<Vec<CapturedRequest>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CapturedRequest) -> TransportResponse + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `body` and status 200
    pub fn json(body: Value) -> Self {
        Self::new(move |_| TransportResponse::from_json(200, &body))
    }

    /// Always answer with a streamed body made of `chunks`
    pub fn sse(chunks: Vec<&'static str>) -> Self {
        Self::new(move |_| {
            let body = stream::iter(
                chunks
                    .clone()
                    .into_iter()
                    .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes()))),
            )
            .boxed();
            TransportResponse::from_stream(200, body)
                .with_header("content-type", "text/event-stream")
        })
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> PlatformResult<TransportResponse> {
        let request = CapturedRequest {
            method,
            url: url.to_string(),
            options,
        };
        let response = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}
