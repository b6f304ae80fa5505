use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{Method, RequestOptions, Transport, TransportResponse};
use crate::errors::PlatformResult;

/// Decorates a transport so that streaming requests negotiate server-sent events
///
/// Responses pass through untouched; [`TransportResponse::events`] turns their body
/// into the event stream.
pub struct EventSourceTransport {
    inner: Arc<dyn Transport>,
}

impl EventSourceTransport {
    /// Wrap `transport` unless it already speaks server-sent events
    pub fn wrap(transport: Arc<dyn Transport>) -> Arc<dyn Transport> {
        if transport.supports_event_source() {
            transport
        } else {
            Arc::new(Self { inner: transport })
        }
    }
}

#[async_trait]
impl Transport for EventSourceTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        mut options: RequestOptions,
    ) -> PlatformResult<TransportResponse> {
        if options.is_stream_request() {
            if options.header_value("accept").is_none() {
                options = options.header("Accept", "text/event-stream");
            }
            if options.header_value("cache-control").is_none() {
                options = options.header("Cache-Control", "no-cache");
            }
            debug!(url, "opening event stream");
        }
        self.inner.send(method, url, options).await
    }

    fn supports_event_source(&self) -> bool {
        true
    }
}
