use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;

use super::contract::parse_tool_use;
use super::{API_VERSION, BASE_URL};
use crate::errors::{PlatformError, PlatformResult};
use crate::model::{Capability, Model, ModelFamily, Options};
use crate::platform::{join_url, merge_options, ModelClient, Payload, ResultConverter};
use crate::providers::utils::{
    check_error_payload, ensure_success, error_from_payload, validate_credentials,
};
use crate::result::{
    Delta, Metadata, ModelResult, StreamResult, ToolCallDelta, ToolCallsResult, Usage,
};
use crate::transport::{
    EventSourceTransport, EventStream, Method, RequestBody, RequestOptions, Transport,
    TransportResponse,
};

pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Descriptors for Claude models
pub struct Claude;

impl Claude {
    pub const HAIKU_3: &'static str = "claude-3-haiku-20240307";
    pub const HAIKU_35: &'static str = "claude-3-5-haiku-latest";
    pub const SONNET_35: &'static str = "claude-3-5-sonnet-latest";
    pub const SONNET_37: &'static str = "claude-3-7-sonnet-latest";
    pub const OPUS_3: &'static str = "claude-3-opus-20240229";

    pub fn default_model() -> PlatformResult<Model> {
        Self::model(Self::SONNET_37, Options::new())
    }

    pub fn model(name: &str, options: Options) -> PlatformResult<Model> {
        Ok(Model::new(name, ModelFamily::Claude)?
            .with_capabilities([
                Capability::InputMessages,
                Capability::InputImage,
                Capability::InputPdf,
                Capability::OutputText,
                Capability::OutputStreaming,
                Capability::ToolCalling,
            ])
            .with_options(options))
    }
}

pub struct ClaudeModelClient {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
    version: String,
}

impl ClaudeModelClient {
    pub fn new(transport: Arc<dyn Transport>, api_key: &str) -> PlatformResult<Self> {
        Self::with_base_url(transport, api_key, BASE_URL)
    }

    pub fn with_base_url(
        transport: Arc<dyn Transport>,
        api_key: &str,
        base_url: &str,
    ) -> PlatformResult<Self> {
        validate_credentials(api_key, base_url)?;
        Ok(Self {
            transport: EventSourceTransport::wrap(transport),
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            version: API_VERSION.to_string(),
        })
    }

    /// Pin a different `anthropic-version` header
    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = version.into();
        self
    }
}

#[async_trait]
impl ModelClient for ClaudeModelClient {
    fn supports(&self, model: &Model) -> bool {
        model.family() == &ModelFamily::Claude
    }

    async fn request(
        &self,
        _model: &Model,
        payload: Payload,
        options: &Options,
    ) -> PlatformResult<TransportResponse> {
        let mut body = merge_options(payload, options);
        if let RequestBody::Json(Value::Object(body)) = &mut body {
            body.entry("max_tokens")
                .or_insert_with(|| json!(DEFAULT_MAX_TOKENS));
        }

        let options = RequestOptions::new()
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.version);
        let options = RequestOptions {
            body: Some(body),
            ..options
        };

        let url = join_url(&self.base_url, "messages");
        self.transport.send(Method::POST, &url, options).await
    }
}

pub struct ClaudeResultConverter;

#[async_trait]
impl ResultConverter for ClaudeResultConverter {
    fn supports(&self, model: &Model) -> bool {
        model.family() == &ModelFamily::Claude
    }

    async fn convert(
        &self,
        response: TransportResponse,
        options: &Options,
    ) -> PlatformResult<ModelResult> {
        let response = ensure_success(response).await?;
        if options.get("stream") == Some(&json!(true)) {
            return Ok(ModelResult::Stream(StreamResult::new(
                stream_deltas(response.events()).boxed(),
            )));
        }

        let status = response.status();
        let data = response.json().await?;
        check_error_payload(status, &data)?;

        let blocks = data
            .get("content")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let usage = Usage::from_response(&data, "input_tokens", "output_tokens");
        let metadata = Metadata::from_raw(data, usage);

        let tool_calls = blocks
            .iter()
            .filter(|block| block["type"] == "tool_use")
            .map(parse_tool_use)
            .collect::<PlatformResult<Vec<_>>>()?;
        if !tool_calls.is_empty() {
            return Ok(ModelResult::ToolCalls(ToolCallsResult {
                tool_calls,
                metadata,
            }));
        }

        let text = blocks
            .iter()
            .filter(|block| block["type"] == "text")
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("");
        Ok(ModelResult::text(text, metadata))
    }
}

/// Message stream events as deltas, up to `message_stop`
fn stream_deltas(mut events: EventStream) -> impl Stream<Item = PlatformResult<Delta>> + Send {
    try_stream! {
        let mut finished = false;
        while let Some(event) = events.next().await {
            let event = event?;
            if event.data.trim().is_empty() {
                continue;
            }
            let data: Value = serde_json::from_str(&event.data)?;
            let index = data.get("index").and_then(Value::as_u64).unwrap_or(0) as usize;

            match data["type"].as_str().unwrap_or(event.event.as_str()) {
                "message_stop" => {
                    finished = true;
                    break;
                }
                "error" => {
                    Err::<(), _>(error_from_payload(200, &data["error"]))?;
                }
                "content_block_start" if data["content_block"]["type"] == "tool_use" => {
                    yield Delta::ToolCall(ToolCallDelta {
                        index,
                        id: data["content_block"]["id"].as_str().map(str::to_string),
                        name: data["content_block"]["name"].as_str().map(str::to_string),
                        arguments: String::new(),
                    });
                }
                "content_block_delta" => match data["delta"]["type"].as_str() {
                    Some("text_delta") => {
                        let text = data["delta"]["text"].as_str().unwrap_or_default();
                        if !text.is_empty() {
                            yield Delta::Text(text.to_string());
                        }
                    }
                    Some("input_json_delta") => {
                        yield Delta::ToolCall(ToolCallDelta {
                            index,
                            arguments: data["delta"]["partial_json"]
                                .as_str()
                                .unwrap_or_default()
                                .to_string(),
                            ..Default::default()
                        });
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        if !finished {
            Err::<(), _>(PlatformError::Transport(
                "stream ended before message_stop".to_string(),
            ))?;
        }
    }
}
