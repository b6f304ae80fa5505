use async_stream::try_stream;
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{post, BASE_URL};
use crate::contract::content::parse_function_call;
use crate::contract::is_valid_function_name;
use crate::errors::{PlatformError, PlatformResult};
use crate::model::{Capability, Model, ModelFamily, Options};
use crate::models::tool::ToolCall;
use crate::platform::{join_url, merge_options, ModelClient, Payload, ResultConverter};
use crate::providers::utils::{
    check_error_payload, ensure_success, error_from_payload, validate_credentials,
};
use crate::result::{
    Delta, Metadata, ModelResult, StreamResult, StructuredResult, ToolCallDelta, ToolCallsResult,
    Usage,
};
use crate::transport::{EventSourceTransport, EventStream, Transport, TransportResponse};

/// Descriptors for OpenAI chat models
pub struct Gpt;

impl Gpt {
    pub const GPT_35_TURBO: &'static str = "gpt-3.5-turbo";
    pub const GPT_35_TURBO_INSTRUCT: &'static str = "gpt-3.5-turbo-instruct";
    pub const GPT_4: &'static str = "gpt-4";
    pub const GPT_4_TURBO: &'static str = "gpt-4-turbo";
    pub const GPT_4O: &'static str = "gpt-4o";
    pub const GPT_4O_MINI: &'static str = "gpt-4o-mini";
    pub const GPT_4O_AUDIO: &'static str = "gpt-4o-audio-preview";
    pub const O1_MINI: &'static str = "o1-mini";
    pub const O1_PREVIEW: &'static str = "o1-preview";
    pub const O3_MINI: &'static str = "o3-mini";

    const IMAGE_SUPPORTING: &'static [&'static str] = &[
        Self::GPT_4_TURBO,
        Self::GPT_4O,
        Self::GPT_4O_MINI,
        Self::O1_MINI,
        Self::O1_PREVIEW,
        Self::O3_MINI,
    ];

    const STRUCTURED_OUTPUT_SUPPORTING: &'static [&'static str] = &[
        Self::GPT_4O,
        Self::GPT_4O_MINI,
        Self::O3_MINI,
    ];

    pub fn default_model() -> PlatformResult<Model> {
        Self::model(Self::GPT_4O, Options::new())
    }

    pub fn model(name: &str, options: Options) -> PlatformResult<Model> {
        let mut capabilities = vec![
            Capability::InputMessages,
            Capability::OutputText,
            Capability::OutputStreaming,
        ];
        if name != Self::GPT_35_TURBO_INSTRUCT {
            capabilities.push(Capability::ToolCalling);
        }
        if name == Self::GPT_4O_AUDIO {
            capabilities.push(Capability::InputAudio);
        }
        if Self::IMAGE_SUPPORTING.contains(&name) {
            capabilities.push(Capability::InputImage);
            capabilities.push(Capability::InputPdf);
        }
        if Self::STRUCTURED_OUTPUT_SUPPORTING.contains(&name) {
            capabilities.push(Capability::OutputStructured);
        }

        Ok(Model::new(name, ModelFamily::Gpt)?
            .with_capabilities(capabilities)
            .with_options(options))
    }
}

/// Sends chat completion requests for GPT models
pub struct GptModelClient {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
}

impl GptModelClient {
    pub fn new(transport: Arc<dyn Transport>, api_key: &str) -> PlatformResult<Self> {
        Self::with_base_url(transport, api_key, BASE_URL)
    }

    /// A client for an OpenAI compatible endpoint
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
        })
    }
}

#[async_trait]
impl ModelClient for GptModelClient {
    fn supports(&self, model: &Model) -> bool {
        model.family() == &ModelFamily::Gpt
    }

    async fn request(
        &self,
        _model: &Model,
        payload: Payload,
        options: &Options,
    ) -> PlatformResult<TransportResponse> {
        let url = join_url(&self.base_url, "chat/completions");
        post(
            self.transport.as_ref(),
            &url,
            &self.api_key,
            merge_options(payload, options),
        )
        .await
    }
}

/// Converts chat completion responses, streamed or not
pub struct GptResultConverter;

#[async_trait]
impl ResultConverter for GptResultConverter {
    fn supports(&self, model: &Model) -> bool {
        model.family() == &ModelFamily::Gpt
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
        convert_completion(status, data, options)
    }
}

pub(crate) fn convert_completion(status: u16, data: Value, options: &Options) -> PlatformResult<ModelResult> {
    let message = data
        .pointer("/choices/0/message")
        .cloned()
        .ok_or_else(|| PlatformError::Provider {
            status,
            message: "Response does not contain any choices".to_string(),
        })?;
    let usage = Usage::from_response(&data, "prompt_tokens", "completion_tokens");
    let metadata = Metadata::from_raw(data, usage);

    if let Some(calls) = message.get("tool_calls").and_then(Value::as_array) {
        if !calls.is_empty() {
            let tool_calls = calls
                .iter()
                .map(|call| -> PlatformResult<ToolCall> {
                    let call = parse_function_call(call)?;
                    if !is_valid_function_name(&call.name) {
                        return Err(PlatformError::ToolNotFound(format!(
                            "The provided function name '{}' had invalid characters, it must match this regex [a-zA-Z0-9_-]+",
                            call.name
                        )));
                    }
                    Ok(call)
                })
                .collect::<PlatformResult<Vec<_>>>()?;
            return Ok(ModelResult::ToolCalls(ToolCallsResult {
                tool_calls,
                metadata,
            }));
        }
    }

    let text = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if wants_json_schema(options) {
        let value = serde_json::from_str(&text)?;
        return Ok(ModelResult::Structured(StructuredResult { value, metadata }));
    }

    Ok(ModelResult::text(text, metadata))
}

/// Whether the `response_format` option asks for schema conforming JSON
pub(crate) fn wants_json_schema(options: &Options) -> bool {
    options
        .get("response_format")
        .and_then(|format| format.get("type"))
        .and_then(Value::as_str)
        == Some("json_schema")
}

/// Chat completion chunks as deltas, up to the `[DONE]` marker
pub(crate) fn stream_deltas(
    mut events: EventStream,
) -> impl Stream<Item = PlatformResult<Delta>> + Send {
    try_stream! {
        let mut finished = false;
        while let Some(event) = events.next().await {
            let event = event?;
            if event.data.trim() == "[DONE]" {
                finished = true;
                break;
            }

            let chunk: Value = serde_json::from_str(&event.data)?;
            if let Some(error) = chunk.get("error") {
                Err::<(), _>(error_from_payload(200, error))?;
            }

            let delta = &chunk["choices"][0]["delta"];
            if let Some(text) = delta.get("content").and_then(Value::as_str) {
                if !text.is_empty() {
                    yield Delta::Text(text.to_string());
                }
            }

            if let Some(calls) = delta.get("tool_calls").and_then(Value::as_array) {
                for call in calls {
                    yield Delta::ToolCall(ToolCallDelta {
                        index: call.get("index").and_then(Value::as_u64).unwrap_or(0) as usize,
                        id: call.get("id").and_then(Value::as_str).map(str::to_string),
                        name: call
                            .pointer("/function/name")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        arguments: call
                            .pointer("/function/arguments")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                    });
                }
            }
        }
        if !finished {
            Err::<(), _>(PlatformError::Transport(
                "stream ended before [DONE]".to_string(),
            ))?;
        }
    }
}
