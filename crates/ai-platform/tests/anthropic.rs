use ai_platform::model::Options;
use ai_platform::models::message::{Conversation, Message};
use ai_platform::models::tool::{ExecutionReference, Tool};
use ai_platform::platform::Platform;
use ai_platform::providers::anthropic::{self, Claude};
use ai_platform::result::{Delta, ToolCallAccumulator};
use ai_platform::transport::ReqwestTransport;
use anyhow::Result;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn platform_for(server: &MockServer) -> Result<Platform> {
    let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(5))?);
    Ok(anthropic::create_platform_with_base_url(
        "sk-ant-test",
        &format!("{}/v1", server.uri()),
        transport,
    )?)
}

fn weather_tool() -> Tool {
    Tool::new(
        ExecutionReference::new("weather"),
        "get_weather",
        "Current weather for a city",
        Some(json!({
            "type": "object",
            "properties": {"city": {"type": "string"}},
            "required": ["city"]
        })),
    )
}

#[tokio::test]
async fn test_messages_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", anthropic::API_VERSION))
        .and(body_partial_json(json!({
            "model": Claude::HAIKU_35,
            "system": "Be brief.",
            "max_tokens": 1000,
            "messages": [{"role": "user", "content": "Hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Hi there."}],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let platform = platform_for(&server)?;
    let conversation = Conversation::default()
        .with(Message::system("Be brief."))
        .with(Message::user().with_text("Hello"));
    let model = Claude::model(Claude::HAIKU_35, Options::new())?;

    let result = platform.invoke(&model, conversation, Options::new()).await?;
    assert_eq!(result.as_text()?, "Hi there.");
    Ok(())
}

#[tokio::test]
async fn test_tool_use_response() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "tools": [{
                "name": "get_weather",
                "description": "Current weather for a city",
                "input_schema": {
                    "type": "object",
                    "properties": {"city": {"type": "string"}},
                    "required": ["city"]
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "Oslo"}}
            ],
            "usage": {"input_tokens": 30, "output_tokens": 12}
        })))
        .mount(&server)
        .await;

    let platform = platform_for(&server)?;
    let result = platform
        .invoke_with_tools(
            &Claude::default_model()?,
            Conversation::default().with(Message::user().with_text("Weather in Oslo?")),
            &[weather_tool()],
            Options::new(),
        )
        .await?;

    let calls = result.as_tool_calls()?;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "toolu_1");
    assert_eq!(calls[0].arguments["city"], "Oslo");
    Ok(())
}

#[tokio::test]
async fn test_streamed_tool_use() -> Result<()> {
    let server = MockServer::start().await;
    let body = concat!(
        "event: content_block_start\n",
        "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"tool_use\",\"id\":\"toolu_1\",\"name\":\"get_weather\",\"input\":{}}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"city\\\": \"}}\n\n",
        "event: content_block_delta\n",
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"\\\"Oslo\\\"}\"}}\n\n",
        "event: message_stop\n",
        "data: {\"type\":\"message_stop\"}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let platform = platform_for(&server)?;
    let mut options = Options::new();
    options.insert("stream".to_string(), json!(true));
    let mut result = platform
        .invoke_with_tools(
            &Claude::default_model()?,
            Conversation::default().with(Message::user().with_text("Weather in Oslo?")),
            &[weather_tool()],
            options,
        )
        .await?;

    let mut stream = result.as_stream()?;
    let mut accumulator = ToolCallAccumulator::new();
    while let Some(delta) = stream.next().await {
        if let Delta::ToolCall(delta) = delta? {
            accumulator.push(&delta);
        }
    }
    let calls = accumulator.finish()?;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "get_weather");
    assert_eq!(calls[0].arguments["city"], "Oslo");
    Ok(())
}
