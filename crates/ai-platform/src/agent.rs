use std::sync::Arc;
use tracing::debug;

use crate::errors::{PlatformError, PlatformResult};
use crate::model::{Capability, Model, Options};
use crate::models::message::{Conversation, Message};
use crate::models::tool::Tool;
use crate::platform::Platform;
use crate::result::ModelResult;
use crate::toolbox::Toolbox;

/// Agent drives a model through as many tool calls as it needs to answer
///
/// Streaming invocations are handed back as they are: tool calls inside a stream are
/// left to the caller.
pub struct Agent {
    platform: Arc<Platform>,
    model: Model,
    toolbox: Arc<dyn Toolbox>,
    max_rounds: usize,
}

impl Agent {
    pub const DEFAULT_MAX_ROUNDS: usize = 10;

    /// Create a new Agent, the model must be able to call tools if the toolbox has any
    pub fn new(
        platform: Arc<Platform>,
        model: Model,
        toolbox: Arc<dyn Toolbox>,
    ) -> PlatformResult<Self> {
        if !toolbox.tools().is_empty() {
            model.require(Capability::ToolCalling)?;
        }
        Ok(Self {
            platform,
            model,
            toolbox,
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
        })
    }

    /// Limit how many rounds of tool calls one invocation may take
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Invoke the model, running requested tools until it answers
    ///
    /// Every tool round is appended to `conversation`: the assistant message carrying
    /// the calls followed by one tool message per call, in the order requested. A round
    /// whose tools fail is not appended.
    pub async fn call(
        &self,
        conversation: &mut Conversation,
        options: Options,
    ) -> PlatformResult<ModelResult> {
        let tools: Vec<Tool> = self.toolbox.tools().values().cloned().collect();
        let mut rounds = 0;

        loop {
            let result = self
                .platform
                .invoke_with_tools(&self.model, conversation.clone(), &tools, options.clone())
                .await?;

            let ModelResult::ToolCalls(requested) = result else {
                return Ok(result);
            };
            if rounds == self.max_rounds {
                return Err(PlatformError::ToolLoopLimit(self.max_rounds));
            }
            rounds += 1;
            debug!(
                round = rounds,
                calls = requested.tool_calls.len(),
                "model requested tools"
            );

            // a failed call leaves the conversation untouched
            let mut request = Message::assistant();
            let mut answers = Vec::with_capacity(requested.tool_calls.len());
            for call in requested.tool_calls {
                let result = self.toolbox.execute(&call).await?;
                request = request.with_tool_call(call.clone())?;
                answers.push(Message::tool(call, result));
            }

            conversation.push(request);
            for answer in answers {
                conversation.push(answer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;
    use crate::models::tool::{ExecutionReference, ToolCall};
    use crate::providers::openai::{self, Gpt};
    use crate::toolbox::{LocalToolbox, TraceableToolbox};
    use crate::transport::mock::MockTransport;
    use crate::transport::{RequestBody, TransportResponse};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tool_call_response(id: &str) -> Value {
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": id,
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"city\": \"Paris\"}"}
                    }]
                }
            }]
        })
    }

    fn text_response(text: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": text}}]})
    }

    /// Answers with the given bodies in order, repeating the last one
    fn scripted(responses: Vec<Value>) -> Arc<MockTransport> {
        let turn = AtomicUsize::new(0);
        Arc::new(MockTransport::new(move |_| {
            let index = turn.fetch_add(1, Ordering::SeqCst).min(responses.len() - 1);
            TransportResponse::from_json(200, &responses[index])
        }))
    }

    fn weather_toolbox() -> Arc<TraceableToolbox<LocalToolbox>> {
        let toolbox = LocalToolbox::builder()
            .function("weather", |arguments| async move {
                let city = arguments
                    .get("city")
                    .and_then(Value::as_str)
                    .unwrap_or("nowhere")
                    .to_string();
                Ok::<_, anyhow::Error>(json!(format!("Sunny in {city}")))
            })
            .tool(Tool::new(
                ExecutionReference::new("weather"),
                "get_weather",
                "Current weather for a city",
                Some(json!({
                    "type": "object",
                    "properties": {"city": {"type": "string"}},
                    "required": ["city"]
                })),
            ))
            .build()
            .unwrap();
        Arc::new(TraceableToolbox::new(toolbox))
    }

    #[tokio::test]
    async fn test_tool_round_trip() -> PlatformResult<()> {
        let transport = scripted(vec![
            tool_call_response("call_1"),
            text_response("It is sunny in Paris."),
        ]);
        let platform = Arc::new(openai::create_platform("sk-test", transport.clone())?);
        let toolbox = weather_toolbox();
        let agent = Agent::new(platform, Gpt::default_model()?, toolbox.clone())?;

        let mut conversation =
            Conversation::default().with(Message::user().with_text("Weather in Paris?"));
        let result = agent.call(&mut conversation, Options::new()).await?;

        assert_eq!(result.as_text()?, "It is sunny in Paris.");
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages()[1].role(), Role::Assistant);
        assert_eq!(conversation.messages()[2].tool_call_id(), Some("call_1"));
        assert_eq!(
            conversation.messages()[2].tool_call_result().unwrap().result,
            "Sunny in Paris"
        );

        let traced = toolbox.calls();
        assert_eq!(traced.len(), 1);
        assert_eq!(traced[0].call.id, "call_1");

        // The second request carries the tool exchange and the tool definitions
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        let Some(RequestBody::Json(body)) = &requests[1].options.body else {
            panic!("expected a JSON body");
        };
        assert_eq!(body["tools"][0]["function"]["name"], "get_weather");
        assert_eq!(body["messages"][1]["tool_calls"][0]["id"], "call_1");
        assert_eq!(
            body["messages"][2],
            json!({"role": "tool", "content": "Sunny in Paris", "tool_call_id": "call_1"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_loop_is_bounded() -> PlatformResult<()> {
        let transport = scripted(vec![tool_call_response("call_1")]);
        let platform = Arc::new(openai::create_platform("sk-test", transport.clone())?);
        let agent = Agent::new(platform, Gpt::default_model()?, weather_toolbox())?
            .with_max_rounds(2);

        let mut conversation = Conversation::default().with(Message::user().with_text("Loop"));
        let err = agent
            .call(&mut conversation, Options::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PlatformError::ToolLoopLimit(2)));
        assert_eq!(transport.requests().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_tool_errors_abort_the_turn() -> PlatformResult<()> {
        let mut response = tool_call_response("call_1");
        response["choices"][0]["message"]["tool_calls"][0]["function"]["name"] = json!("get_time");
        let transport = scripted(vec![response, text_response("unreachable")]);
        let platform = Arc::new(openai::create_platform("sk-test", transport.clone())?);
        let agent = Agent::new(platform, Gpt::default_model()?, weather_toolbox())?;

        let mut conversation = Conversation::default().with(Message::user().with_text("Time?"));
        let err = agent
            .call(&mut conversation, Options::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PlatformError::ToolNotFound(ref name) if name == "get_time"));
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role(), Role::User);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_round_is_not_recorded() -> PlatformResult<()> {
        let mut response = tool_call_response("call_1");
        response["choices"][0]["message"]["tool_calls"]
            .as_array_mut()
            .unwrap()
            .push(json!({
                "id": "call_2",
                "type": "function",
                "function": {"name": "explode", "arguments": "{}"}
            }));
        let transport = scripted(vec![response]);
        let platform = Arc::new(openai::create_platform("sk-test", transport)?);
        let toolbox = LocalToolbox::builder()
            .function("weather", |_| async { Ok::<_, anyhow::Error>(json!("Sunny")) })
            .function("explode", |_| async { Err::<Value, _>(anyhow::anyhow!("fail")) })
            .tool(Tool::new(ExecutionReference::new("weather"), "get_weather", "Weather", None))
            .tool(Tool::new(ExecutionReference::new("explode"), "explode", "Fails", None))
            .build()?;
        let toolbox = Arc::new(TraceableToolbox::new(toolbox));
        let agent = Agent::new(platform, Gpt::default_model()?, toolbox.clone())?;

        let mut conversation = Conversation::default().with(Message::user().with_text("Go"));
        let err = agent
            .call(&mut conversation, Options::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PlatformError::ToolExecution { ref tool, .. } if tool == "explode"));
        // the first call ran but neither it nor the request were appended
        assert_eq!(toolbox.calls().len(), 1);
        assert_eq!(conversation.len(), 1);
        assert!(!conversation.messages()[0].has_tool_calls());
        Ok(())
    }

    #[test]
    fn test_model_must_support_tool_calling() -> PlatformResult<()> {
        let transport = scripted(vec![text_response("hi")]);
        let platform = Arc::new(openai::create_platform("sk-test", transport)?);
        let model = Gpt::model(Gpt::GPT_35_TURBO_INSTRUCT, Options::new())?;

        let err = Agent::new(platform, model, weather_toolbox()).err().unwrap();
        assert!(matches!(err, PlatformError::MissingModelSupport { .. }));
        Ok(())
    }

    #[test]
    fn test_tool_call_ids_are_kept() {
        let call = ToolCall::new("call_9", "get_weather");
        let message = Message::tool(call, "ok");
        assert_eq!(message.tool_call_id(), Some("call_9"));
    }
}
