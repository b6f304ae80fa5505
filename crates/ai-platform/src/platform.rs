//! Dispatching model invocations to the client that serves the model
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::debug;

use crate::contract::Contract;
use crate::errors::{PlatformError, PlatformResult};
use crate::model::{Capability, Model, Options};
use crate::models::message::Conversation;
use crate::models::tool::Tool;
use crate::result::ModelResult;
use crate::transport::{RequestBody, TransportResponse};

/// What a caller hands to [`Platform::invoke`]
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Conversation(Conversation),
    /// Plain text, e.g. an embedding input or an image prompt
    Text(String),
    /// A payload already in the provider's wire format
    Json(Map<String, Value>),
}

impl From<Conversation> for Input {
    fn from(conversation: Conversation) -> Self {
        Input::Conversation(conversation)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Text(text.to_string())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

impl From<Map<String, Value>> for Input {
    fn from(payload: Map<String, Value>) -> Self {
        Input::Json(payload)
    }
}

/// The normalized request body, before options are applied
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Map<String, Value>),
    Text(String),
}

/// Apply invocation options on top of a payload
///
/// Options replace payload keys of the same name without merging nested values.
/// A text payload is sent as is.
pub fn merge_options(payload: Payload, options: &Options) -> RequestBody {
    match payload {
        Payload::Json(mut body) => {
            for (key, value) in options {
                body.insert(key.clone(), value.clone());
            }
            RequestBody::Json(Value::Object(body))
        }
        Payload::Text(text) => RequestBody::Text(text),
    }
}

/// Strip trailing slashes so paths can be appended to a base url
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Sends requests for the models of one provider
#[async_trait]
pub trait ModelClient: Send + Sync {
    fn supports(&self, model: &Model) -> bool;

    async fn request(
        &self,
        model: &Model,
        payload: Payload,
        options: &Options,
    ) -> PlatformResult<TransportResponse>;
}

/// Turns a raw provider response into a [`ModelResult`]
#[async_trait]
pub trait ResultConverter: Send + Sync {
    fn supports(&self, model: &Model) -> bool;

    async fn convert(
        &self,
        response: TransportResponse,
        options: &Options,
    ) -> PlatformResult<ModelResult>;
}

/// The entry point for invoking models
///
/// Clients and converters are consulted in registration order and the first one that
/// supports the model handles the invocation.
pub struct Platform {
    clients: Vec<Box<dyn ModelClient>>,
    converters: Vec<Box<dyn ResultConverter>>,
    contract: Contract,
}

impl Platform {
    pub fn new(
        clients: Vec<Box<dyn ModelClient>>,
        converters: Vec<Box<dyn ResultConverter>>,
        contract: Contract,
    ) -> Self {
        Self {
            clients,
            converters,
            contract,
        }
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Whether some client and some converter are registered for `model`
    pub fn supports(&self, model: &Model) -> bool {
        self.clients.iter().any(|client| client.supports(model))
            && self
                .converters
                .iter()
                .any(|converter| converter.supports(model))
    }

    pub async fn invoke<I: Into<Input>>(
        &self,
        model: &Model,
        input: I,
        options: Options,
    ) -> PlatformResult<ModelResult> {
        self.dispatch(model, input.into(), options).await
    }

    /// Invoke a model offering it the given tools
    pub async fn invoke_with_tools<I: Into<Input>>(
        &self,
        model: &Model,
        input: I,
        tools: &[Tool],
        mut options: Options,
    ) -> PlatformResult<ModelResult> {
        if !tools.is_empty() {
            model.require(Capability::ToolCalling)?;
            options.insert("tools".to_string(), self.contract.create_tool_option(tools)?);
        }
        self.dispatch(model, input.into(), options).await
    }

    async fn dispatch(
        &self,
        model: &Model,
        input: Input,
        options: Options,
    ) -> PlatformResult<ModelResult> {
        let unsupported = || PlatformError::UnsupportedModel(model.name().to_string());
        let client = self
            .clients
            .iter()
            .find(|client| client.supports(model))
            .ok_or_else(unsupported)?;
        let converter = self
            .converters
            .iter()
            .find(|converter| converter.supports(model))
            .ok_or_else(unsupported)?;

        let mut merged = model.options().clone();
        merged.extend(options);
        if merged.get("stream") == Some(&json!(true)) {
            model.require(Capability::OutputStreaming)?;
        }

        let payload = self.contract.create_request_payload(model, &input)?;
        debug!(model = model.name(), family = %model.family(), "invoking model");

        let response = client.request(model, payload, &merged).await?;
        debug!(model = model.name(), status = response.status(), "model responded");

        converter.convert(response, &merged).await
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("clients", &self.clients.len())
            .field("converters", &self.converters.len())
            .field("contract", &self.contract)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelFamily;
    use crate::result::Metadata;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_test::traced_test;

    struct CountingClient {
        family: ModelFamily,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModelClient for CountingClient {
        fn supports(&self, model: &Model) -> bool {
            model.family() == &self.family
        }

        async fn request(
            &self,
            _model: &Model,
            payload: Payload,
            options: &Options,
        ) -> PlatformResult<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = match merge_options(payload, options) {
                RequestBody::Json(body) => body,
                RequestBody::Text(text) => json!(text),
            };
            Ok(TransportResponse::from_json(200, &body))
        }
    }

    /// Echoes the request body back as text
    struct EchoConverter;

    #[async_trait]
    impl ResultConverter for EchoConverter {
        fn supports(&self, _model: &Model) -> bool {
            true
        }

        async fn convert(
            &self,
            response: TransportResponse,
            _options: &Options,
        ) -> PlatformResult<ModelResult> {
            Ok(ModelResult::text(response.text().await?, Metadata::default()))
        }
    }

    fn platform(families: &[ModelFamily]) -> (Platform, Vec<Arc<AtomicUsize>>) {
        let counters: Vec<_> = families.iter().map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let clients = families
            .iter()
            .zip(&counters)
            .map(|(family, calls)| {
                Box::new(CountingClient {
                    family: family.clone(),
                    calls: calls.clone(),
                }) as Box<dyn ModelClient>
            })
            .collect();
        let platform = Platform::new(clients, vec![Box::new(EchoConverter)], Contract::default());
        (platform, counters)
    }

    #[tokio::test]
    async fn test_first_supporting_client_wins() -> PlatformResult<()> {
        let (platform, counters) =
            platform(&[ModelFamily::Claude, ModelFamily::Gpt, ModelFamily::Gpt]);
        let model = Model::new("gpt-4o", ModelFamily::Gpt)?;

        platform.invoke(&model, "Hello", Options::new()).await?;

        let calls: Vec<_> = counters.iter().map(|c| c.load(Ordering::SeqCst)).collect();
        assert_eq!(calls, vec![0, 1, 0]);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dispatch_is_logged() -> PlatformResult<()> {
        let (platform, _) = platform(&[ModelFamily::Gpt]);
        let model = Model::new("gpt-4o", ModelFamily::Gpt)?;

        platform.invoke(&model, "Hello", Options::new()).await?;

        assert!(logs_contain("invoking model"));
        assert!(logs_contain("gpt-4o"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unsupported_model_runs_no_client() {
        let (platform, counters) = platform(&[ModelFamily::Claude]);
        let model = Model::new("gpt-4o", ModelFamily::Gpt).unwrap();

        let err = platform
            .invoke(&model, "Hello", Options::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PlatformError::UnsupportedModel(ref name) if name == "gpt-4o"));
        assert_eq!(counters[0].load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_call_options_override_model_options() -> PlatformResult<()> {
        let (platform, _) = platform(&[ModelFamily::Gpt]);
        let mut defaults = Options::new();
        defaults.insert("temperature".to_string(), json!(1.0));
        defaults.insert("max_tokens".to_string(), json!(100));
        let model = Model::new("gpt-4o", ModelFamily::Gpt)?.with_options(defaults);

        let mut options = Options::new();
        options.insert("temperature".to_string(), json!(0.0));
        let mut payload = Map::new();
        payload.insert("model".to_string(), json!("gpt-4o"));

        let result = platform.invoke(&model, payload, options).await?;
        let body: Value = serde_json::from_str(result.as_text()?)?;

        assert_eq!(
            body,
            json!({"model": "gpt-4o", "temperature": 0.0, "max_tokens": 100})
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_tools_require_tool_calling() {
        let (platform, counters) = platform(&[ModelFamily::Gpt]);
        let model = Model::new("gpt-3.5-turbo-instruct", ModelFamily::Gpt).unwrap();
        let tool = Tool::new(
            crate::models::tool::ExecutionReference::new("clock"),
            "now",
            "Current time",
            None,
        );

        let err = platform
            .invoke_with_tools(&model, "What time is it?", &[tool], Options::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PlatformError::MissingModelSupport { .. }));
        assert_eq!(counters[0].load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_merge_options_is_shallow() {
        let mut payload = Map::new();
        payload.insert("a".to_string(), json!({"x": 1, "y": 2}));
        payload.insert("b".to_string(), json!(1));
        let mut options = Options::new();
        options.insert("a".to_string(), json!({"x": 3}));

        let body = merge_options(Payload::Json(payload), &options);
        assert_eq!(body, RequestBody::Json(json!({"a": {"x": 3}, "b": 1})));

        let body = merge_options(Payload::Text("raw".to_string()), &options);
        assert_eq!(body, RequestBody::Text("raw".to_string()));
    }

    #[test]
    fn test_join_url_strips_trailing_slashes() {
        assert_eq!(
            join_url("https://albert.example.com/v1//", "/chat/completions"),
            "https://albert.example.com/v1/chat/completions"
        );
    }
}
