//! Conversion between the content model and provider wire formats
//!
//! A [`Contract`] is an ordered chain of converters. For every piece of data the first
//! converter that claims it does the work, which lets a provider override single shapes
//! and fall back to the OpenAI shaped defaults for everything else.
use serde_json::{json, Value};
use std::fmt;

use crate::errors::{PlatformError, PlatformResult};
use crate::model::Model;
use crate::models::content::Content;
use crate::models::tool::Tool;
use crate::platform::{Input, Payload};

pub mod content;
pub mod message;
pub mod normalizer;
pub mod tool;

pub use normalizer::{ContractData, DataKind, Denormalizer, Normalizer};
pub use tool::is_valid_function_name;

pub struct Contract {
    normalizers: Vec<Box<dyn Normalizer>>,
    denormalizers: Vec<Box<dyn Denormalizer>>,
}

impl Contract {
    /// Build a contract where the given converters take priority over the generic ones
    pub fn create(
        normalizers: Vec<Box<dyn Normalizer>>,
        denormalizers: Vec<Box<dyn Denormalizer>>,
    ) -> Self {
        let mut contract = Self {
            normalizers,
            denormalizers,
        };
        contract.normalizers.extend(Self::generic_normalizers());
        contract.denormalizers.extend(Self::generic_denormalizers());
        contract
    }

    fn generic_normalizers() -> Vec<Box<dyn Normalizer>> {
        vec![
            Box::new(message::ConversationNormalizer),
            Box::new(message::MessageNormalizer),
            Box::new(content::TextNormalizer),
            Box::new(content::ImageUrlNormalizer),
            Box::new(content::ImageNormalizer),
            Box::new(content::AudioNormalizer),
            Box::new(content::FileNormalizer),
            Box::new(content::ToolCallNormalizer),
            Box::new(content::ToolCallResultNormalizer),
            Box::new(tool::ToolNormalizer),
        ]
    }

    fn generic_denormalizers() -> Vec<Box<dyn Denormalizer>> {
        vec![
            Box::new(content::TextNormalizer),
            Box::new(content::ImageUrlNormalizer),
            Box::new(content::ImageNormalizer),
            Box::new(content::AudioNormalizer),
            Box::new(content::FileNormalizer),
            Box::new(content::ToolCallNormalizer),
            Box::new(content::ToolCallResultNormalizer),
        ]
    }

    pub fn normalize(&self, data: ContractData<'_>) -> PlatformResult<Value> {
        let normalizer = self
            .normalizers
            .iter()
            .find(|normalizer| normalizer.supports_normalization(&data))
            .ok_or_else(|| {
                PlatformError::Normalization(format!("no normalizer supports {}", data.kind()))
            })?;
        normalizer.normalize(data, self)
    }

    pub fn denormalize(&self, data: &Value, target: DataKind) -> PlatformResult<Content> {
        let denormalizer = self
            .denormalizers
            .iter()
            .find(|denormalizer| denormalizer.supports_denormalization(data, target))
            .ok_or_else(|| {
                PlatformError::Normalization(format!("no denormalizer supports {target}"))
            })?;
        denormalizer.denormalize(data, target)
    }

    /// Turn caller input into the payload a model client sends
    ///
    /// Conversations are normalized and tagged with the model name, text and raw JSON
    /// input pass through untouched.
    pub fn create_request_payload(&self, model: &Model, input: &Input) -> PlatformResult<Payload> {
        match input {
            Input::Conversation(conversation) => {
                let Value::Object(mut payload) =
                    self.normalize(ContractData::Conversation(conversation))?
                else {
                    return Err(PlatformError::Normalization(
                        "a conversation must normalize to a JSON object".to_string(),
                    ));
                };
                payload
                    .entry("model")
                    .or_insert_with(|| json!(model.name()));
                Ok(Payload::Json(payload))
            }
            Input::Text(text) => Ok(Payload::Text(text.clone())),
            Input::Json(payload) => Ok(Payload::Json(payload.clone())),
        }
    }

    /// Normalize tool definitions into the value of the `tools` option
    pub fn create_tool_option(&self, tools: &[Tool]) -> PlatformResult<Value> {
        tool::validate_tools(tools)?;
        let tools = tools
            .iter()
            .map(|tool| self.normalize(ContractData::Tool(tool)))
            .collect::<PlatformResult<Vec<_>>>()?;
        Ok(Value::Array(tools))
    }
}

impl Default for Contract {
    fn default() -> Self {
        Self::create(Vec::new(), Vec::new())
    }
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("normalizers", &self.normalizers.len())
            .field("denormalizers", &self.denormalizers.len())
            .finish()
    }
}
