//! Anthropic messages API shapes, registered ahead of the generic converters
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::contract::normalizer::{kinds, string_field, unexpected};
use crate::contract::{Contract, ContractData, DataKind, Denormalizer, Normalizer};
use crate::errors::{PlatformError, PlatformResult};
use crate::models::content::{Content, File, Image, ImageUrl};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::ToolCall;

/// The contract for Claude models
pub fn contract() -> Contract {
    Contract::create(
        vec![
            Box::new(ConversationNormalizer),
            Box::new(MessageNormalizer),
            Box::new(ImageUrlNormalizer),
            Box::new(ImageNormalizer),
            Box::new(FileNormalizer),
            Box::new(ToolCallNormalizer),
            Box::new(ToolNormalizer),
        ],
        vec![
            Box::new(ImageUrlNormalizer),
            Box::new(ImageNormalizer),
            Box::new(FileNormalizer),
            Box::new(ToolCallNormalizer),
        ],
    )
}

fn content<'a>(data: &ContractData<'a>) -> Option<&'a Content> {
    match data {
        ContractData::Content(content) => Some(content),
        _ => None,
    }
}

fn source_type(data: &Value) -> Option<&str> {
    data.pointer("/source/type").and_then(Value::as_str)
}

/// Lifts system messages into the top level `system` prompt
pub struct ConversationNormalizer;

impl Normalizer for ConversationNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::Conversation])
    }

    fn normalize(&self, data: ContractData<'_>, contract: &Contract) -> PlatformResult<Value> {
        let ContractData::Conversation(conversation) = data else {
            return Err(unexpected("anthropic ConversationNormalizer", data.kind()));
        };

        let mut messages: Vec<Value> = Vec::new();
        for message in conversation.without_system_messages() {
            let normalized = contract.normalize(ContractData::Message(message))?;

            // Results of parallel tool calls belong in a single user turn
            if message.role() == Role::Tool {
                if let Some(previous) = messages.last_mut() {
                    if is_tool_result_turn(previous) {
                        if let (Some(blocks), Some(new_blocks)) = (
                            previous["content"].as_array_mut(),
                            normalized["content"].as_array(),
                        ) {
                            blocks.extend(new_blocks.iter().cloned());
                            continue;
                        }
                    }
                }
            }
            messages.push(normalized);
        }

        let system = conversation
            .messages()
            .iter()
            .filter(|message| message.role() == Role::System)
            .map(Message::text)
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut payload = json!({ "messages": messages });
        if !system.is_empty() {
            payload["system"] = json!(system);
        }
        Ok(payload)
    }
}

fn is_tool_result_turn(message: &Value) -> bool {
    message["role"] == "user"
        && message["content"]
            .as_array()
            .is_some_and(|blocks| blocks.iter().all(|block| block["type"] == "tool_result"))
}

pub struct MessageNormalizer;

impl MessageNormalizer {
    fn blocks(message: &Message, contract: &Contract) -> PlatformResult<Vec<Value>> {
        message
            .content()
            .iter()
            .filter(|content| !matches!(content, Content::Text(text) if text.text.is_empty()))
            .map(|content| contract.normalize(ContractData::Content(content)))
            .collect()
    }
}

impl Normalizer for MessageNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::Message])
    }

    fn normalize(&self, data: ContractData<'_>, contract: &Contract) -> PlatformResult<Value> {
        let ContractData::Message(message) = data else {
            return Err(unexpected("anthropic MessageNormalizer", data.kind()));
        };

        match message.role() {
            Role::System => Err(PlatformError::Normalization(
                "system messages are sent as the system prompt".to_string(),
            )),
            Role::User => {
                if let [Content::Text(text)] = message.content() {
                    return Ok(json!({"role": "user", "content": text.text}));
                }
                Ok(json!({"role": "user", "content": Self::blocks(message, contract)?}))
            }
            Role::Assistant => {
                Ok(json!({"role": "assistant", "content": Self::blocks(message, contract)?}))
            }
            Role::Tool => {
                let result = message.tool_call_result().ok_or_else(|| {
                    PlatformError::Normalization(
                        "tool message without a tool call result".to_string(),
                    )
                })?;
                Ok(json!({
                    "role": "user",
                    "content": [{
                        "type": "tool_result",
                        "tool_use_id": result.tool_call.id,
                        "content": result.result,
                    }]
                }))
            }
        }
    }
}

pub struct ImageUrlNormalizer;

impl Normalizer for ImageUrlNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::ImageUrl])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::ImageUrl(image)) => Ok(json!({
                "type": "image",
                "source": {"type": "url", "url": image.url()}
            })),
            _ => Err(unexpected("anthropic ImageUrlNormalizer", data.kind())),
        }
    }
}

impl Denormalizer for ImageUrlNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::ImageUrl && data["type"] == "image" && source_type(data) == Some("url")
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        Ok(Content::ImageUrl(ImageUrl::new(string_field(
            data,
            "/source/url",
        )?)?))
    }
}

pub struct ImageNormalizer;

impl Normalizer for ImageNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::Image])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::Image(image)) => Ok(json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": image.mime_type,
                    "data": image.data,
                }
            })),
            _ => Err(unexpected("anthropic ImageNormalizer", data.kind())),
        }
    }
}

impl Denormalizer for ImageNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::Image && data["type"] == "image" && source_type(data) == Some("base64")
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        Ok(Content::Image(Image {
            data: string_field(data, "/source/data")?,
            mime_type: string_field(data, "/source/media_type")?,
        }))
    }
}

/// Documents such as PDFs
pub struct FileNormalizer;

impl Normalizer for FileNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::File])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::File(file)) => {
                let mut document = json!({
                    "type": "document",
                    "source": {
                        "type": "base64",
                        "media_type": file.mime_type,
                        "data": file.data,
                    }
                });
                if let Some(filename) = &file.filename {
                    document["title"] = json!(filename);
                }
                Ok(document)
            }
            _ => Err(unexpected("anthropic FileNormalizer", data.kind())),
        }
    }
}

impl Denormalizer for FileNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::File && data["type"] == "document"
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        let mut file = File {
            data: string_field(data, "/source/data")?,
            mime_type: string_field(data, "/source/media_type")?,
            filename: None,
        };
        if let Ok(title) = string_field(data, "/title") {
            file = file.with_filename(title);
        }
        Ok(Content::File(file))
    }
}

pub struct ToolCallNormalizer;

impl Normalizer for ToolCallNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::ToolCall])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::ToolCall(call)) => Ok(json!({
                "type": "tool_use",
                "id": call.id,
                "name": call.name,
                "input": call.arguments,
            })),
            _ => Err(unexpected("anthropic ToolCallNormalizer", data.kind())),
        }
    }
}

impl Denormalizer for ToolCallNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::ToolCall && data["type"] == "tool_use"
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        Ok(Content::tool_call(parse_tool_use(data)?))
    }
}

/// Read a `tool_use` content block
pub(crate) fn parse_tool_use(data: &Value) -> PlatformResult<ToolCall> {
    let call = ToolCall::new(string_field(data, "/id")?, string_field(data, "/name")?);
    Ok(match data.get("input") {
        Some(input) => call.with_argument_value(input.clone()),
        None => call,
    })
}

/// `{name, description, input_schema}`
pub struct ToolNormalizer;

impl Normalizer for ToolNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::Tool])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        let ContractData::Tool(tool) = data else {
            return Err(unexpected("anthropic ToolNormalizer", data.kind()));
        };

        Ok(json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": tool
                .parameters
                .clone()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        }))
    }
}
