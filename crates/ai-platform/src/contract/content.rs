//! OpenAI shaped converters for message content
use serde_json::{json, Value};
use std::collections::HashMap;

use super::normalizer::{
    kinds, string_field, unexpected, ContractData, DataKind, Denormalizer, Normalizer,
};
use super::Contract;
use crate::errors::{PlatformError, PlatformResult};
use crate::models::content::{Content, File, Image, ImageUrl};
use crate::models::tool::ToolCall;

fn content<'a>(data: &ContractData<'a>) -> Option<&'a Content> {
    match data {
        ContractData::Content(content) => Some(content),
        _ => None,
    }
}

fn has_type(data: &Value, wire_type: &str) -> bool {
    data.get("type").and_then(Value::as_str) == Some(wire_type)
}

pub struct TextNormalizer;

impl Normalizer for TextNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::Text])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::Text(text)) => Ok(json!({"type": "text", "text": text.text})),
            _ => Err(unexpected("TextNormalizer", data.kind())),
        }
    }
}

impl Denormalizer for TextNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::Text && has_type(data, "text")
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        Ok(Content::text(string_field(data, "/text")?))
    }
}

pub struct ImageUrlNormalizer;

impl Normalizer for ImageUrlNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::ImageUrl])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::ImageUrl(image)) => {
                Ok(json!({"type": "image_url", "image_url": {"url": image.url()}}))
            }
            _ => Err(unexpected("ImageUrlNormalizer", data.kind())),
        }
    }
}

impl Denormalizer for ImageUrlNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::ImageUrl && has_type(data, "image_url")
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        let url = string_field(data, "/image_url/url")?;
        Ok(Content::ImageUrl(ImageUrl::new(url)?))
    }
}

/// Inline images travel as data urls inside an `image_url` part
pub struct ImageNormalizer;

impl Normalizer for ImageNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::Image])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::Image(image)) => {
                Ok(json!({"type": "image_url", "image_url": {"url": image.as_data_url()}}))
            }
            _ => Err(unexpected("ImageNormalizer", data.kind())),
        }
    }
}

impl Denormalizer for ImageNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::Image
            && has_type(data, "image_url")
            && data
                .pointer("/image_url/url")
                .and_then(Value::as_str)
                .is_some_and(|url| url.starts_with("data:"))
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        let url = string_field(data, "/image_url/url")?;
        Ok(Content::Image(Image::from_data_url(&url)?))
    }
}

pub struct AudioNormalizer;

impl Normalizer for AudioNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::Audio])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::Audio(audio)) => Ok(json!({
                "type": "input_audio",
                "input_audio": {"data": audio.data, "format": audio.format}
            })),
            _ => Err(unexpected("AudioNormalizer", data.kind())),
        }
    }
}

impl Denormalizer for AudioNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::Audio && has_type(data, "input_audio")
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        Ok(Content::audio(
            string_field(data, "/input_audio/data")?,
            string_field(data, "/input_audio/format")?,
        ))
    }
}

pub struct FileNormalizer;

impl Normalizer for FileNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::File])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::File(file)) => {
                let mut part = json!({"file_data": file.as_data_url()});
                if let Some(filename) = &file.filename {
                    part["filename"] = json!(filename);
                }
                Ok(json!({"type": "file", "file": part}))
            }
            _ => Err(unexpected("FileNormalizer", data.kind())),
        }
    }
}

impl Denormalizer for FileNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::File && has_type(data, "file")
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        let mut file = File::from_data_url(&string_field(data, "/file/file_data")?)?;
        if let Ok(filename) = string_field(data, "/file/filename") {
            file = file.with_filename(filename);
        }
        Ok(Content::File(file))
    }
}

/// Tool calls carry their arguments as a JSON encoded string
pub struct ToolCallNormalizer;

impl Normalizer for ToolCallNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::ToolCall])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::ToolCall(call)) => Ok(json!({
                "id": call.id,
                "type": "function",
                "function": {
                    "name": call.name,
                    "arguments": Value::Object(call.arguments.clone()).to_string(),
                }
            })),
            _ => Err(unexpected("ToolCallNormalizer", data.kind())),
        }
    }
}

impl Denormalizer for ToolCallNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::ToolCall && has_type(data, "function")
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        Ok(Content::tool_call(parse_function_call(data)?))
    }
}

/// Read an OpenAI `{id, function: {name, arguments}}` tool call
pub(crate) fn parse_function_call(data: &Value) -> PlatformResult<ToolCall> {
    let id = string_field(data, "/id")?;
    let name = string_field(data, "/function/name")?;
    let arguments = match data.pointer("/function/arguments") {
        Some(Value::String(raw)) if raw.trim().is_empty() => Value::Object(Default::default()),
        Some(Value::String(raw)) => serde_json::from_str(raw).map_err(|e| {
            PlatformError::Normalization(format!(
                "Could not interpret tool use parameters for id {id}: {e}"
            ))
        })?,
        Some(value) => value.clone(),
        None => Value::Object(Default::default()),
    };

    match arguments {
        Value::Object(arguments) => Ok(ToolCall::new(id, name).with_arguments(arguments)),
        other => Err(PlatformError::Normalization(format!(
            "Tool call arguments for id {id} must be an object, got {other}"
        ))),
    }
}

/// Tool results are whole messages in the OpenAI format
pub struct ToolCallResultNormalizer;

impl Normalizer for ToolCallResultNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::ToolCallResult])
    }

    fn normalize(&self, data: ContractData<'_>, _contract: &Contract) -> PlatformResult<Value> {
        match content(&data) {
            Some(Content::ToolCallResult(result)) => Ok(json!({
                "role": "tool",
                "content": result.result,
                "tool_call_id": result.tool_call.id,
            })),
            _ => Err(unexpected("ToolCallResultNormalizer", data.kind())),
        }
    }
}

/// The wire form carries no tool name; the rebuilt call only knows its id
impl Denormalizer for ToolCallResultNormalizer {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool {
        target == DataKind::ToolCallResult && data.get("role").and_then(Value::as_str) == Some("tool")
    }

    fn denormalize(&self, data: &Value, _target: DataKind) -> PlatformResult<Content> {
        let id = string_field(data, "/tool_call_id")?;
        let result = string_field(data, "/content")?;
        Ok(Content::tool_call_result(ToolCall::new(id, ""), result))
    }
}
