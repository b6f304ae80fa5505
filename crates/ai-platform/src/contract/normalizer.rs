use serde_json::Value;
use std::collections::HashMap;
use strum_macros::Display;

use super::Contract;
use crate::errors::{PlatformError, PlatformResult};
use crate::models::content::Content;
use crate::models::message::{Conversation, Message};
use crate::models::tool::Tool;

/// The kinds of data a contract converts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DataKind {
    Conversation,
    Message,
    Text,
    ImageUrl,
    Image,
    Audio,
    File,
    ToolCall,
    ToolCallResult,
    Tool,
}

impl DataKind {
    pub fn of(content: &Content) -> Self {
        match content {
            Content::Text(_) => DataKind::Text,
            Content::ImageUrl(_) => DataKind::ImageUrl,
            Content::Image(_) => DataKind::Image,
            Content::Audio(_) => DataKind::Audio,
            Content::File(_) => DataKind::File,
            Content::ToolCall(_) => DataKind::ToolCall,
            Content::ToolCallResult(_) => DataKind::ToolCallResult,
        }
    }
}

/// Borrowed view of anything a normalizer can turn into wire format
#[derive(Debug, Clone, Copy)]
pub enum ContractData<'a> {
    Conversation(&'a Conversation),
    Message(&'a Message),
    Content(&'a Content),
    Tool(&'a Tool),
}

impl ContractData<'_> {
    pub fn kind(&self) -> DataKind {
        match self {
            ContractData::Conversation(_) => DataKind::Conversation,
            ContractData::Message(_) => DataKind::Message,
            ContractData::Content(content) => DataKind::of(content),
            ContractData::Tool(_) => DataKind::Tool,
        }
    }
}

/// Converts internal data into a provider's JSON shape
pub trait Normalizer: Send + Sync {
    /// Kinds this normalizer handles; `true` means support depends on the kind alone
    fn supported_types(&self) -> HashMap<DataKind, bool>;

    fn supports_normalization(&self, data: &ContractData<'_>) -> bool {
        self.supported_types().contains_key(&data.kind())
    }

    /// `contract` is handed in so nested data goes through the same priority chain
    fn normalize(&self, data: ContractData<'_>, contract: &Contract) -> PlatformResult<Value>;
}

/// Converts a provider's JSON shape back into content
pub trait Denormalizer: Send + Sync {
    fn supports_denormalization(&self, data: &Value, target: DataKind) -> bool;

    fn denormalize(&self, data: &Value, target: DataKind) -> PlatformResult<Content>;
}

/// The error for data that reached a normalizer which cannot handle it
pub(crate) fn unexpected(normalizer: &str, kind: DataKind) -> PlatformError {
    PlatformError::Normalization(format!("{normalizer} cannot handle {kind}"))
}

/// Read a required string field from a wire object
pub(crate) fn string_field(data: &Value, pointer: &str) -> PlatformResult<String> {
    data.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PlatformError::Normalization(format!("missing string at {pointer}")))
}

/// Supported types map for a normalizer whose support depends on the kind alone
pub(crate) fn kinds(kinds: &[DataKind]) -> HashMap<DataKind, bool> {
    kinds.iter().map(|kind| (*kind, true)).collect()
}
