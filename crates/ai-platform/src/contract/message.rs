//! OpenAI shaped converters for messages and conversations
use serde_json::{json, Value};
use std::collections::HashMap;

use super::normalizer::{kinds, unexpected, ContractData, DataKind, Normalizer};
use super::Contract;
use crate::errors::{PlatformError, PlatformResult};
use crate::models::content::Content;
use crate::models::message::Message;
use crate::models::role::Role;

/// `{messages: [...]}`, each message normalized through the contract
pub struct ConversationNormalizer;

impl Normalizer for ConversationNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::Conversation])
    }

    fn normalize(&self, data: ContractData<'_>, contract: &Contract) -> PlatformResult<Value> {
        let ContractData::Conversation(conversation) = data else {
            return Err(unexpected("ConversationNormalizer", data.kind()));
        };

        let messages = conversation
            .messages()
            .iter()
            .map(|message| contract.normalize(ContractData::Message(message)))
            .collect::<PlatformResult<Vec<_>>>()?;

        Ok(json!({ "messages": messages }))
    }
}

pub struct MessageNormalizer;

impl MessageNormalizer {
    fn user(message: &Message, contract: &Contract) -> PlatformResult<Value> {
        // A lone text part is sent as a plain string
        if let [Content::Text(text)] = message.content() {
            return Ok(json!({"role": "user", "content": text.text}));
        }

        let parts = message
            .content()
            .iter()
            .map(|content| contract.normalize(ContractData::Content(content)))
            .collect::<PlatformResult<Vec<_>>>()?;
        Ok(json!({"role": "user", "content": parts}))
    }

    fn assistant(message: &Message, contract: &Contract) -> PlatformResult<Value> {
        let text = message.text();
        let mut converted = json!({
            "role": "assistant",
            "content": if text.is_empty() { Value::Null } else { json!(text) },
        });

        let tool_calls = message
            .content()
            .iter()
            .filter(|content| matches!(content, Content::ToolCall(_)))
            .map(|content| contract.normalize(ContractData::Content(content)))
            .collect::<PlatformResult<Vec<_>>>()?;
        if !tool_calls.is_empty() {
            converted["tool_calls"] = json!(tool_calls);
        }

        Ok(converted)
    }

    fn tool(message: &Message, contract: &Contract) -> PlatformResult<Value> {
        let result = message
            .content()
            .iter()
            .find(|content| matches!(content, Content::ToolCallResult(_)))
            .ok_or_else(|| {
                PlatformError::Normalization("tool message without a tool call result".to_string())
            })?;
        contract.normalize(ContractData::Content(result))
    }
}

impl Normalizer for MessageNormalizer {
    fn supported_types(&self) -> HashMap<DataKind, bool> {
        kinds(&[DataKind::Message])
    }

    fn normalize(&self, data: ContractData<'_>, contract: &Contract) -> PlatformResult<Value> {
        let ContractData::Message(message) = data else {
            return Err(unexpected("MessageNormalizer", data.kind()));
        };

        match message.role() {
            Role::System => Ok(json!({"role": "system", "content": message.text()})),
            Role::User => Self::user(message, contract),
            Role::Assistant => Self::assistant(message, contract),
            Role::Tool => Self::tool(message, contract),
        }
    }
}
