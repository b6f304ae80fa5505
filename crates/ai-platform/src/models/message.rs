use serde::{Deserialize, Serialize};

use super::content::{Content, ToolCallResult};
use super::role::Role;
use super::tool::ToolCall;
use crate::errors::{PlatformError, PlatformResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MessageRepr")]
/// A message to or from a model
pub struct Message {
    role: Role,
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct MessageRepr {
    role: Role,
    content: Vec<Content>,
}

impl TryFrom<MessageRepr> for Message {
    type Error = PlatformError;

    fn try_from(repr: MessageRepr) -> PlatformResult<Self> {
        let message = Message {
            role: repr.role,
            content: repr.content,
        };
        message.validate()?;
        Ok(message)
    }
}

impl Message {
    /// Create a system message holding the given instructions
    pub fn system<S: Into<String>>(text: S) -> Self {
        Message {
            role: Role::System,
            content: vec![Content::text(text)],
        }
    }

    /// Create a new, empty user message
    pub fn user() -> Self {
        Message {
            role: Role::User,
            content: Vec::new(),
        }
    }

    /// Create a new, empty assistant message
    pub fn assistant() -> Self {
        Message {
            role: Role::Assistant,
            content: Vec::new(),
        }
    }

    /// Create the tool message answering `tool_call`
    pub fn tool<S: Into<String>>(tool_call: ToolCall, result: S) -> Self {
        Message {
            role: Role::Tool,
            content: vec![Content::tool_call_result(tool_call, result)],
        }
    }

    /// Add any content to the message, checking the role rules
    pub fn with_content(mut self, content: Content) -> PlatformResult<Self> {
        self.content.push(content);
        self.validate()?;
        Ok(self)
    }

    /// Add text content to the message
    ///
    /// A tool message holds nothing but its result, so text given to one extends the
    /// result on a new line.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        let text = text.into();
        if let [Content::ToolCallResult(result)] = self.content.as_mut_slice() {
            result.result.push('\n');
            result.result.push_str(&text);
        } else {
            self.content.push(Content::text(text));
        }
        self
    }

    /// Add an image url to a user message
    pub fn with_image_url<S: Into<String>>(self, url: S) -> PlatformResult<Self> {
        self.with_content(Content::image_url(url)?)
    }

    /// Add a tool call to an assistant message
    pub fn with_tool_call(self, tool_call: ToolCall) -> PlatformResult<Self> {
        self.with_content(Content::tool_call(tool_call))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &[Content] {
        &self.content
    }

    /// All text parts joined with newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|content| content.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.content
            .iter()
            .filter_map(|content| content.as_tool_call())
            .collect()
    }

    pub fn tool_call_result(&self) -> Option<&ToolCallResult> {
        self.content
            .iter()
            .find_map(|content| content.as_tool_call_result())
    }

    /// The id of the tool call a tool message answers
    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool_call_result()
            .map(|result| result.tool_call.id.as_str())
    }

    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, Content::ToolCall(_)))
    }

    fn validate(&self) -> PlatformResult<()> {
        let results = self
            .content
            .iter()
            .filter(|c| matches!(c, Content::ToolCallResult(_)))
            .count();

        match self.role {
            Role::Tool => {
                if results != 1 || self.content.len() != 1 {
                    return Err(PlatformError::InvalidArgument(
                        "A tool message must carry exactly one tool call result".to_string(),
                    ));
                }
            }
            role => {
                if results > 0 {
                    return Err(PlatformError::InvalidArgument(format!(
                        "A {role} message does not support tool call results"
                    )));
                }
                if role != Role::Assistant && self.has_tool_calls() {
                    return Err(PlatformError::InvalidArgument(format!(
                        "A {role} message does not support tool calls"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// An ordered conversation, the unit sent to chat models
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn with(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The first system message, if any
    pub fn system_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.role() == Role::System)
    }

    /// All messages except system messages
    pub fn without_system_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role() != Role::System)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self::new(messages)
    }
}
