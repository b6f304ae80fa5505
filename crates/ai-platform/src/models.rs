//! These models represent the objects passed between callers, providers and toolboxes
//!
//! Every provider speaks its own dialect on the wire:
//! - openai chat messages, content parts and function tools
//! - anthropic messages, content blocks and tool definitions
//! - hugging face task inputs
//!
//! Callers only ever build the internal structs in this module. The contract layer
//! converts them into a provider's wire format right before a request is sent, and
//! back again where a provider echoes content.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
