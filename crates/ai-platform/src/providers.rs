//! Model clients and result converters per provider
pub mod albert;
pub mod anthropic;
pub mod huggingface;
pub mod openai;
pub mod utils;
