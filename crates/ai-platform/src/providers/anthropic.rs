//! Anthropic: Claude models over the messages API
use std::sync::Arc;

use crate::errors::PlatformResult;
use crate::platform::Platform;
use crate::transport::Transport;

pub mod claude;
pub mod contract;

pub use claude::{Claude, ClaudeModelClient, ClaudeResultConverter};

pub const BASE_URL: &str = "https://api.anthropic.com/v1";
pub const API_VERSION: &str = "2023-06-01";

pub fn create_platform(api_key: &str, transport: Arc<dyn Transport>) -> PlatformResult<Platform> {
    create_platform_with_base_url(api_key, BASE_URL, transport)
}

pub fn create_platform_with_base_url(
    api_key: &str,
    base_url: &str,
    transport: Arc<dyn Transport>,
) -> PlatformResult<Platform> {
    Ok(Platform::new(
        vec![Box::new(ClaudeModelClient::with_base_url(
            transport, api_key, base_url,
        )?)],
        vec![Box::new(ClaudeResultConverter)],
        contract::contract(),
    ))
}
