//! Hugging Face: models hosted on the hub, served by the inference api
//!
//! Every invocation names its [`Task`] through the `task` option, which picks the
//! endpoint and how the response is read.
use std::sync::Arc;

use crate::contract::Contract;
use crate::errors::PlatformResult;
use crate::platform::Platform;
use crate::transport::Transport;

pub mod client;
pub mod converter;
pub mod task;

pub use client::HuggingFaceModelClient;
pub use converter::HuggingFaceResultConverter;
pub use task::Task;

pub const BASE_URL: &str = "https://router.huggingface.co/hf-inference";

pub fn create_platform(api_key: &str, transport: Arc<dyn Transport>) -> PlatformResult<Platform> {
    create_platform_with_base_url(api_key, BASE_URL, transport)
}

pub fn create_platform_with_base_url(
    api_key: &str,
    base_url: &str,
    transport: Arc<dyn Transport>,
) -> PlatformResult<Platform> {
    Ok(Platform::new(
        vec![Box::new(HuggingFaceModelClient::with_base_url(
            transport, api_key, base_url,
        )?)],
        vec![Box::new(HuggingFaceResultConverter)],
        Contract::default(),
    ))
}
