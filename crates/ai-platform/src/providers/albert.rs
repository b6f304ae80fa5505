//! Albert, an OpenAI compatible API served at a caller supplied base url
use std::sync::Arc;

use super::openai::{
    EmbeddingsModelClient, EmbeddingsResultConverter, GptModelClient, GptResultConverter,
};
use crate::contract::Contract;
use crate::errors::PlatformResult;
use crate::platform::Platform;
use crate::transport::Transport;

/// A platform serving chat and embedding models from an Albert instance
pub fn create_platform(
    api_key: &str,
    base_url: &str,
    transport: Arc<dyn Transport>,
) -> PlatformResult<Platform> {
    Ok(Platform::new(
        vec![
            Box::new(GptModelClient::with_base_url(
                transport.clone(),
                api_key,
                base_url,
            )?),
            Box::new(EmbeddingsModelClient::with_base_url(
                transport, api_key, base_url,
            )?),
        ],
        vec![Box::new(GptResultConverter), Box::new(EmbeddingsResultConverter)],
        Contract::default(),
    ))
}
