//! OpenAI: chat completions, embeddings and image generation
use std::sync::Arc;

use super::utils::bearer;
use crate::contract::Contract;
use crate::errors::PlatformResult;
use crate::platform::Platform;
use crate::transport::{Method, RequestBody, RequestOptions, Transport, TransportResponse};

pub mod dall_e;
pub mod embeddings;
pub mod gpt;

pub use dall_e::{DallE, DallEModelClient, DallEResultConverter};
pub use embeddings::{Embeddings, EmbeddingsModelClient, EmbeddingsResultConverter};
pub use gpt::{Gpt, GptModelClient, GptResultConverter};

pub const BASE_URL: &str = "https://api.openai.com/v1";

/// A platform serving GPT, embeddings and DALL·E models from api.openai.com
pub fn create_platform(api_key: &str, transport: Arc<dyn Transport>) -> PlatformResult<Platform> {
    create_platform_with_base_url(api_key, BASE_URL, transport)
}

/// A platform for any OpenAI compatible endpoint
pub fn create_platform_with_base_url(
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
                transport.clone(),
                api_key,
                base_url,
            )?),
            Box::new(DallEModelClient::with_base_url(transport, api_key, base_url)?),
        ],
        vec![
            Box::new(GptResultConverter),
            Box::new(EmbeddingsResultConverter),
            Box::new(DallEResultConverter),
        ],
        Contract::default(),
    ))
}

/// POST a body with bearer authentication
pub(crate) async fn post(
    transport: &dyn Transport,
    url: &str,
    api_key: &str,
    body: RequestBody,
) -> PlatformResult<TransportResponse> {
    let options = RequestOptions {
        headers: vec![("Authorization".to_string(), bearer(api_key))],
        body: Some(body),
    };
    transport.send(Method::POST, url, options).await
}
