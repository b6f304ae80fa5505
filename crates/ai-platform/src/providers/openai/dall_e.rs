use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{post, BASE_URL};
use crate::errors::{PlatformError, PlatformResult};
use crate::model::{Capability, Model, ModelFamily, Options};
use crate::platform::{join_url, merge_options, ModelClient, Payload, ResultConverter};
use crate::providers::utils::{check_error_payload, ensure_success, validate_credentials};
use crate::result::{GeneratedImage, ImageResult, Metadata, ModelResult};
use crate::transport::{Transport, TransportResponse};

pub use crate::result::{Base64Image, UrlImage};

/// Descriptors for DALL·E image generation models
pub struct DallE;

impl DallE {
    pub const DALL_E_2: &'static str = "dall-e-2";
    pub const DALL_E_3: &'static str = "dall-e-3";

    /// `dall-e-2` without options
    pub fn default_model() -> PlatformResult<Model> {
        Self::model(Self::DALL_E_2, Options::new())
    }

    pub fn model(name: &str, options: Options) -> PlatformResult<Model> {
        Ok(Model::new(name, ModelFamily::DallE)?
            .with_capabilities([Capability::InputText, Capability::OutputImage])
            .with_options(options))
    }
}

pub struct DallEModelClient {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
}

impl DallEModelClient {
    pub fn new(transport: Arc<dyn Transport>, api_key: &str) -> PlatformResult<Self> {
        Self::with_base_url(transport, api_key, BASE_URL)
    }

    pub fn with_base_url(
        transport: Arc<dyn Transport>,
        api_key: &str,
        base_url: &str,
    ) -> PlatformResult<Self> {
        validate_credentials(api_key, base_url)?;
        Ok(Self {
            transport,
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl ModelClient for DallEModelClient {
    fn supports(&self, model: &Model) -> bool {
        model.family() == &ModelFamily::DallE
    }

    async fn request(
        &self,
        model: &Model,
        payload: Payload,
        options: &Options,
    ) -> PlatformResult<TransportResponse> {
        let payload = match payload {
            Payload::Text(prompt) => {
                let mut body = Map::new();
                body.insert("model".to_string(), json!(model.name()));
                body.insert("prompt".to_string(), json!(prompt));
                Payload::Json(body)
            }
            payload => payload,
        };

        let url = join_url(&self.base_url, "images/generations");
        post(
            self.transport.as_ref(),
            &url,
            &self.api_key,
            merge_options(payload, options),
        )
        .await
    }
}

pub struct DallEResultConverter;

#[async_trait]
impl ResultConverter for DallEResultConverter {
    fn supports(&self, model: &Model) -> bool {
        model.family() == &ModelFamily::DallE
    }

    async fn convert(
        &self,
        response: TransportResponse,
        _options: &Options,
    ) -> PlatformResult<ModelResult> {
        let response = ensure_success(response).await?;
        let status = response.status();
        let data = response.json().await?;
        check_error_payload(status, &data)?;

        let items = data
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| PlatformError::Provider {
                status,
                message: "Response does not contain any images".to_string(),
            })?;

        let images = items
            .iter()
            .map(|item| -> PlatformResult<GeneratedImage> {
                if let Some(url) = item.get("url").and_then(Value::as_str) {
                    return Ok(GeneratedImage::Url(UrlImage::new(url)?));
                }
                let encoded = item
                    .get("b64_json")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Ok(GeneratedImage::Base64(Base64Image::new(encoded)?))
            })
            .collect::<PlatformResult<Vec<_>>>()?;

        let revised_prompt = items
            .first()
            .and_then(|item| item.get("revised_prompt"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(ModelResult::Images(ImageResult {
            images,
            revised_prompt,
            metadata: Metadata::from_raw(data, None),
        }))
    }
}
