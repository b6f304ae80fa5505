use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{post, BASE_URL};
use crate::errors::{PlatformError, PlatformResult};
use crate::model::{Capability, Model, ModelFamily, Options};
use crate::platform::{join_url, merge_options, ModelClient, Payload, ResultConverter};
use crate::providers::utils::{check_error_payload, ensure_success, validate_credentials};
use crate::result::{Metadata, ModelResult, Usage, Vector, VectorResult};
use crate::transport::{Transport, TransportResponse};

/// Descriptors for OpenAI embedding models
pub struct Embeddings;

impl Embeddings {
    pub const TEXT_ADA_002: &'static str = "text-embedding-ada-002";
    pub const TEXT_3_SMALL: &'static str = "text-embedding-3-small";
    pub const TEXT_3_LARGE: &'static str = "text-embedding-3-large";

    pub fn default_model() -> PlatformResult<Model> {
        Self::model(Self::TEXT_3_SMALL, Options::new())
    }

    pub fn model(name: &str, options: Options) -> PlatformResult<Model> {
        Ok(Model::new(name, ModelFamily::Embeddings)?
            .with_capabilities([Capability::InputText, Capability::Embeddings])
            .with_options(options))
    }
}

pub struct EmbeddingsModelClient {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
}

impl EmbeddingsModelClient {
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
impl ModelClient for EmbeddingsModelClient {
    fn supports(&self, model: &Model) -> bool {
        model.family() == &ModelFamily::Embeddings
    }

    async fn request(
        &self,
        model: &Model,
        payload: Payload,
        options: &Options,
    ) -> PlatformResult<TransportResponse> {
        // Text input is the thing to embed
        let payload = match payload {
            Payload::Text(input) => {
                let mut body = Map::new();
                body.insert("model".to_string(), json!(model.name()));
                body.insert("input".to_string(), json!(input));
                Payload::Json(body)
            }
            payload => payload,
        };

        let url = join_url(&self.base_url, "embeddings");
        post(
            self.transport.as_ref(),
            &url,
            &self.api_key,
            merge_options(payload, options),
        )
        .await
    }
}

pub struct EmbeddingsResultConverter;

#[async_trait]
impl ResultConverter for EmbeddingsResultConverter {
    fn supports(&self, model: &Model) -> bool {
        model.family() == &ModelFamily::Embeddings
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
                message: "Response does not contain data".to_string(),
            })?;

        let vectors = items
            .iter()
            .map(|item| -> PlatformResult<Vector> {
                let embedding = item
                    .get("embedding")
                    .and_then(Value::as_array)
                    .ok_or_else(|| PlatformError::Provider {
                        status,
                        message: "Embedding item without an embedding".to_string(),
                    })?;
                Ok(Vector(
                    embedding
                        .iter()
                        .filter_map(Value::as_f64)
                        .map(|v| v as f32)
                        .collect(),
                ))
            })
            .collect::<PlatformResult<Vec<_>>>()?;

        let usage = Usage::from_response(&data, "prompt_tokens", "completion_tokens");
        Ok(ModelResult::Vectors(VectorResult {
            vectors,
            metadata: Metadata::from_raw(data, usage),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::RequestBody;

    #[tokio::test]
    async fn test_text_becomes_input() -> PlatformResult<()> {
        let transport = Arc::new(MockTransport::json(json!({"data": []})));
        let client = EmbeddingsModelClient::new(transport.clone(), "sk-test")?;
        let model = Embeddings::default_model()?;

        let mut options = Options::new();
        options.insert("dimensions".to_string(), json!(256));
        client
            .request(&model, Payload::Text("Hello world".to_string()), &options)
            .await?;

        let request = &transport.requests()[0];
        assert_eq!(request.url, "https://api.openai.com/v1/embeddings");
        assert_eq!(
            request.options.body,
            Some(RequestBody::Json(json!({
                "model": "text-embedding-3-small",
                "input": "Hello world",
                "dimensions": 256
            })))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_convert_vectors() -> PlatformResult<()> {
        let data = json!({
            "object": "list",
            "data": [
                {"object": "embedding", "index": 0, "embedding": [0.25, -0.5, 1.0]},
                {"object": "embedding", "index": 1, "embedding": [0.0, 0.5, 0.75]}
            ],
            "usage": {"prompt_tokens": 8, "total_tokens": 8}
        });

        let result = EmbeddingsResultConverter
            .convert(TransportResponse::from_json(200, &data), &Options::new())
            .await?;
        let vectors = result.as_vectors()?;

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].as_slice(), &[0.25, -0.5, 1.0]);
        assert_eq!(vectors[1].dimensions(), 3);
        Ok(())
    }

    #[test]
    fn test_embeddings_is_not_a_chat_model() {
        let model = Embeddings::model(Embeddings::TEXT_ADA_002, Options::new()).unwrap();
        assert!(model.supports(Capability::Embeddings));
        assert!(!model.supports(Capability::InputMessages));
    }
}
