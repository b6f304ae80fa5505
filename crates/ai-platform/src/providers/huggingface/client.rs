use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::task::Task;
use super::BASE_URL;
use crate::errors::PlatformResult;
use crate::model::{Model, ModelFamily, Options};
use crate::platform::{join_url, merge_options, ModelClient, Payload};
use crate::providers::openai::post;
use crate::providers::utils::validate_credentials;
use crate::transport::{RequestBody, Transport, TransportResponse};

/// Sends inference requests for models hosted on the hugging face hub
pub struct HuggingFaceModelClient {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
}

impl HuggingFaceModelClient {
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

    fn url(&self, model: &Model, task: Task) -> String {
        let path = match task {
            Task::FeatureExtraction => format!("models/{}/pipeline/feature-extraction", model.name()),
            Task::ChatCompletion => format!("models/{}/v1/chat/completions", model.name()),
            _ => format!("models/{}", model.name()),
        };
        join_url(&self.base_url, &path)
    }
}

#[async_trait]
impl ModelClient for HuggingFaceModelClient {
    fn supports(&self, model: &Model) -> bool {
        model.family() == &ModelFamily::Generic
    }

    async fn request(
        &self,
        model: &Model,
        payload: Payload,
        options: &Options,
    ) -> PlatformResult<TransportResponse> {
        let task = Task::from_options(options)?;
        let mut options = options.clone();
        options.remove(Task::OPTION);

        let body = match payload {
            // Remaining options become the inference parameters
            Payload::Text(inputs) => {
                let mut body = Map::new();
                body.insert("inputs".to_string(), json!(inputs));
                if !options.is_empty() {
                    body.insert("parameters".to_string(), Value::Object(options));
                }
                RequestBody::Json(Value::Object(body))
            }
            payload => merge_options(payload, &options),
        };

        post(
            self.transport.as_ref(),
            &self.url(model, task),
            &self.api_key,
            body,
        )
        .await
    }
}
