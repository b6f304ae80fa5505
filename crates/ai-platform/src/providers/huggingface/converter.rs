use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

use super::task::Task;
use crate::errors::{PlatformError, PlatformResult};
use crate::model::{Model, ModelFamily, Options};
use crate::platform::ResultConverter;
use crate::providers::openai::gpt::convert_completion;
use crate::providers::utils::{check_error_payload, ensure_success};
use crate::result::{
    Base64Image, GeneratedImage, ImageResult, Metadata, ModelResult, StructuredResult, Vector,
    VectorResult,
};
use crate::transport::TransportResponse;

/// Converts inference results according to the `task` option
pub struct HuggingFaceResultConverter;

#[async_trait]
impl ResultConverter for HuggingFaceResultConverter {
    fn supports(&self, model: &Model) -> bool {
        model.family() == &ModelFamily::Generic
    }

    async fn convert(
        &self,
        response: TransportResponse,
        options: &Options,
    ) -> PlatformResult<ModelResult> {
        let task = Task::from_options(options)?;
        let response = ensure_success(response).await?;
        let status = response.status();

        if task == Task::TextToImage {
            let image = response.bytes().await?;
            return Ok(ModelResult::Images(ImageResult {
                images: vec![GeneratedImage::Base64(Base64Image::new(STANDARD.encode(image))?)],
                revised_prompt: None,
                metadata: Metadata::default(),
            }));
        }

        let data = response.json().await?;
        check_error_payload(status, &data)?;

        match task {
            Task::ChatCompletion => convert_completion(status, data, options),
            Task::TextGeneration => text_field(status, data, "generated_text"),
            Task::Summarization => text_field(status, data, "summary_text"),
            Task::Translation => text_field(status, data, "translation_text"),
            Task::ImageToText | Task::AutomaticSpeechRecognition => {
                if data.get("text").is_some() {
                    text_field(status, data, "text")
                } else {
                    text_field(status, data, "generated_text")
                }
            }
            Task::FeatureExtraction => Ok(ModelResult::Vectors(VectorResult {
                vectors: vectors(status, &data)?,
                metadata: Metadata::from_raw(data, None),
            })),
            // Classification style tasks answer with task specific JSON
            _ => Ok(ModelResult::Structured(StructuredResult {
                value: data.clone(),
                metadata: Metadata::from_raw(data, None),
            })),
        }
    }
}

/// Read `field` from an object or from the first object of a list
fn text_field(status: u16, data: Value, field: &str) -> PlatformResult<ModelResult> {
    let item = match &data {
        Value::Array(items) => items.first(),
        object => Some(object),
    };
    let text = item
        .and_then(|item| item.get(field))
        .and_then(Value::as_str)
        .ok_or_else(|| PlatformError::Provider {
            status,
            message: format!("Response does not contain \"{field}\""),
        })?
        .to_string();
    Ok(ModelResult::text(text, Metadata::from_raw(data, None)))
}

fn vectors(status: u16, data: &Value) -> PlatformResult<Vec<Vector>> {
    let to_vector = |values: &[Value]| {
        Vector(
            values
                .iter()
                .filter_map(Value::as_f64)
                .map(|v| v as f32)
                .collect(),
        )
    };

    match data.as_array() {
        Some(items) if items.iter().all(Value::is_number) => Ok(vec![to_vector(items.as_slice())]),
        Some(items) => items
            .iter()
            .map(|item| {
                item.as_array()
                    .map(|values| to_vector(values.as_slice()))
                    .ok_or_else(|| PlatformError::Provider {
                        status,
                        message: "Unexpected feature extraction result".to_string(),
                    })
            })
            .collect(),
        None => Err(PlatformError::Provider {
            status,
            message: "Unexpected feature extraction result".to_string(),
        }),
    }
}
