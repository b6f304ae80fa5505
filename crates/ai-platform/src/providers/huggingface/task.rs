use std::str::FromStr;

use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::{PlatformError, PlatformResult};
use crate::model::Options;

/// Inference tasks served by the hugging face inference api
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Task {
    AudioClassification,
    AutomaticSpeechRecognition,
    ChatCompletion,
    FeatureExtraction,
    FillMask,
    ImageClassification,
    ImageSegmentation,
    ImageToText,
    ObjectDetection,
    QuestionAnswering,
    SentenceSimilarity,
    Summarization,
    TableQuestionAnswering,
    TextClassification,
    TextGeneration,
    TextToImage,
    TokenClassification,
    Translation,
    ZeroShotClassification,
}

impl Task {
    pub const OPTION: &'static str = "task";

    /// Read the task from invocation options
    pub fn from_options(options: &Options) -> PlatformResult<Self> {
        let name = options
            .get(Self::OPTION)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PlatformError::InvalidArgument("The task option is required.".to_string())
            })?;
        Task::from_str(name)
            .map_err(|_| PlatformError::InvalidArgument(format!("Unknown task \"{name}\"")))
    }
}
