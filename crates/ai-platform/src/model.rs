use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::{PlatformError, PlatformResult};

/// Invocation options, e.g. `temperature`, `stream` or `max_tokens`
pub type Options = Map<String, Value>;

/// What a model is able to consume or produce
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Capability {
    InputMessages,
    InputText,
    InputImage,
    InputAudio,
    InputPdf,
    OutputText,
    OutputStreaming,
    OutputStructured,
    OutputImage,
    ToolCalling,
    Embeddings,
}

/// The family a model belongs to, used by clients to claim models
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelFamily {
    Gpt,
    Embeddings,
    DallE,
    Claude,
    /// Any model not tied to a provider specific family, e.g. hugging face hub models
    Generic,
}

/// Describes the model a caller wants to invoke
///
/// Built once per invocation and never mutated afterwards. The declared options are
/// defaults: per call options override them key by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    name: String,
    family: ModelFamily,
    capabilities: Vec<Capability>,
    options: Options,
}

impl Model {
    pub fn new<S: Into<String>>(name: S, family: ModelFamily) -> PlatformResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PlatformError::InvalidArgument(
                "The model name must not be empty.".to_string(),
            ));
        }
        Ok(Self {
            name,
            family,
            capabilities: Vec::new(),
            options: Options::new(),
        })
    }

    /// A model outside of any provider family
    pub fn generic<S: Into<String>>(name: S) -> PlatformResult<Self> {
        Self::new(name, ModelFamily::Generic)
    }

    pub fn with_capabilities<I: IntoIterator<Item = Capability>>(mut self, capabilities: I) -> Self {
        for capability in capabilities {
            if !self.capabilities.contains(&capability) {
                self.capabilities.push(capability);
            }
        }
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> &ModelFamily {
        &self.family
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Fail with a message naming the model if it lacks `capability`
    pub fn require(&self, capability: Capability) -> PlatformResult<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(PlatformError::MissingModelSupport {
                model: self.name.clone(),
                capability: capability.to_string(),
            })
        }
    }
}
