//! Settings read from `AI_PLATFORM_*` environment variables
//!
//! ```text
//! AI_PLATFORM_PROVIDER__TYPE=openai
//! AI_PLATFORM_PROVIDER__API_KEY=sk-...
//! AI_PLATFORM_HTTP__TIMEOUT_SECS=60
//! ```
use config::{Config, Environment};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::errors::PlatformError;
use crate::platform::Platform;
use crate::providers::{albert, anthropic, huggingface, openai};
use crate::transport::{ReqwestTransport, Transport};

const ENV_PREFIX: &str = "AI_PLATFORM";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

#[derive(Debug, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum ProviderSettings {
    OpenAi {
        #[serde(default = "default_openai_base_url")]
        base_url: String,
        api_key: String,
    },
    Anthropic {
        #[serde(default = "default_anthropic_base_url")]
        base_url: String,
        api_key: String,
    },
    /// Albert has no public default endpoint, every deployment names its own
    Albert { base_url: String, api_key: String },
    HuggingFace {
        #[serde(default = "default_huggingface_base_url")]
        base_url: String,
        api_key: String,
    },
}

impl ProviderSettings {
    pub fn into_platform(self, transport: Arc<dyn Transport>) -> Result<Platform, PlatformError> {
        match self {
            ProviderSettings::OpenAi { base_url, api_key } => {
                openai::create_platform_with_base_url(&api_key, &base_url, transport)
            }
            ProviderSettings::Anthropic { base_url, api_key } => {
                anthropic::create_platform_with_base_url(&api_key, &base_url, transport)
            }
            ProviderSettings::Albert { base_url, api_key } => {
                albert::create_platform(&api_key, &base_url, transport)
            }
            ProviderSettings::HuggingFace { base_url, api_key } => {
                huggingface::create_platform_with_base_url(&api_key, &base_url, transport)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub http: HttpSettings,
    pub provider: ProviderSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    /// Build the platform for the configured provider over a `reqwest` transport
    pub fn into_platform(self) -> Result<Platform, ConfigError> {
        let transport =
            ReqwestTransport::new(Duration::from_secs(self.http.timeout_secs))?;
        Ok(self.provider.into_platform(Arc::new(transport))?)
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("http.timeout_secs", default_timeout_secs())?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match config.try_deserialize::<Self>() {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                // serde reports "missing field `api_key`", config reports NotFound("provider")
                let error_str = err.to_string();
                if error_str.contains("missing field") {
                    let field = error_str.split('`').nth(1).unwrap_or("provider");
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

/// Name the variable that sets `field`; bare names are provider fields
fn to_env_var(field: &str) -> String {
    match field {
        "provider" | "type" => format!("{ENV_PREFIX}_PROVIDER__TYPE"),
        field if field.contains('.') => {
            format!("{ENV_PREFIX}_{}", field.replace('.', "__").to_uppercase())
        }
        field => format!("{ENV_PREFIX}_PROVIDER__{}", field.to_uppercase()),
    }
}

fn default_timeout_secs() -> u64 {
    ReqwestTransport::DEFAULT_TIMEOUT.as_secs()
}

fn default_openai_base_url() -> String {
    openai::BASE_URL.to_string()
}

fn default_anthropic_base_url() -> String {
    anthropic::BASE_URL.to_string()
}

fn default_huggingface_base_url() -> String {
    huggingface::BASE_URL.to_string()
}
