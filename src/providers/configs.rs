use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_MODEL: &str = "gpt-4o";
pub const OPENAI_TIMEOUT_SECS: u64 = 600;

pub trait ProviderConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self>
    where
        Self: Sized;

    /// Helper function to get environment variables with error handling
    fn get_env(key: &str, required: bool, default: Option<String>) -> Result<Option<String>> {
        match env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) if !required => Ok(default),
            Err(env::VarError::NotPresent) => Err(anyhow!(
                "Environment variable '{}' is required but not set.",
                key
            )),
            Err(e) => Err(e.into()),
        }
    }
}

/// Settings for any OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    /// Base url up to and including the version, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
    pub timeout: Duration,
}

impl OpenAiProviderConfig {
    pub fn new<B, K, M>(base_url: B, api_key: K, model: M) -> Self
    where
        B: Into<String>,
        K: Into<String>,
        M: Into<String>,
    {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
            timeout: Duration::from_secs(OPENAI_TIMEOUT_SECS),
        }
    }
}

impl ProviderConfig for OpenAiProviderConfig {
    fn from_env() -> Result<Self> {
        let api_key = Self::get_env("OPENAI_API_KEY", true, None)?
            .ok_or_else(|| anyhow!("OpenAI API key should be present"))?;

        let base_url = Self::get_env("OPENAI_BASE_URL", false, None)?
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string());

        let model = Self::get_env("OPENAI_MODEL", false, None)?
            .unwrap_or_else(|| OPENAI_MODEL.to_string());

        let temperature = Self::get_env("OPENAI_TEMPERATURE", false, None)?
            .map(|v| v.parse::<f32>())
            .transpose()
            .context("OPENAI_TEMPERATURE must be a number")?;

        let max_tokens = Self::get_env("OPENAI_MAX_TOKENS", false, None)?
            .map(|v| v.parse::<i32>())
            .transpose()
            .context("OPENAI_MAX_TOKENS must be an integer")?;

        Ok(Self {
            temperature,
            max_tokens,
            ..Self::new(base_url, api_key, model)
        })
    }
}
