use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_TEMPERATURE: f32 = 0.4;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GOOGLE_API_KEY is not set (export it or add it to .env)")]
    MissingApiKey,

    #[error("{var} has an invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_attempts: u32,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Reads `GOOGLE_API_KEY` (required) and the optional `TRIAGE_*` knobs.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GOOGLE_API_KEY")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);

        if let Some(model) = lookup("TRIAGE_GEMINI_MODEL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            config.model = model;
        }

        if let Some(value) = lookup("TRIAGE_TEMPERATURE") {
            config.temperature = value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|value| (0.0..=2.0).contains(value))
                .ok_or(ConfigError::Invalid {
                    var: "TRIAGE_TEMPERATURE",
                    value: value.clone(),
                })?;
        }

        if let Some(value) = lookup("TRIAGE_LLM_TIMEOUT_SECONDS") {
            let seconds = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::Invalid {
                    var: "TRIAGE_LLM_TIMEOUT_SECONDS",
                    value: value.clone(),
                })?;
            config.timeout = Duration::from_secs(seconds);
        }

        if let Some(value) = lookup("TRIAGE_LLM_MAX_ATTEMPTS") {
            config.max_attempts = value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| (1..=10).contains(value))
                .ok_or(ConfigError::Invalid {
                    var: "TRIAGE_LLM_MAX_ATTEMPTS",
                    value: value.clone(),
                })?;
        }

        Ok(config)
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}
