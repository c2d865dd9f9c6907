mod config;
mod gemini;
mod retry;
mod scripted;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub use config::{ConfigError, GeminiConfig, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
pub use gemini::GeminiGenerator;
pub use retry::{RetryPolicy, RetryingGenerator};
pub use scripted::ScriptedGenerator;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text-generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("text-generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode completion: {0}")]
    Decode(String),

    #[error("text-generation service returned no candidates")]
    EmptyCompletion,

    #[error("no completion within {after:?}")]
    Timeout { after: Duration },

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<GenerationError>,
    },

    #[error("scripted failure for prompt containing {0:?}")]
    Scripted(String),
}

impl GenerationError {
    /// Transport faults, timeouts, throttling and 5xx are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(error) => error.is_timeout() || error.is_connect() || error.is_request(),
            Self::Status { status, .. } => *status == 429 || (500..=599).contains(status),
            Self::Timeout { .. } => true,
            Self::Decode(_) | Self::EmptyCompletion | Self::Exhausted { .. } | Self::Scripted(_) => {
                false
            }
        }
    }
}

/// Prompt in, completion out. One call per prompt; callers own retries
/// through [`RetryingGenerator`].
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

#[derive(Debug, Clone)]
pub enum Generator {
    Gemini(RetryingGenerator<GeminiGenerator>),
    Scripted(ScriptedGenerator),
}

impl Generator {
    pub fn gemini(config: &GeminiConfig) -> Result<Self, GenerationError> {
        let client = GeminiGenerator::new(config)?;
        Ok(Self::Gemini(RetryingGenerator::new(
            client,
            RetryPolicy::from_config(config),
        )))
    }

    pub fn scripted(generator: ScriptedGenerator) -> Self {
        Self::Scripted(generator)
    }
}

impl TextGenerator for Generator {
    fn name(&self) -> &'static str {
        match self {
            Generator::Gemini(generator) => generator.name(),
            Generator::Scripted(generator) => generator.name(),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self {
            Generator::Gemini(generator) => generator.generate(prompt).await,
            Generator::Scripted(generator) => generator.generate(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_retryable_statuses() {
        let throttled = GenerationError::Status {
            status: 429,
            body: String::new(),
        };
        let unavailable = GenerationError::Status {
            status: 503,
            body: String::new(),
        };
        let bad_request = GenerationError::Status {
            status: 400,
            body: "API key not valid".to_string(),
        };
        assert!(throttled.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(!GenerationError::EmptyCompletion.is_retryable());
    }

    #[tokio::test]
    async fn enum_dispatches_to_scripted_generator() {
        let generator = Generator::scripted(
            ScriptedGenerator::new().with_rule("Classify", "Emergency"),
        );
        assert_eq!(generator.name(), "scripted");
        assert_eq!(
            generator.generate("Classify this").await.unwrap(),
            "Emergency"
        );
    }
}
