use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Please enter both symptom and city.")]
    EmptyInput,

    #[error("{field} must be at most {max} characters")]
    InputTooLong { field: &'static str, max: usize },

    #[error("{stage} generation failed: {source}")]
    Generation {
        stage: &'static str,
        #[source]
        source: BoxError,
    },
}

impl TriageError {
    pub fn generation(stage: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Generation {
            stage,
            source: source.into(),
        }
    }

    /// Caller-side problems the user can fix by resubmitting.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::InputTooLong { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::InputTooLong { .. } => "input_too_long",
            Self::Generation { .. } => "generation_failed",
        }
    }
}
