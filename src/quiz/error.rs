use thiserror::Error;

/// Ways a question generation attempt can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    #[error("question source is not configured: {0}")]
    Configuration(String),

    #[error("malformed quiz response: {0}")]
    MalformedResponse(String),

    #[error("only {returned} questions were generated, at least {required} are needed")]
    InsufficientContent { returned: usize, required: usize },

    #[error("question generation failed: {0}")]
    Generation(String),
}

impl QuizError {
    /// The message shown to the user on the topic screen.
    pub fn user_message(&self) -> &'static str {
        match self {
            QuizError::Configuration(_) | QuizError::Generation(_) => {
                "Failed to generate quiz. Please try again."
            }
            QuizError::MalformedResponse(_) => {
                "The AI returned an unexpected format. Please try again."
            }
            QuizError::InsufficientContent { .. } => {
                "Could not generate enough questions. Please try again with a clearer topic."
            }
        }
    }
}

impl From<chatgpt::err::Error> for QuizError {
    fn from(err: chatgpt::err::Error) -> Self {
        QuizError::Generation(err.to_string())
    }
}

impl From<serde_json::Error> for QuizError {
    fn from(err: serde_json::Error) -> Self {
        QuizError::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_content_display() {
        let err = QuizError::InsufficientContent {
            returned: 7,
            required: 10,
        };
        assert_eq!(
            err.to_string(),
            "only 7 questions were generated, at least 10 are needed"
        );
        assert!(err.user_message().contains("clearer topic"));
    }

    #[test]
    fn configuration_and_generation_share_generic_message() {
        let config = QuizError::Configuration("CHATGPT_API_KEY is not set".into());
        let generation = QuizError::Generation("connection reset".into());
        assert_eq!(config.user_message(), generation.user_message());
    }

    #[test]
    fn json_errors_are_malformed_responses() {
        let err: QuizError = serde_json::from_str::<serde_json::Value>("{ nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, QuizError::MalformedResponse(_)));
        assert!(err.user_message().contains("format"));
    }
}
