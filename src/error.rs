use crate::messages;
use reqwest::StatusCode;

/// Failure of a single generative-text call.
///
/// Carries operator-facing detail only. It is logged by the client and wrapped
/// into a [`LookupError`] before anything reaches an end user.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote returned {status}: {message}")]
    Remote { status: StatusCode, message: String },

    #[error("response contained no usable text")]
    EmptyResponse,
}

/// Failure of one search, as surfaced to the user.
///
/// `Display` is the localized message and never includes transport detail;
/// the wrapped [`GenerationError`] stays reachable through `source()`.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("{}", messages::EMPTY_TERM)]
    Validation,

    #[error("{}", messages::DEFINITION_UNAVAILABLE)]
    DefinitionUnavailable(#[source] GenerationError),

    #[error("{}", messages::SUMMARY_UNAVAILABLE)]
    SummaryUnavailable(#[source] GenerationError),

    #[error("{}", messages::UNKNOWN_ERROR)]
    Unknown(String),
}

impl LookupError {
    /// Fixed user-facing text for this failure kind.
    pub fn user_message(&self) -> &'static str {
        match self {
            LookupError::Validation => messages::EMPTY_TERM,
            LookupError::DefinitionUnavailable(_) => messages::DEFINITION_UNAVAILABLE,
            LookupError::SummaryUnavailable(_) => messages::SUMMARY_UNAVAILABLE,
            LookupError::Unknown(_) => messages::UNKNOWN_ERROR,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LookupError::Validation)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API_KEY environment variable not set")]
    MissingApiKey,

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_is_the_localized_message() {
        let err = LookupError::DefinitionUnavailable(GenerationError::EmptyResponse);
        assert_eq!(err.to_string(), messages::DEFINITION_UNAVAILABLE);
        assert_eq!(err.to_string(), err.user_message());
    }

    #[test]
    fn transport_detail_stays_behind_source() {
        let err = LookupError::SummaryUnavailable(GenerationError::Remote {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "backend overloaded".to_string(),
        });
        assert!(!err.to_string().contains("overloaded"));
        let source = err.source().expect("wrapped cause");
        assert!(source.to_string().contains("overloaded"));
    }

    #[test]
    fn unknown_hides_its_detail() {
        let err = LookupError::Unknown("task panicked".to_string());
        assert_eq!(err.to_string(), messages::UNKNOWN_ERROR);
    }
}
