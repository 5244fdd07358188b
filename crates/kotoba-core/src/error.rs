use thiserror::Error;

/// Errors that can occur during Kotoba core operations.
#[derive(Debug, Error)]
pub enum KotobaError {
    /// An outcome label does not follow the shape a span codec expects.
    #[error("malformed outcome label {outcome:?} at position {position}")]
    MalformedOutcome {
        /// The offending label.
        outcome: String,
        /// Token position of the label.
        position: usize,
    },

    /// A model's outcome inventory cannot be decoded by the configured codec.
    #[error("model outcomes are not compatible with the {codec} codec: {outcomes:?}")]
    IncompatibleOutcomes {
        /// Codec name.
        codec: &'static str,
        /// The outcome labels that were rejected.
        outcomes: Vec<String>,
    },

    /// Every candidate continuation was rejected by the sequence validator.
    #[error("no valid continuation at position {position}")]
    EmptyBeam {
        /// Token position where the beam ran dry.
        position: usize,
    },

    /// A caller-supplied argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two parallel inputs have different lengths.
    #[error("length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        /// What was being compared.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
}

/// Result type alias for Kotoba operations.
pub type Result<T> = std::result::Result<T, KotobaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = KotobaError::MalformedOutcome {
            outcome: "B-PER".into(),
            position: 3,
        };
        assert_eq!(
            err.to_string(),
            "malformed outcome label \"B-PER\" at position 3"
        );

        let err = KotobaError::EmptyBeam { position: 2 };
        assert!(err.to_string().contains("position 2"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KotobaError>();
    }
}
