use kotoba_core::KotobaError;
use thiserror::Error;

/// Errors raised while preparing data for, or running, model training.
#[derive(Debug, Error)]
pub enum TrainerError {
    /// The worker count must be at least one.
    #[error("thread count must be at least 1, got {0}")]
    InvalidThreadCount(usize),

    /// The indexed training arrays disagree with each other.
    #[error("inconsistent training data: {0}")]
    InconsistentData(String),

    /// A training option could not be parsed or is out of range.
    #[error("invalid training parameter {name}: {reason}")]
    InvalidParameter {
        /// Option name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The requested training algorithm is not implemented.
    #[error("unsupported training algorithm: {0:?}")]
    UnsupportedAlgorithm(String),

    /// No event survived indexing.
    #[error("no training events left after indexing")]
    EmptyTrainingData,

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// An error from the decoding core (codecs, model assembly).
    #[error(transparent)]
    Core(#[from] KotobaError),
}

/// Result type alias for training operations.
pub type Result<T> = std::result::Result<T, TrainerError>;
