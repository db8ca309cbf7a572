//! Error types for cohort-core operations

use cohort_backends::BackendError;

/// Result type for cohort-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cohort-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Overprovision factor that cannot size a slot pool
    #[error("Invalid overprovision factor: {0} (must be finite and > 0)")]
    InvalidOverprovision(f64),

    /// Scalar storage that cannot be viewed as packs
    #[error("Cannot view {len} scalars as packs of {width}: {reason}")]
    PackCast { len: usize, width: usize, reason: String },

    /// Reduction mode name that is not recognised
    #[error("Unknown reduction mode: {0:?} (expected \"ordered\" or \"tree\")")]
    InvalidReductionMode(String),

    /// Backend error (policy shape, device profile, launcher)
    #[error(transparent)]
    Backend(#[from] BackendError),
}
