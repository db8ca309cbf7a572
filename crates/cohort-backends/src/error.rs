//! Error types for backend operations

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors raised while describing a device or launching a league
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// League or team size of zero
    #[error("invalid team policy: league_size={league_size}, team_size={team_size} (both must be >= 1)")]
    InvalidTeamPolicy { league_size: usize, team_size: usize },

    /// Device profile setting that cannot be honoured
    #[error("invalid device profile: {0}")]
    InvalidDeviceProfile(String),

    /// The launcher's worker pool could not be created
    #[error("failed to build launcher thread pool: {0}")]
    ThreadPool(String),
}

impl BackendError {
    /// Create an invalid device profile error
    pub fn invalid_device(msg: impl Into<String>) -> Self {
        Self::InvalidDeviceProfile(msg.into())
    }
}
