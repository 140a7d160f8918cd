//! Error types for baker-git

/// Result type for baker-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in baker-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("Reference '{spec}' not found")]
    RefNotFound { spec: String },

    #[error("Cannot fast-forward: {message}")]
    CannotFastForward { message: String },

    #[error("Merge conflict: {message}")]
    MergeConflict { message: String },

    #[error("Push of {refname} rejected: {message}")]
    PushRejected { refname: String, message: String },
}

impl Error {
    /// Whether this error means the histories could not be reconciled
    /// without manual intervention.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::CannotFastForward { .. } | Self::MergeConflict { .. }
        )
    }
}
