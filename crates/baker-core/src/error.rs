//! Error types for baker-core

/// Result type for baker-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in baker-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration is missing, unreadable or invalid
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Component is not registered for the namespace
    #[error("Component {namespace}/{component} is not configured")]
    UnknownComponent { namespace: String, component: String },

    /// Namespace has no implementation for the requested operation
    #[error("Namespace '{namespace}' is not supported")]
    UnsupportedNamespace { namespace: String },

    /// A retried operation failed on every attempt
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// A cache manifest line matched neither line grammar
    #[error("Malformed sources line {line}: '{content}'")]
    ManifestFormat { line: usize, content: String },

    /// Downstream and upstream histories could not be reconciled
    #[error("Cannot reconcile {component}: {source}")]
    Reconciliation {
        component: String,
        #[source]
        source: baker_git::Error,
    },

    /// The build system rejected the configured credentials
    #[error("Authentication with profile '{profile}' failed: {message}")]
    Authentication { profile: String, message: String },

    /// The build system did not accept the build request
    #[error("Build submission failed: {message}")]
    BuildSubmission { message: String },

    /// The lookaside cache answered unexpectedly
    #[error("Lookaside cache error: {message}")]
    Cache { message: String },

    /// An inbound message could not be interpreted
    #[error("Invalid message: {message}")]
    Event { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from baker-fs
    #[error(transparent)]
    Fs(#[from] baker_fs::Error),

    /// Version-control error from baker-git
    #[error(transparent)]
    Git(#[from] baker_git::Error),

    /// HTTP transport error
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Innermost error behind retry wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::RetriesExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
