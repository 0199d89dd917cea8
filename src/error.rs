use thiserror::Error;

/// Main error type for the PDSP pipeline
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Page provider failed: {message}")]
    Provider {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File I/O error: {path}")]
    FileIO {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid input directory: {path}")]
    InvalidInput { path: String },

    #[error("Pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(#[from] anyhow::Error),
}

impl SpecError {
    /// Create a provider error with context
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Create a provider error with source
    pub fn provider_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Provider {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a file I/O error
    pub fn file_io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileIO {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if error is recoverable (the batch can move on to the next document)
    pub fn is_recoverable(&self) -> bool {
        match self {
            SpecError::Provider { .. } => true,
            SpecError::FileIO { .. } => true,
            SpecError::InvalidInput { .. } => false,
            SpecError::Configuration { .. } => false,
            SpecError::Pattern(_) => false,
            _ => true,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SpecError::Provider { .. } => {
                "Couldn't read this document. It might be encrypted, scanned or corrupted.".to_string()
            }
            SpecError::FileIO { path, .. } => {
                format!("File access error for {}. Check permissions and disk space.", path)
            }
            SpecError::InvalidInput { path } => {
                format!("{} is not a readable directory of datasheets.", path)
            }
            SpecError::Configuration { message } => {
                format!("Configuration problem: {}", message)
            }
            _ => "Something went wrong. Check the logs for details.".to_string(),
        }
    }
}

/// Result type alias for convenience
pub type SpecResult<T> = Result<T, SpecError>;
