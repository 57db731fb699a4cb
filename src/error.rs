#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Type mismatch for key '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),

    #[error("Request to {url} failed with status code: {status}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("panic occurred {0}")]
    TaskPanicked(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn type_mismatch<S: Into<String>>(
        key: S,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        AppError::TypeMismatch {
            key: key.into(),
            expected,
            found,
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        AppError::ConfigError(message.into())
    }

    /// Whether the error comes from a caller bug rather than the environment.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            AppError::TypeMismatch { .. } | AppError::TaskPanicked(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
