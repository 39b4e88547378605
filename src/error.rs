use thiserror::Error;

/// Main error type for regfuse
#[derive(Error, Debug)]
pub enum RegfuseError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model API errors (chat completions)
    #[error("Model API error: {0}")]
    Model(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Parse errors (model output or external source payloads)
    #[error("Parse error: {0}")]
    Parse(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient Result type using RegfuseError
pub type Result<T> = std::result::Result<T, RegfuseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegfuseError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RegfuseError = io_err.into();
        assert!(matches!(err, RegfuseError::Io(_)));
    }
}
