//! Error types for Segue

use thiserror::Error;

/// Main error type for Segue operations
#[derive(Debug, Error)]
pub enum SegueError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    /// HTML parsing / extraction errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    /// Container binding errors
    #[error("Bind error: {0}")]
    Bind(#[from] BindError),
    /// Option validation errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Network-specific errors
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection timed out
    #[error("request timed out")]
    Timeout,
    /// HTTP error with status code
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    /// Transport could not complete the exchange
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Rendering-specific errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// HTML parsing error
    #[error("HTML parse failed: {0}")]
    HtmlParse(String),
}

/// Reasons a container cannot be bound to a controller
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    /// Containers are addressed by id in responses and history entries
    #[error("every container needs an id")]
    MissingId,
    /// `html` and `body` cannot be containers
    #[error("the container cannot be the <{0}> element")]
    UnsupportedTag(String),
    /// A live controller already owns this id
    #[error("container #{0} is already bound")]
    AlreadyBound(String),
}

/// Option validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Selector string could not be parsed
    #[error("invalid selector: {0:?}")]
    InvalidSelector(String),
    /// `href_regex` is not a valid regular expression
    #[error("invalid href pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    /// Settings document is not valid JSON for the option set
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience Result type for Segue operations
pub type Result<T> = std::result::Result<T, SegueError>;
