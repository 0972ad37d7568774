use std::fmt;

/// Error types for grafana2jsonnet operations
#[derive(Debug)]
pub enum TransformError {
    /// IO error (file operations, etc.)
    Io(std::io::Error),

    /// Input text is not well-formed JSON
    Parse(serde_json::Error),

    /// Configuration error
    Config(String),

    /// TOML parsing error
    TomlParsing(toml::de::Error),

    /// Regex compilation error
    Regex(regex::Error),

    /// File not found error
    FileNotFound(String),

    /// Output path already exists and overwriting was not requested
    OutputExists(String),

    /// Invalid argument error
    InvalidArgument(String),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::Io(err) => write!(f, "IO error: {err}"),
            TransformError::Parse(err) => write!(f, "Failed to parse JSON: {err}"),
            TransformError::Config(msg) => write!(f, "Configuration error: {msg}"),
            TransformError::TomlParsing(err) => write!(f, "TOML parsing error: {err}"),
            TransformError::Regex(err) => write!(f, "Regex error: {err}"),
            TransformError::FileNotFound(path) => write!(f, "File not found: {path}"),
            TransformError::OutputExists(path) => write!(f, "Output file exists: {path}"),
            TransformError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransformError::Io(err) => Some(err),
            TransformError::Parse(err) => Some(err),
            TransformError::TomlParsing(err) => Some(err),
            TransformError::Regex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransformError {
    fn from(err: std::io::Error) -> Self {
        TransformError::Io(err)
    }
}

impl From<serde_json::Error> for TransformError {
    fn from(err: serde_json::Error) -> Self {
        TransformError::Parse(err)
    }
}

impl From<toml::de::Error> for TransformError {
    fn from(err: toml::de::Error) -> Self {
        TransformError::TomlParsing(err)
    }
}

impl From<regex::Error> for TransformError {
    fn from(err: regex::Error) -> Self {
        TransformError::Regex(err)
    }
}

/// Type alias for Results using TransformError
pub type Result<T> = std::result::Result<T, TransformError>;
