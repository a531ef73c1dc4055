//! Error types for Parley.

use thiserror::Error;

/// Primary error type for all Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Tool execution error: {tool_name} — {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Adapter error: {adapter} — {message}")]
    Adapter { adapter: String, message: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Recording error: {0}")]
    Recording(String),

    #[error("Operation aborted")]
    Aborted,
}

impl ParleyError {
    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create an adapter error.
    pub fn adapter(adapter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Adapter {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from a cooperative abort.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Message suitable for in-band reporting (tool results, `RUN_ERROR` chunks).
    ///
    /// Tool errors report only their message, without the variant prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::ToolExecution { message, .. } => message.clone(),
            Self::Adapter { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParleyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_error_user_message_drops_prefix() {
        let err = ParleyError::tool("getWeather", "city not found");
        assert_eq!(err.user_message(), "city not found");
        assert!(err.to_string().starts_with("Tool execution error: getWeather"));
    }

    #[test]
    fn aborted_is_detected() {
        assert!(ParleyError::Aborted.is_aborted());
        assert!(!ParleyError::Stream("x".into()).is_aborted());
    }
}
