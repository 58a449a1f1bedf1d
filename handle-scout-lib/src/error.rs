//! Error handling for handle checking operations.
//!
//! Individual platform failures never show up here: they become
//! [`crate::ProbeResult`]s with an `error` or `unknown` verdict. This type
//! covers what can go wrong around a check (bad input, bad platform
//! definitions, bad configuration, HTTP client setup).

use std::fmt;

/// Main error type for handle checking operations.
#[derive(Debug, Clone)]
pub enum HandleCheckError {
    /// Username fails the length/charset rule
    InvalidUsername {
        username: String,
        reason: String,
    },

    /// A platform definition cannot be used
    InvalidPlatform {
        platform: String,
        reason: String,
    },

    /// Network setup errors (building the HTTP client, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// Configuration errors (invalid settings, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading configuration files
    FileError {
        path: String,
        message: String,
    },
}

impl HandleCheckError {
    /// Create a new invalid username error.
    pub fn invalid_username<U: Into<String>, R: Into<String>>(username: U, reason: R) -> Self {
        Self::InvalidUsername {
            username: username.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid platform error.
    pub fn invalid_platform<P: Into<String>, R: Into<String>>(platform: P, reason: R) -> Self {
        Self::InvalidPlatform {
            platform: platform.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the caller supplied bad input (the 400-equivalent case).
    pub fn is_user_input(&self) -> bool {
        matches!(self, Self::InvalidUsername { .. })
    }
}

impl fmt::Display for HandleCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUsername { username, reason } => {
                write!(f, "Invalid username '{}': {}", username, reason)
            }
            Self::InvalidPlatform { platform, reason } => {
                write!(f, "Invalid platform '{}': {}", platform, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for HandleCheckError {}

impl From<reqwest::Error> for HandleCheckError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_with_source("Failed to create HTTP client", err.to_string())
    }
}

impl From<toml::de::Error> for HandleCheckError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML configuration: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = HandleCheckError::invalid_username("a", "Username must be 2-30 characters");
        assert_eq!(
            err.to_string(),
            "Invalid username 'a': Username must be 2-30 characters"
        );

        let err = HandleCheckError::invalid_platform("GitHub", "duplicate platform name");
        assert_eq!(err.to_string(), "Invalid platform 'GitHub': duplicate platform name");

        let err = HandleCheckError::network_with_source("Failed to create HTTP client", "tls");
        assert!(err.to_string().contains("(source: tls)"));
    }

    #[test]
    fn test_is_user_input() {
        assert!(HandleCheckError::invalid_username("", "Username is required").is_user_input());
        assert!(!HandleCheckError::config("bad").is_user_input());
    }

    #[test]
    fn test_conversions() {
        let reqwest_err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err: HandleCheckError = reqwest_err.into();
        assert!(matches!(err, HandleCheckError::NetworkError { source: Some(_), .. }));

        let toml_err = toml::from_str::<toml::Table>("[unterminated").unwrap_err();
        let err: HandleCheckError = toml_err.into();
        assert!(matches!(err, HandleCheckError::ConfigError { .. }));
    }
}
