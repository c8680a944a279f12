//! Error types and handling infrastructure for actionmap.
//!
//! Library operations return [`ActionError`] through the crate-wide [`Result`] alias.
//! Application callbacks return `anyhow::Result<()>` instead, so handler code can use
//! `?` and `.context(..)` freely; the dispatcher wraps those failures into
//! [`HandlerFailure`](crate::dispatch::HandlerFailure) records.
//!
//! ## Design Principles
//!
//! - **Unbound is not an error**: an action with no matching input simply never fires
//! - **Isolation**: a failing handler is reported, it never aborts the frame
//! - **Boundary validation**: bad hotkey or key names are rejected while loading settings

use crate::action::ActionId;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for actionmap operations.
#[derive(Error, Debug)]
pub enum ActionError {
    /// A hotkey name that is not part of the fixed hotkey enumeration
    #[error("Invalid rebind: unknown hotkey '{name}'")]
    InvalidRebind { name: String },

    /// A physical key name that cannot be mapped to a key code
    #[error("Unknown key name: '{name}'")]
    UnknownKey { name: String },

    /// More than two keys supplied for a single hotkey
    #[error("Too many keys for hotkey '{hotkey}': at most a primary and an alternate")]
    TooManyKeys { hotkey: String },

    /// One or more handlers reported an error while an action was dispatched
    #[error("{count} handler(s) failed during dispatch, first on {action}: {message}")]
    HandlerFailed {
        action: ActionId,
        count: usize,
        message: String,
    },

    /// Keymap file could not be read or written
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Keymap file exists but is malformed
    #[error("Configuration error in {}: {message}", path.display())]
    ConfigError { path: PathBuf, message: String },

    /// Terminal setup or teardown failed
    #[error("UI operation failed: {message}")]
    UIError { message: String },
}

/// Standard Result type for actionmap operations.
pub type Result<T> = std::result::Result<T, ActionError>;

impl ActionError {
    /// Create an InvalidRebind error for an unrecognised hotkey name
    pub fn invalid_rebind(name: impl Into<String>) -> Self {
        Self::InvalidRebind { name: name.into() }
    }

    /// Create an UnknownKey error for an unrecognised key name
    pub fn unknown_key(name: impl Into<String>) -> Self {
        Self::UnknownKey { name: name.into() }
    }

    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Create a ConfigError tied to the offending file
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a UIError with a descriptive message
    pub fn ui(message: impl Into<String>) -> Self {
        Self::UIError {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ActionError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileError {
                message: "File not found".to_string(),
                source: err,
            },
            std::io::ErrorKind::PermissionDenied => Self::FileError {
                message: "Permission denied".to_string(),
                source: err,
            },
            _ => Self::FileError {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let rebind = ActionError::invalid_rebind("jump");
        assert_eq!(rebind.to_string(), "Invalid rebind: unknown hotkey 'jump'");

        let key = ActionError::unknown_key("Hyper");
        assert_eq!(key.to_string(), "Unknown key name: 'Hyper'");

        let failed = ActionError::HandlerFailed {
            action: ActionId::Quit,
            count: 2,
            message: "boom".to_string(),
        };
        assert_eq!(
            failed.to_string(),
            "2 handler(s) failed during dispatch, first on Quit: boom"
        );
    }

    #[test]
    fn test_config_error_mentions_path() {
        let err = ActionError::config("/tmp/keymap.toml", "expected a table");
        assert_eq!(
            err.to_string(),
            "Configuration error in /tmp/keymap.toml: expected a table"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: ActionError = io_err.into();

        match err {
            ActionError::FileError { message, .. } => {
                assert_eq!(message, "Permission denied");
            }
            _ => panic!("Expected FileError variant"),
        }
    }
}
