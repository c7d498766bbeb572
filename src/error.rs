//! Error types shared across the bot.
//!
//! Configuration errors live with the config loader in [`crate::config`].

use thiserror::Error;

// ============================================================================
// Plugin loading
// ============================================================================

/// Errors raised while resolving or constructing a plugin.
///
/// [`crate::plugins::PluginRegistry::load_plugin`] returns these to the caller;
/// the batch loader logs and skips them.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("plugin {0} is not registered")]
    NotFound(String),

    #[error("plugin {0} is already registered")]
    Duplicate(String),

    #[error("plugin name must not be empty")]
    EmptyName,

    #[error("plugin {name} failed to initialize: {reason}")]
    Init { name: String, reason: String },
}

impl LoadError {
    /// Shorthand for a factory failure.
    pub fn init(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Init {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Connection
// ============================================================================

/// Errors surfaced by the IRC connection collaborator.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection closed")]
    Closed,

    #[error("cannot join {channel}: {reason}")]
    JoinRejected { channel: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_messages() {
        assert_eq!(
            LoadError::NotFound("weather".into()).to_string(),
            "plugin weather is not registered"
        );
        assert_eq!(
            LoadError::init("dice", "bad regex").to_string(),
            "plugin dice failed to initialize: bad regex"
        );
    }

    #[test]
    fn join_rejected_message() {
        let err = ConnectionError::JoinRejected {
            channel: "#secret".into(),
            reason: "Cannot join channel (+i)".into(),
        };
        assert_eq!(err.to_string(), "cannot join #secret: Cannot join channel (+i)");
    }
}
