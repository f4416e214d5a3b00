//! Feature hook error types

use crate::phase::Phase;
use thiserror::Error;

/// Errors a feature hook can report
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Setup work failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Teardown work failed
    #[error("Shutdown failed: {0}")]
    ShutdownFailed(String),

    /// An option value was rejected
    #[error("Invalid value for option '{option}': {message}")]
    InvalidOption {
        /// Option key
        option: String,
        /// Why the value was rejected
        message: String,
    },

    /// Returned by hooks a feature did not override
    #[error("No {0} hook")]
    NotImplemented(Phase),

    /// Anything else a feature bubbles up with `?`
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FeatureError {
    /// Create an initialization failure error
    pub fn init_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    /// Create a shutdown failure error
    pub fn shutdown_failed(msg: impl Into<String>) -> Self {
        Self::ShutdownFailed(msg.into())
    }

    /// Create an invalid option error
    pub fn invalid_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            message: message.into(),
        }
    }
}

/// Result of a single hook invocation
pub type HookResult = std::result::Result<(), FeatureError>;
