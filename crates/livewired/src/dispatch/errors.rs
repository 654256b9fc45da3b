//! Error types for action table construction and handler execution.

use thiserror::Error;

/// Configuration errors detected while building the action table.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Two handlers claim the same action name.
    #[error("action '{action}' registered by both '{first_group}' and '{second_group}'")]
    DuplicateAction {
        action: String,
        first_group: &'static str,
        second_group: &'static str,
    },
}

impl DispatchError {
    /// Creates a duplicate action error.
    pub fn duplicate_action(
        action: impl Into<String>,
        first_group: &'static str,
        second_group: &'static str,
    ) -> Self {
        Self::DuplicateAction {
            action: action.into(),
            first_group,
            second_group,
        }
    }
}

/// Failures a handler reports back to the dispatcher.
///
/// The display text becomes the `error` field of the `EXECUTION_ERROR`
/// response sent to the client.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A required parameter was absent.
    #[error("missing parameter '{name}'")]
    MissingParam { name: String },
    /// A parameter was present but unusable.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParam { name: String, message: String },
    /// Any other failure while touching host state.
    #[error("{message}")]
    Failed { message: String },
}

impl HandlerError {
    /// Creates a missing parameter error.
    pub fn missing_param(name: impl Into<String>) -> Self {
        Self::MissingParam { name: name.into() }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParam {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a generic failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
