//! Response envelopes.
//!
//! A response is modelled as an identifier plus an [`Outcome`] so the success
//! and failure shapes cannot be mixed. Serialisation goes through a flat
//! private frame that matches the JSON envelope clients expect.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use strum::{AsRefStr, Display};

/// Structured error codes carried by failure envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No handler is registered for the requested action.
    UnknownAction,
    /// The handler returned an error.
    ExecutionError,
    /// The host did not process the command within the wait bound.
    Timeout,
    /// The handler failed abnormally (panicked).
    HandlerError,
    /// A code this build does not recognise, or none at all.
    #[serde(other)]
    Unknown,
}

/// Result of executing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The handler produced a value.
    Success(Value),
    /// Execution failed; `error` is human readable.
    Failure {
        /// Failure message.
        error: String,
        /// Machine readable classification.
        code: ErrorCode,
    },
}

impl Outcome {
    /// Builds a failure outcome.
    pub fn failure(code: ErrorCode, error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
            code,
        }
    }
}

/// The result or structured error correlated to one command by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Identifier of the originating command.
    pub id: String,
    /// What happened.
    pub outcome: Outcome,
}

impl Response {
    /// Creates a response from an identifier and outcome.
    pub fn new(id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            id: id.into(),
            outcome,
        }
    }

    /// Creates a success response.
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self::new(id, Outcome::Success(result))
    }

    /// Creates a failure response.
    pub fn failure(id: impl Into<String>, code: ErrorCode, error: impl Into<String>) -> Self {
        Self::new(id, Outcome::failure(code, error))
    }

    /// Returns `true` for success envelopes.
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// Returns the failure code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure { code, .. } => Some(*code),
        }
    }
}

#[derive(Serialize)]
struct FrameOut<'a> {
    id: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
}

#[derive(Deserialize)]
struct FrameIn {
    id: String,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<ErrorCode>,
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let frame = match &self.outcome {
            Outcome::Success(result) => FrameOut {
                id: &self.id,
                ok: true,
                result: Some(result),
                error: None,
                code: None,
            },
            Outcome::Failure { error, code } => FrameOut {
                id: &self.id,
                ok: false,
                result: None,
                error: Some(error),
                code: Some(*code),
            },
        };
        frame.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let frame = FrameIn::deserialize(deserializer)?;
        let outcome = if frame.ok {
            Outcome::Success(frame.result)
        } else {
            Outcome::Failure {
                error: frame
                    .error
                    .unwrap_or_else(|| "unknown error from host".to_owned()),
                code: frame.code.unwrap_or(ErrorCode::Unknown),
            }
        };
        Ok(Self {
            id: frame.id,
            outcome,
        })
    }
}
