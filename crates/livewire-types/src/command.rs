//! Client requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters forwarded verbatim to an action handler.
pub type Params = Map<String, Value>;

/// A parsed client request awaiting execution.
///
/// `id` is optional on the wire: the bridge assigns one when a client omits
/// it. A missing `action` deserialises as the empty string, which the
/// dispatcher reports as an unknown action rather than dropping the line.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Command {
    /// Correlation identifier echoed in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Action name looked up in the dispatcher.
    #[serde(default)]
    pub action: String,
    /// Action parameters.
    #[serde(default)]
    pub params: Params,
}

impl Command {
    /// Builds a command with an explicit identifier.
    pub fn new(id: impl Into<String>, action: impl Into<String>, params: Params) -> Self {
        Self {
            id: Some(id.into()),
            action: action.into(),
            params,
        }
    }

    /// Returns the identifier, if the client supplied one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let command: Command = serde_json::from_str("{}").expect("parse empty object");
        assert_eq!(command.id(), None);
        assert!(command.action.is_empty());
        assert!(command.params.is_empty());
    }

    #[test]
    fn params_must_be_an_object() {
        let result = serde_json::from_str::<Command>(r#"{"action":"ping","params":[1,2]}"#);
        assert!(result.is_err());
    }
}
