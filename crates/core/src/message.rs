//! Conversation messages.
//!
//! Messages serialize to the chat-completion wire shape, so the history can
//! be sent to the model as-is.

use serde::{Deserialize, Serialize};

/// A single entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
    /// Result of a function call. Always carries the function name.
    Function { name: String, content: String },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
        }
    }

    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Function {
            name: name.into(),
            content: content.into(),
        }
    }

    /// The textual content, whatever the role.
    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content }
            | Self::Function { content, .. } => content,
        }
    }

    /// The role name as it appears on the wire.
    pub fn role(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::Function { .. } => "function",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn function_message_uses_wire_shape() {
        let msg = Message::function("transliterate", "chéngběn hěn dī");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "function", "name": "transliterate", "content": "chéngběn hěn dī"})
        );
    }

    #[test]
    fn function_message_without_name_is_rejected() {
        let parsed: Result<Message, _> =
            serde_json::from_value(json!({"role": "function", "content": "orphan"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn role_and_content_accessors() {
        let msg = Message::user("成本很低");
        assert_eq!(msg.role(), "user");
        assert_eq!(msg.content(), "成本很低");
    }
}
