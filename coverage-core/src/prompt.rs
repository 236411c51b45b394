//! Role-tagged prompt model.
//!
//! A [`Prompt`] always starts with exactly one [`Role::System`] message that frames
//! the task. [`Prompt::new`] guarantees this by construction; [`Prompt::from_messages`]
//! checks it for message lists assembled elsewhere.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Author of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Task framing.
    System,
    /// End-user input.
    User,
    /// A previous model answer.
    Assistant,
    /// Output of a tool or function call.
    Tool,
}

impl Role {
    /// Lowercase wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable (role, text) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Creates a message with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Creates a tool message.
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content)
    }

    /// The author of this message.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// The text of this message.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered messages sent to a backend in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    messages: Vec<Message>,
}

impl Prompt {
    /// Starts a prompt with its system framing.
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system)],
        }
    }

    /// Builds a prompt from an existing message list.
    ///
    /// The list must start with a single system message and contain no other.
    pub fn from_messages(messages: Vec<Message>) -> Result<Self, ReportError> {
        match messages.first() {
            None => return Err(ReportError::config("prompt must not be empty")),
            Some(first) if first.role != Role::System => {
                return Err(ReportError::config(format!(
                    "prompt must start with a system message, found {}",
                    first.role
                )));
            }
            Some(_) => {}
        }

        if messages[1..].iter().any(|m| m.role == Role::System) {
            return Err(ReportError::config(
                "prompt must contain exactly one system message",
            ));
        }

        Ok(Self { messages })
    }

    /// Appends a non-system message.
    pub fn push(&mut self, message: Message) -> Result<(), ReportError> {
        if message.role == Role::System {
            return Err(ReportError::config(
                "prompt must contain exactly one system message",
            ));
        }
        self.messages.push(message);
        Ok(())
    }

    /// Appends a user message.
    #[must_use]
    pub fn with_user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Appends an assistant message.
    #[must_use]
    pub fn with_assistant(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    /// Appends a tool message.
    #[must_use]
    pub fn with_tool(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::tool(content));
        self
    }

    /// All messages, system framing first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The system framing text.
    #[must_use]
    pub fn system(&self) -> &str {
        self.messages.first().map_or("", Message::content)
    }

    /// Number of messages including the system framing.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always `false`; a prompt carries at least its system message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Total characters across all message contents.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_prompt_leads_with_system() {
        let prompt = Prompt::new("frame").with_user("hello").with_assistant("hi");
        assert_eq!(prompt.len(), 3);
        assert_eq!(prompt.system(), "frame");
        assert_eq!(prompt.messages()[0].role(), Role::System);
        assert_eq!(prompt.messages()[2].content(), "hi");
    }

    #[test]
    fn test_from_messages_rejects_missing_system() {
        let err = Prompt::from_messages(vec![Message::user("hi")]).unwrap_err();
        assert!(err.to_string().contains("must start with a system message"));
    }

    #[test]
    fn test_from_messages_rejects_second_system() {
        let err = Prompt::from_messages(vec![
            Message::system("a"),
            Message::user("hi"),
            Message::system("b"),
        ])
        .unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_from_messages_rejects_empty() {
        assert!(Prompt::from_messages(Vec::new()).is_err());
    }

    #[test]
    fn test_push_refuses_system_role() {
        let mut prompt = Prompt::new("frame");
        assert!(prompt.push(Message::tool("result")).is_ok());
        assert!(prompt.push(Message::system("again")).is_err());
        assert_eq!(prompt.len(), 2);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }
}
