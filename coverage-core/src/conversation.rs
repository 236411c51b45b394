//! Caller-owned chat history.
//!
//! A [`Conversation`] is a plain value: [`chat_turn`] takes it by value and hands back
//! the extended copy, so where (and whether) it is stored is the caller's decision.

use serde::{Deserialize, Serialize};

use crate::backend::{CompletionBackend, CompletionRequest, CompletionSettings};
use crate::error::ReportError;
use crate::prompt::{Message, Prompt, Role};
use crate::retry::{RetryPolicy, invoke};

/// User and assistant turns, oldest first. Never holds system messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Message>", into = "Vec<Message>")]
pub struct Conversation {
    turns: Vec<Message>,
}

impl TryFrom<Vec<Message>> for Conversation {
    type Error = ReportError;

    fn try_from(turns: Vec<Message>) -> Result<Self, Self::Error> {
        let mut conversation = Self::new();
        for turn in turns {
            conversation.push(turn)?;
        }
        Ok(conversation)
    }
}

impl From<Conversation> for Vec<Message> {
    fn from(conversation: Conversation) -> Self {
        conversation.turns
    }
}

impl Conversation {
    /// An empty conversation.
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Appends a turn. System messages belong to the prompt, not the history.
    pub fn push(&mut self, message: Message) -> Result<(), ReportError> {
        if message.role() == Role::System {
            return Err(ReportError::config(
                "conversation history cannot contain system messages",
            ));
        }
        self.turns.push(message);
        Ok(())
    }

    /// All turns, oldest first.
    #[must_use]
    pub fn turns(&self) -> &[Message] {
        &self.turns
    }

    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` when no turn was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent `max_turns` turns, or all of them.
    #[must_use]
    pub fn window(&self, max_turns: Option<usize>) -> &[Message] {
        let keep = max_turns.map_or(self.turns.len(), |max| max.min(self.turns.len()));
        &self.turns[self.turns.len() - keep..]
    }

    /// Builds the prompt for the next turn: system framing, windowed history, new input.
    pub fn to_prompt(
        &self,
        system: &str,
        max_turns: Option<usize>,
        user_text: &str,
    ) -> Result<Prompt, ReportError> {
        let history = self.window(max_turns);
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system));
        messages.extend_from_slice(history);
        messages.push(Message::user(user_text));
        Prompt::from_messages(messages)
    }
}

/// Settings for a chat turn.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Sampling settings.
    pub settings: CompletionSettings,
    /// Retry policy for the backend call.
    pub retry: RetryPolicy,
    /// How many past turns to send (default: all).
    pub max_turns: Option<usize>,
}

/// Sends one user turn and returns the extended conversation with the assistant's reply.
///
/// The input conversation is consumed; on error it is dropped and the caller keeps
/// whatever copy it persisted.
pub async fn chat_turn<B>(
    backend: &B,
    mut conversation: Conversation,
    system: &str,
    user_text: &str,
    options: &ChatOptions,
) -> Result<(Conversation, String), ReportError>
where
    B: CompletionBackend + ?Sized,
{
    let prompt = conversation.to_prompt(system, options.max_turns, user_text)?;
    let request = CompletionRequest::new(prompt, options.settings.clone());
    let answer = invoke(backend, &request, &options.retry).await?;

    conversation.turns.push(Message::user(user_text));
    conversation.turns.push(Message::assistant(answer.text.clone()));
    Ok((conversation, answer.text))
}
