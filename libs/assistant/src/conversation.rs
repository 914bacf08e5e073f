//! Conversation history kept for one assistant

use serde::{Deserialize, Serialize};

use crate::{client::ChatClient, error::AssistantResult};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One entry of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered message history, always led by the system prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.messages[0].content
    }

    /// Replace the system prompt, keeping the rest of the history
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.messages[0] = ChatMessage::system(prompt);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Drop everything except the system prompt
    pub fn clear(&mut self) {
        self.messages.truncate(1);
    }

    /// Send a user message and record the assistant's reply
    ///
    /// On failure the user message stays in the history so it can be retried.
    pub async fn send(
        &mut self,
        client: &ChatClient,
        message: impl Into<String>,
    ) -> AssistantResult<String> {
        self.push_user(message);
        let reply = client.complete(&self.messages).await?;
        self.push_assistant(reply.clone());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_keeps_system_prompt() {
        let mut conversation = Conversation::new("You are a helpful assistant.");
        conversation.push_user("hi");
        conversation.push_assistant("hello");

        conversation.clear();

        assert_eq!(
            conversation.history(),
            &[ChatMessage::system("You are a helpful assistant.")]
        );
    }

    #[test]
    fn test_set_system_prompt_replaces_first_message() {
        let mut conversation = Conversation::new("old");
        conversation.push_user("question");

        conversation.set_system_prompt("new");

        assert_eq!(conversation.system_prompt(), "new");
        assert_eq!(conversation.history().len(), 2);
        assert_eq!(conversation.history()[1], ChatMessage::user("question"));
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "ok"}));
    }
}
