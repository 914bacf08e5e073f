//! Per-session chat histories
//!
//! One [`Conversation`] per (session token, domain). Each conversation has its
//! own lock, so a slow completion only blocks further messages of the same
//! session and domain. Entries only exist for sessions that sent a message,
//! and are dropped once their session expires or is closed.

use assistant::{AssistantDomain, AssistantResult, ChatClient, ChatMessage, Conversation};
use chrono::{DateTime, Utc};
use common::{
    error::DatabaseResult,
    session::{SessionContext, SessionRepository},
};
use futures_util::StreamExt;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

type ConversationKey = (Uuid, AssistantDomain);

/// One streamed piece of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyChunk {
    Token(String),
    Failed(String),
}

struct Entry {
    expires_at: DateTime<Utc>,
    conversation: Arc<Mutex<Conversation>>,
}

/// Chat histories of all live sessions
#[derive(Clone, Default)]
pub struct ChatStore {
    conversations: Arc<Mutex<HashMap<ConversationKey, Entry>>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn conversation(
        &self,
        session: &SessionContext,
        domain: AssistantDomain,
    ) -> Arc<Mutex<Conversation>> {
        let mut conversations = self.conversations.lock().await;
        conversations
            .entry((session.token, domain))
            .or_insert_with(|| Entry {
                expires_at: session.expires_at,
                conversation: Arc::new(Mutex::new(domain.conversation())),
            })
            .conversation
            .clone()
    }

    async fn existing(
        &self,
        token: Uuid,
        domain: AssistantDomain,
    ) -> Option<Arc<Mutex<Conversation>>> {
        let conversations = self.conversations.lock().await;
        conversations
            .get(&(token, domain))
            .map(|entry| entry.conversation.clone())
    }

    /// Messages so far, starting with the system prompt
    pub async fn history(&self, token: Uuid, domain: AssistantDomain) -> Vec<ChatMessage> {
        match self.existing(token, domain).await {
            Some(conversation) => conversation.lock().await.history().to_vec(),
            None => domain.conversation().history().to_vec(),
        }
    }

    /// Drop everything but the system prompt
    pub async fn clear(&self, token: Uuid, domain: AssistantDomain) {
        if let Some(conversation) = self.existing(token, domain).await {
            conversation.lock().await.clear();
            info!("Cleared {} chat history", domain);
        }
    }

    /// Send a message and wait for the whole reply
    pub async fn send(
        &self,
        client: &ChatClient,
        session: &SessionContext,
        domain: AssistantDomain,
        message: String,
    ) -> AssistantResult<String> {
        let conversation = self.conversation(session, domain).await;
        let mut conversation = conversation.lock().await;
        conversation.send(client, message).await
    }

    /// Send a message and receive the reply token by token
    ///
    /// The full reply is recorded once the stream finishes. A reply that fails
    /// midway is not recorded; the user message stays either way.
    pub async fn stream(
        &self,
        client: &ChatClient,
        session: &SessionContext,
        domain: AssistantDomain,
        message: String,
    ) -> AssistantResult<mpsc::Receiver<ReplyChunk>> {
        let conversation = self.conversation(session, domain).await;
        let mut conversation = conversation.lock_owned().await;

        conversation.push_user(message);
        let mut tokens = client.stream(conversation.history()).await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut reply = String::new();
            while let Some(item) = tokens.next().await {
                match item {
                    Ok(token) => {
                        reply.push_str(&token);
                        // Keep draining even if the client went away
                        let _ = tx.send(ReplyChunk::Token(token)).await;
                    }
                    Err(e) => {
                        warn!("{} reply stream failed: {}", domain, e);
                        let _ = tx.send(ReplyChunk::Failed(e.to_string())).await;
                        return;
                    }
                }
            }
            conversation.push_assistant(reply);
        });

        Ok(rx)
    }

    /// Drop every conversation of a session, returning how many went
    pub async fn forget(&self, token: Uuid) -> usize {
        let mut conversations = self.conversations.lock().await;
        let before = conversations.len();
        conversations.retain(|(held, _), _| *held != token);
        before - conversations.len()
    }

    /// Drop conversations of sessions that expired or were closed
    pub async fn prune(&self, sessions: &SessionRepository) -> DatabaseResult<usize> {
        let now = Utc::now();
        let (mut dropped, tokens) = {
            let mut conversations = self.conversations.lock().await;
            let before = conversations.len();
            conversations.retain(|_, entry| entry.expires_at > now);
            let tokens: HashSet<Uuid> = conversations.keys().map(|(token, _)| *token).collect();
            (before - conversations.len(), tokens)
        };

        for token in tokens {
            if sessions.resolve(token).await?.is_none() {
                dropped += self.forget(token).await;
            }
        }

        if dropped > 0 {
            debug!("Dropped {} conversations of closed sessions", dropped);
        }
        Ok(dropped)
    }

    /// Number of conversations held
    pub(crate) async fn len(&self) -> usize {
        self.conversations.lock().await.len()
    }
}
