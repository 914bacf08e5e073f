//! Chat assistant client for the Multi-Domain Intelligence Platform
//!
//! A thin wrapper around an OpenAI-compatible chat completion API. It keeps
//! conversation history, forwards it to the API and returns either the full
//! reply or a stream of tokens. There is no local reasoning here.

pub mod client;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod error;

pub use client::{ChatClient, ChatStream};
pub use config::AssistantConfig;
pub use conversation::{ChatMessage, ChatRole, Conversation};
pub use domain::AssistantDomain;
pub use error::{AssistantError, AssistantResult};
