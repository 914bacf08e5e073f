//! HTTP client for an OpenAI-compatible chat completion API
//!
//! Supports a single blocking completion and a token stream read from
//! Server-Sent Events.

use futures_util::{Stream, StreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::{
    config::AssistantConfig,
    conversation::ChatMessage,
    error::{AssistantError, AssistantResult},
};

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Incremental tokens of one completion
pub struct ChatStream {
    rx: mpsc::Receiver<AssistantResult<String>>,
}

impl Stream for ChatStream {
    type Item = AssistantResult<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// What one SSE event carried
#[derive(Debug, PartialEq, Eq)]
enum SseData {
    Token(String),
    Done,
    Empty,
}

/// Chat completion client
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: AssistantConfig,
}

impl ChatClient {
    pub fn new(config: AssistantConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Request a complete reply for the given history
    pub async fn complete(&self, history: &[ChatMessage]) -> AssistantResult<String> {
        info!(
            "Requesting completion ({} messages, model {})",
            history.len(),
            self.config.model
        );

        let response = self.post(history, false).await?;
        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| AssistantError::Parse("response has no choices".to_string()))
    }

    /// Request a streamed reply for the given history
    pub async fn stream(&self, history: &[ChatMessage]) -> AssistantResult<ChatStream> {
        info!(
            "Requesting streamed completion ({} messages, model {})",
            history.len(),
            self.config.model
        );

        let response = self.post(history, true).await?;
        let (tx, rx) = mpsc::channel(64);

        let stream = response.bytes_stream();
        tokio::spawn(async move {
            if let Err(e) = Self::process_stream(stream, tx.clone()).await {
                error!("Completion stream failed: {}", e);
                let _ = tx.send(Err(e)).await;
            }
        });

        Ok(ChatStream { rx })
    }

    async fn post(
        &self,
        history: &[ChatMessage],
        stream: bool,
    ) -> AssistantResult<reqwest::Response> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
                .map_err(|_| AssistantError::NotConfigured)?,
        );

        let request = CompletionRequest {
            model: &self.config.model,
            messages: history,
            stream,
        };

        let response = self
            .http
            .post(self.config.completions_url())
            .headers(headers)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            error!("Completion API returned {}: {}", status, message);
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn process_stream<S, B>(
        mut stream: S,
        tx: mpsc::Sender<AssistantResult<String>>,
    ) -> AssistantResult<()>
    where
        S: Stream<Item = Result<B, reqwest::Error>> + Unpin,
        B: AsRef<[u8]>,
    {
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.extend_from_slice(chunk.as_ref());

            while let Some(event) = extract_sse_event(&mut buffer) {
                match parse_sse_event(&event?)? {
                    SseData::Token(token) => {
                        if tx.send(Ok(token)).await.is_err() {
                            return Ok(());
                        }
                    }
                    SseData::Done => return Ok(()),
                    SseData::Empty => {}
                }
            }
        }

        Ok(())
    }
}

/// Split the first complete event off the buffer
///
/// Bytes are only decoded once the whole event has arrived, so a character
/// split across network chunks stays intact.
fn extract_sse_event(buffer: &mut Vec<u8>) -> Option<AssistantResult<String>> {
    if buffer.contains(&b'\r') {
        buffer.retain(|b| *b != b'\r');
    }

    let pos = buffer.windows(2).position(|w| w == b"\n\n")?;
    let event: Vec<u8> = buffer.drain(..pos + 2).take(pos).collect();
    Some(
        String::from_utf8(event)
            .map_err(|e| AssistantError::Parse(format!("Stream event is not UTF-8: {}", e))),
    )
}

fn parse_sse_event(event: &str) -> AssistantResult<SseData> {
    let mut data = String::new();
    for line in event.lines() {
        if let Some(value) = line.strip_prefix("data:") {
            data.push_str(value.trim_start());
        }
    }

    if data.is_empty() {
        return Ok(SseData::Empty);
    }
    if data == "[DONE]" {
        return Ok(SseData::Done);
    }

    let chunk: StreamChunk = serde_json::from_str(&data)
        .map_err(|e| AssistantError::Parse(format!("Failed to parse stream chunk: {}", e)))?;

    let token: String = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();

    if token.is_empty() {
        Ok(SseData::Empty)
    } else {
        Ok(SseData::Token(token))
    }
}
