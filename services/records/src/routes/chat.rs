//! Chat assistant routes
//!
//! Histories are keyed by the caller's session token, so two sessions of the
//! same user keep separate conversations.

use assistant::AssistantDomain;
use axum::{
    Extension, Json,
    extract::{Path, State},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use common::{authz::Action, session::SessionContext};
use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::{
    chat::ReplyChunk,
    error::{RecordsError, RecordsResult},
    state::AppState,
};

/// Request for a chat message
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
    /// Answer as `text/event-stream`, one event per token
    #[serde(default)]
    pub stream: bool,
}

fn parse_domain(raw: &str) -> RecordsResult<AssistantDomain> {
    raw.parse()
        .map_err(|_| RecordsError::NotFound(format!("Assistant {}", raw)))
}

fn sse_events(
    rx: mpsc::Receiver<ReplyChunk>,
) -> impl futures_util::Stream<Item = Result<Event, axum::Error>> {
    let chunks = stream::unfold(rx, |mut rx| async move {
        let event = match rx.recv().await? {
            ReplyChunk::Token(token) => Event::default().json_data(json!({"token": token})),
            ReplyChunk::Failed(message) => Event::default()
                .event("error")
                .json_data(json!({"error": message})),
        };
        Some((event, rx))
    });

    chunks.chain(stream::once(async {
        Ok(Event::default().event("done").data("[DONE]"))
    }))
}

/// Send a message to a domain assistant
pub async fn send_message(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(domain): Path<String>,
    Json(payload): Json<MessageRequest>,
) -> RecordsResult<Response> {
    session.require(Action::UseAssistant)?;
    let domain = parse_domain(&domain)?;

    if payload.message.trim().is_empty() {
        return Err(RecordsError::BadRequest("message is required".to_string()));
    }
    let client = state
        .assistant
        .as_ref()
        .ok_or(RecordsError::AssistantUnavailable)?;

    if payload.stream {
        let rx = state
            .chats
            .stream(client, &session, domain, payload.message)
            .await?;
        return Ok(Sse::new(sse_events(rx))
            .keep_alive(KeepAlive::default())
            .into_response());
    }

    let reply = state
        .chats
        .send(client, &session, domain, payload.message)
        .await?;

    Ok(Json(json!({"domain": domain, "reply": reply})).into_response())
}

/// Conversation so far, system prompt first
pub async fn get_history(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(domain): Path<String>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::UseAssistant)?;
    let domain = parse_domain(&domain)?;

    Ok(Json(state.chats.history(session.token, domain).await))
}

/// Forget the conversation, keeping the system prompt
pub async fn clear_history(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(domain): Path<String>,
) -> RecordsResult<impl IntoResponse> {
    session.require(Action::UseAssistant)?;
    let domain = parse_domain(&domain)?;

    state.chats.clear(session.token, domain).await;
    Ok(Json(json!({"cleared": true})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{
        create_router,
        tests::{call, test_app, test_state},
    };
    use uuid::Uuid;
    use assistant::{AssistantConfig, ChatClient};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    fn client_for(server: &MockServer) -> ChatClient {
        let mut config = AssistantConfig::new("sk-test");
        config.base_url = format!("{}/v1", server.uri());
        ChatClient::new(config)
    }

    #[tokio::test]
    async fn test_unconfigured_assistant_is_unavailable() {
        let (app, token) = test_app(None).await;

        let (status, body) = call(
            &app,
            "POST",
            "/assistant/tickets/messages",
            Some(&token),
            json!({"message": "hello"}),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "assistant_unavailable");

        // The history still shows the system prompt
        let (status, body) = call(&app, "GET", "/assistant/tickets/history", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["role"], "system");
    }

    #[tokio::test]
    async fn test_unknown_domain_is_not_found() {
        let (app, token) = test_app(None).await;
        let (status, _) = call(&app, "GET", "/assistant/finance/history", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_message_round_trip_and_clear() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Check the SPF record."}}]
            })))
            .mount(&server)
            .await;

        let (app, token) = test_app(Some(client_for(&server))).await;

        let (status, body) = call(
            &app,
            "POST",
            "/assistant/cyber-security/messages",
            Some(&token),
            json!({"message": "Is this phishing?"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Check the SPF record.");
        assert_eq!(body["domain"], "cyber-security");

        let (_, body) = call(&app, "GET", "/assistant/cyber-security/history", Some(&token), Value::Null).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[1], json!({"role": "user", "content": "Is this phishing?"}));

        // Other domains have their own history
        let (_, body) = call(&app, "GET", "/assistant/datasets/history", Some(&token), Value::Null).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = call(&app, "DELETE", "/assistant/cyber-security/history", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, "GET", "/assistant/cyber-security/history", Some(&token), Value::Null).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_streamed_message_is_event_stream() {
        let server = MockServer::start().await;
        let body = [
            format!("data: {}\n\n", json!({"choices": [{"delta": {"content": "Reset"}}]})),
            format!("data: {}\n\n", json!({"choices": [{"delta": {"content": " it"}}]})),
            "data: [DONE]\n\n".to_string(),
        ]
        .concat();
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let (app, token) = test_app(Some(client_for(&server))).await;

        let request = Request::builder()
            .method("POST")
            .uri("/assistant/tickets/messages")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(
                json!({"message": "Laptop frozen", "stream": true}).to_string(),
            ))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains(r#"{"token":"Reset"}"#));
        assert!(text.contains(r#"{"token":" it"}"#));
        assert!(text.contains("[DONE]"));

        let (_, history) = call(&app, "GET", "/assistant/tickets/history", Some(&token), Value::Null).await;
        assert_eq!(history[2], json!({"role": "assistant", "content": "Reset it"}));
    }

    #[tokio::test]
    async fn test_closed_session_drops_its_histories() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Rotate the key."}}]
            })))
            .mount(&server)
            .await;

        let (state, token) = test_state(Some(client_for(&server))).await;
        let app = create_router(state.clone());

        let (status, _) = call(
            &app,
            "POST",
            "/assistant/datasets/messages",
            Some(&token),
            json!({"message": "Who can read this bucket?"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.chats.len().await, 1);

        state
            .sessions
            .delete(Uuid::parse_str(&token).unwrap())
            .await
            .unwrap();

        let (status, _) = call(&app, "GET", "/assistant/datasets/history", Some(&token), Value::Null).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.chats.len().await, 0);
    }
}
