//! Tests for the chat client against a mock completion API

use assistant::{
    AssistantConfig, AssistantDomain, AssistantError, ChatClient, ChatMessage, Conversation,
};
use futures_util::StreamExt;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

fn client_for(server: &MockServer) -> ChatClient {
    let mut config = AssistantConfig::new("sk-test");
    config.base_url = format!("{}/v1", server.uri());
    ChatClient::new(config)
}

fn sse_body(tokens: &[&str]) -> String {
    let mut body = String::new();
    body.push_str("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n");
    for token in tokens {
        let chunk = json!({"choices": [{"delta": {"content": token}}]});
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

#[tokio::test]
async fn test_complete_returns_first_choice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Rotate the keys."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client
        .complete(&[ChatMessage::system("sys"), ChatMessage::user("What now?")])
        .await
        .unwrap();

    assert_eq!(reply, "Rotate the keys.");
}

#[tokio::test]
async fn test_conversation_send_records_both_turns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": AssistantDomain::Datasets.system_prompt()},
                {"role": "user", "content": "Is this stale?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Yes."}}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut conversation: Conversation = AssistantDomain::Datasets.conversation();
    let reply = conversation.send(&client, "Is this stale?").await.unwrap();

    assert_eq!(reply, "Yes.");
    assert_eq!(conversation.history().len(), 3);
    assert_eq!(conversation.history()[2], ChatMessage::assistant("Yes."));
}

#[tokio::test]
async fn test_stream_yields_tokens_until_done() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body(&["Isolate", " the", " host"])),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let stream = client.stream(&[ChatMessage::user("Ransomware!")]).await.unwrap();
    let tokens: Vec<String> = stream.map(|token| token.unwrap()).collect().await;

    assert_eq!(tokens, vec!["Isolate", " the", " host"]);
}

#[tokio::test]
async fn test_api_error_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();

    match err {
        AssistantError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_send_keeps_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut conversation = AssistantDomain::Tickets.conversation();

    assert!(conversation.send(&client, "VPN is down").await.is_err());
    assert_eq!(conversation.history().len(), 2);
    assert_eq!(conversation.history()[1], ChatMessage::user("VPN is down"));
}
