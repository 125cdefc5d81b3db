use portfolio_navigator::config::knowledge::builtin_knowledge_base;
use portfolio_navigator::config::prompt::PromptConfig;
use portfolio_navigator::intent::classify;
use portfolio_navigator::llm::chat::{ generate_remote, ChatClient, ChatMessage };
use portfolio_navigator::llm::chat::openai::OpenAIChatClient;
use portfolio_navigator::llm::{ DecodingParams, RemoteError };
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{ body_partial_json, header, method, path };
use wiremock::{ Mock, MockServer, ResponseTemplate };

const KEY: &str = "sk-test0123456789abcdefgh";

fn client_for(server: &MockServer, timeout: Duration) -> OpenAIChatClient {
    OpenAIChatClient::new(None, Some(server.uri()), DecodingParams::default(), timeout).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    })
}

fn prompt() -> Vec<ChatMessage> {
    vec![ChatMessage::system("You describe Jane's portfolio."), ChatMessage::user("Who is Jane?")]
}

async fn mount_status(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": { "message": "nope" } })))
        .expect(1)
        .mount(server).await;
}

#[tokio::test]
async fn sends_fixed_decoding_params_and_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", format!("Bearer {}", KEY).as_str()))
        .and(
            body_partial_json(
                json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 300,
                "messages": [
                    { "role": "system", "content": "You describe Jane's portfolio." },
                    { "role": "user", "content": "Who is Jane?" }
                ]
            })
            )
        )
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Jane is an Experience Designer.")))
        .expect(1)
        .mount(&server).await;

    let client = client_for(&server, Duration::from_secs(5));
    let reply = client.complete(&prompt(), KEY).await.unwrap();
    assert_eq!(reply.response, "Jane is an Experience Designer.");
}

#[tokio::test]
async fn unauthorized_maps_to_invalid_credential() {
    let server = MockServer::start().await;
    mount_status(&server, 401).await;
    let result = client_for(&server, Duration::from_secs(5)).complete(&prompt(), KEY).await;
    assert_eq!(result.unwrap_err(), RemoteError::InvalidCredential);
}

#[tokio::test]
async fn forbidden_maps_to_invalid_credential() {
    let server = MockServer::start().await;
    mount_status(&server, 403).await;
    let result = client_for(&server, Duration::from_secs(5)).complete(&prompt(), KEY).await;
    assert_eq!(result.unwrap_err(), RemoteError::InvalidCredential);
}

#[tokio::test]
async fn too_many_requests_maps_to_rate_limited() {
    let server = MockServer::start().await;
    mount_status(&server, 429).await;
    let result = client_for(&server, Duration::from_secs(5)).complete(&prompt(), KEY).await;
    assert_eq!(result.unwrap_err(), RemoteError::RateLimited);
}

#[tokio::test]
async fn server_error_maps_to_unavailable() {
    let server = MockServer::start().await;
    mount_status(&server, 500).await;
    let result = client_for(&server, Duration::from_secs(5)).complete(&prompt(), KEY).await;
    assert!(matches!(result, Err(RemoteError::Unavailable(_))));
}

#[tokio::test]
async fn blank_content_maps_to_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("  \n ")))
        .mount(&server).await;
    let result = client_for(&server, Duration::from_secs(5)).complete(&prompt(), KEY).await;
    assert_eq!(result.unwrap_err(), RemoteError::EmptyResponse);
}

#[tokio::test]
async fn missing_choices_maps_to_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server).await;
    let result = client_for(&server, Duration::from_secs(5)).complete(&prompt(), KEY).await;
    assert_eq!(result.unwrap_err(), RemoteError::EmptyResponse);
}

#[tokio::test]
async fn non_json_body_maps_to_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server).await;
    let result = client_for(&server, Duration::from_secs(5)).complete(&prompt(), KEY).await;
    assert_eq!(result.unwrap_err(), RemoteError::EmptyResponse);
}

#[tokio::test]
async fn slow_endpoint_maps_to_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("late"))
                .set_delay(Duration::from_secs(2))
        )
        .mount(&server).await;
    let result = client_for(&server, Duration::from_millis(200)).complete(&prompt(), KEY).await;
    assert!(matches!(result, Err(RemoteError::Unavailable(_))));
}

#[tokio::test]
async fn short_credential_never_reaches_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("should not happen")))
        .expect(0)
        .mount(&server).await;

    let kb = builtin_knowledge_base();
    let client = client_for(&server, Duration::from_secs(5));
    // 20 characters: one short of the minimum
    let short_key = "sk-01234567890123456";
    assert_eq!(short_key.len(), 20);

    let result = generate_remote(
        &client,
        &PromptConfig::default(),
        "what are her skills",
        &classify("what are her skills"),
        &kb,
        short_key
    ).await;
    assert_eq!(result, Err(RemoteError::InvalidCredential));
}
