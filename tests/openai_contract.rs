use aitutor::llm::chat::openai::OpenAIChatClient;
use aitutor::llm::chat::ChatClient;
use aitutor::llm::response::ResponseService;
use aitutor::llm::ChatError;
use aitutor::models::chat::ChatTurn;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{ body_partial_json, header, method, path };
use wiremock::{ Mock, MockServer, ResponseTemplate };

const COMPLETIONS_PATH: &str = "/api/v1/chat/completions";

fn client(server: &MockServer, api_key: Option<&str>) -> OpenAIChatClient {
    OpenAIChatClient::new(
        api_key.map(str::to_string),
        Some("qwen/qwen3-coder:free".to_string()),
        format!("{}{}", server.uri(), COMPLETIONS_PATH),
        "AiTutor".to_string(),
        "https://aitutor.app".to_string(),
    ).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "gen-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

async fn mount_status(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn ask(server: &MockServer) -> Result<String, ChatError> {
    client(server, Some("sk-test"))
        .complete(&[ChatTurn::new("user", "hello")])
        .await
        .map(|r| r.response)
}

#[tokio::test]
async fn sends_openrouter_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("http-referer", "https://aitutor.app"))
        .and(header("x-title", "AiTutor"))
        .and(
            body_partial_json(
                json!({
                "model": "qwen/qwen3-coder:free",
                "messages": [
                    { "role": "system", "content": "be helpful" },
                    { "role": "user", "content": "What is photosynthesis?" }
                ],
                "temperature": 0.7,
                "max_tokens": 2500,
                "top_p": 1.0
            })
            )
        )
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("**Photosynthesis** turns light into sugar.")))
        .expect(1)
        .mount(&server).await;

    let responder = ResponseService::new(Arc::new(client(&server, Some("sk-test"))), "be helpful", 10);
    let answer = responder.get_response("What is photosynthesis?", &[]).await.unwrap();
    assert_eq!(answer, "Photosynthesis turns light into sugar.");
}

#[tokio::test]
async fn model_rate_limit_is_distinguished() {
    let server = MockServer::start().await;
    mount_status(
        &server,
        429,
        json!({
            "error": {
                "code": 429,
                "message": "Provider returned error",
                "metadata": { "raw": "qwen/qwen3-coder:free is temporarily rate-limited upstream" }
            }
        })
    ).await;
    assert_eq!(ask(&server).await, Err(ChatError::ModelRateLimited));
}

#[tokio::test]
async fn plain_rate_limit() {
    let server = MockServer::start().await;
    mount_status(&server, 429, json!({ "error": { "code": 429, "message": "Too many requests" } })).await;
    assert_eq!(ask(&server).await, Err(ChatError::RateLimited));
}

#[tokio::test]
async fn rejected_key() {
    let server = MockServer::start().await;
    mount_status(&server, 401, json!({ "error": { "code": 401, "message": "No auth credentials found" } })).await;
    assert_eq!(ask(&server).await, Err(ChatError::InvalidCredential));
}

#[tokio::test]
async fn unknown_route_and_server_failure() {
    let server = MockServer::start().await;
    mount_status(&server, 404, json!({ "error": "not found" })).await;
    assert_eq!(ask(&server).await, Err(ChatError::ServiceUnavailable { status: 404 }));

    let server = MockServer::start().await;
    mount_status(&server, 502, json!({ "error": "bad gateway" })).await;
    assert_eq!(ask(&server).await, Err(ChatError::Server { status: 502 }));
}

#[tokio::test]
async fn empty_choices_are_malformed() {
    let server = MockServer::start().await;
    mount_status(&server, 200, json!({ "id": "gen-2", "choices": [] })).await;
    assert_eq!(ask(&server).await, Err(ChatError::MalformedResponse));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(COMPLETIONS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server).await;
    assert_eq!(ask(&server).await, Err(ChatError::MalformedResponse));
}

#[tokio::test]
async fn missing_key_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server).await;

    let client = client(&server, Some("   "));
    assert!(!client.is_configured());
    let result = client.complete(&[ChatTurn::new("user", "hi")]).await;
    assert_eq!(result.err(), Some(ChatError::NotConfigured));
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let server = MockServer::start().await;
    let url = format!("{}{}", server.uri(), COMPLETIONS_PATH);
    drop(server);

    let client = OpenAIChatClient::new(
        Some("sk-test".to_string()),
        None,
        url,
        "AiTutor".to_string(),
        "https://aitutor.app".to_string(),
    ).unwrap();
    let result = client.complete(&[ChatTurn::new("user", "hi")]).await;
    assert_eq!(result.err(), Some(ChatError::Network));
}
