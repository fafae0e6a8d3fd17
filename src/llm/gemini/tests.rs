use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GeminiClient {
    let config = LlmConfig {
        base_url: server.uri(),
        model: "test-model".to_string(),
        ..LlmConfig::default()
    };
    GeminiClient::new(&config, Credentials::new("test-key")).expect("client should build")
}

fn answer_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[test]
fn endpoint_includes_model() {
    let client = GeminiClient::new(&LlmConfig::default(), Credentials::new("k"))
        .expect("client should build");
    let url = client.endpoint().expect("endpoint should build");

    assert_eq!(
        url.as_str(),
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
    );
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let config = LlmConfig {
        base_url: "https://gateway.example/google".to_string(),
        ..LlmConfig::default()
    };
    let client = GeminiClient::new(&config, Credentials::new("k")).expect("client should build");
    let url = client.endpoint().expect("endpoint should build");

    assert_eq!(
        url.as_str(),
        "https://gateway.example/google/v1beta/models/gemini-2.5-flash:generateContent"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn requests_go_through_gateway_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/proxy/v1beta/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("Yes.")))
        .expect(1)
        .mount(&server)
        .await;

    let config = LlmConfig {
        base_url: format!("{}/proxy", server.uri()),
        model: "test-model".to_string(),
        ..LlmConfig::default()
    };
    let client = GeminiClient::new(&config, Credentials::new("test-key")).expect("client");

    let answer = tokio::task::spawn_blocking(move || client.complete("prompt"))
        .await
        .expect("blocking task should join")
        .expect("completion should succeed");

    assert_eq!(answer, "Yes.");
}

#[test]
fn debug_output_hides_api_key() {
    let client = GeminiClient::new(&LlmConfig::default(), Credentials::new("super-secret"))
        .expect("client should build");
    assert!(!format!("{:?}", client).contains("super-secret"));
}

#[test]
fn parts_are_concatenated() {
    let response: GenerateResponse = serde_json::from_value(json!({
        "candidates": [{
            "content": {"parts": [{"text": "Yes, "}, {"text": "we do. "}]}
        }]
    }))
    .expect("response should parse");

    assert_eq!(extract_text(response).expect("text"), "Yes, we do.");
}

#[test]
fn blocked_prompt_reports_reason() {
    let response: GenerateResponse = serde_json::from_value(json!({
        "promptFeedback": {"blockReason": "SAFETY"}
    }))
    .expect("response should parse");

    let err = extract_text(response).expect_err("should fail");
    assert!(err.to_string().contains("SAFETY"));
}

#[tokio::test(flavor = "multi_thread")]
async fn sends_prompt_and_returns_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "QUESTION: anything?"}]}],
            "generationConfig": {"temperature": 0.2}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer_body("I don't know.")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let answer = tokio::task::spawn_blocking(move || client.complete("QUESTION: anything?"))
        .await
        .expect("blocking task should join")
        .expect("completion should succeed");

    assert_eq!(answer, "I don't know.");
}

#[tokio::test(flavor = "multi_thread")]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let config = LlmConfig {
        base_url: server.uri(),
        model: "test-model".to_string(),
        retry_attempts: 3,
        ..LlmConfig::default()
    };
    let client = GeminiClient::new(&config, Credentials::new("bad-key")).expect("client");

    let result = tokio::task::spawn_blocking(move || client.complete("prompt"))
        .await
        .expect("blocking task should join");

    assert!(result.is_err());
}
