use super::*;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(url: &str) -> OllamaConfig {
    let parsed = Url::parse(url).expect("Failed to parse mock server URL");
    OllamaConfig {
        protocol: parsed.scheme().to_string(),
        host: parsed.host_str().expect("Mock URL has no host").to_string(),
        port: parsed.port().expect("Mock URL has no port"),
        embedding_model: "test-embed".to_string(),
        generation_model: "test-gen".to_string(),
        timeout_seconds: 5,
    }
}

#[test]
fn client_configuration() {
    let config = OllamaConfig {
        host: "gen-host".to_string(),
        port: 4321,
        generation_model: "test-gen-model".to_string(),
        ..OllamaConfig::default()
    };
    let client = OllamaGenerator::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-gen-model");
    assert_eq!(client.base_url.host_str(), Some("gen-host"));
    assert_eq!(client.base_url.port(), Some(4321));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_parses_server_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-gen",
            "stream": false,
            "options": { "num_predict": 256 }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "response": "A fine summary." })),
        )
        .mount(&server)
        .await;

    let client = OllamaGenerator::new(&test_config(&server.uri())).expect("Failed to create client");

    let output = tokio::task::spawn_blocking(move || client.generate("Summarize this", 256))
        .await
        .expect("Task panicked")
        .expect("Generation should succeed");

    assert_eq!(output, "A fine summary.");
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_content_is_a_generation_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "  \n" })),
        )
        .mount(&server)
        .await;

    let client = OllamaGenerator::new(&test_config(&server.uri())).expect("Failed to create client");

    let result = tokio::task::spawn_blocking(move || client.generate("Summarize this", 256))
        .await
        .expect("Task panicked");

    assert!(matches!(result, Err(DocqaError::Generation(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_exhausts_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = OllamaGenerator::new(&test_config(&server.uri()))
        .expect("Failed to create client")
        .with_retry_attempts(2);

    let result = tokio::task::spawn_blocking(move || client.generate("prompt", 64))
        .await
        .expect("Task panicked");

    assert!(matches!(result, Err(DocqaError::Generation(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaGenerator::new(&test_config(&server.uri()))
        .expect("Failed to create client")
        .with_retry_attempts(3);

    let result = tokio::task::spawn_blocking(move || client.generate("prompt", 64))
        .await
        .expect("Task panicked");

    assert!(matches!(result, Err(DocqaError::Generation(_))));
}
