use aif_client::{AzureOpenAIClient, AzureOpenAIConfig, RetryConfig};
use aif_core::{
    AifError, ChatMessage, ChatService, CreateJobRequest, FilePurpose, FineTuningService,
    JobStatus,
};
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AzureOpenAIClient {
    AzureOpenAIClient::new(AzureOpenAIConfig::new(server.uri(), "test-key"))
        .expect("client should build")
        .with_retry_config(
            RetryConfig::default()
                .with_initial_delay(Duration::ZERO)
                .with_max_delay(Duration::ZERO),
        )
}

#[tokio::test]
async fn upload_file_sends_multipart_with_purpose() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/files"))
        .and(query_param("api-version", "2024-05-01-preview"))
        .and(header("api-key", "test-key"))
        .and(body_string_contains("fine-tune"))
        .and(body_string_contains("training.jsonl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-abc",
            "object": "file",
            "bytes": 42,
            "filename": "training.jsonl",
            "purpose": "fine-tune",
            "status": "pending",
            "created_at": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dataset = dir.path().join("training.jsonl");
    let mut file = std::fs::File::create(&dataset).unwrap();
    writeln!(file, r#"{{"messages":[{{"role":"user","content":"hi"}}]}}"#).unwrap();

    let uploaded =
        client_for(&server).upload_file(&dataset, FilePurpose::FineTune).await.unwrap();
    assert_eq!(uploaded.id, "file-abc");
}

#[tokio::test]
async fn upload_missing_file_fails_locally() {
    let server = MockServer::start().await;
    let err = client_for(&server)
        .upload_file(std::path::Path::new("does-not-exist.jsonl"), FilePurpose::FineTune)
        .await
        .unwrap_err();
    assert!(matches!(err, AifError::Io(_)));
}

#[tokio::test]
async fn create_job_references_uploaded_file_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/fine_tuning/jobs"))
        .and(body_json(json!({
            "model": "gpt-35-turbo-1106",
            "training_file": "file-train",
            "validation_file": "file-valid"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ftjob-1",
            "object": "fine_tuning.job",
            "model": "gpt-35-turbo-1106",
            "status": "pending",
            "training_file": "file-train",
            "validation_file": "file-valid",
            "fine_tuned_model": null,
            "created_at": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateJobRequest::new("gpt-35-turbo-1106", "file-train")
        .with_validation_file("file-valid");
    let job = client_for(&server).create_job(&request).await.unwrap();

    assert_eq!(job.id, "ftjob-1");
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.training_file, "file-train");
    assert_eq!(job.validation_file.as_deref(), Some("file-valid"));
}

#[tokio::test]
async fn retrieve_job_exposes_fine_tuned_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openai/fine_tuning/jobs/ftjob-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ftjob-1",
            "model": "gpt-35-turbo-1106",
            "status": "succeeded",
            "training_file": "file-train",
            "fine_tuned_model": "gpt-35-turbo-1106.ft-ftjob-1",
            "finished_at": 99
        })))
        .mount(&server)
        .await;

    let job = client_for(&server).retrieve_job("ftjob-1").await.unwrap();
    assert_eq!(job.fine_tuned_model(), Some("gpt-35-turbo-1106.ft-ftjob-1"));
}

#[tokio::test]
async fn list_job_events_passes_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openai/fine_tuning/jobs/ftjob-1/events"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{
                "id": "ftevent-1",
                "object": "fine_tuning.job.event",
                "created_at": 3,
                "level": "info",
                "message": "Training started.",
                "type": "message"
            }],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let page = client_for(&server).list_job_events("ftjob-1", Some(5)).await.unwrap();
    assert_eq!(page.data[0].message, "Training started.");
}

#[tokio::test]
async fn chat_completion_targets_deployment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-35-turbo-1106-ft/chat/completions"))
        .and(body_json(json!({
            "messages": [
                {"role": "system", "content": "You are a chatbot that always responds in a humorous way."},
                {"role": "user", "content": "Does Azure OpenAI support customer managed keys?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "gpt-35-turbo",
            "choices": [{
                "index": 0,
                "finish_reason": "stop",
                "message": {"role": "assistant", "content": "Yes, and it keeps them under lock and key."}
            }],
            "usage": {"prompt_tokens": 30, "completion_tokens": 12, "total_tokens": 42}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let completion = client_for(&server)
        .chat_completion(
            "gpt-35-turbo-1106-ft",
            &[
                ChatMessage::system("You are a chatbot that always responds in a humorous way."),
                ChatMessage::user("Does Azure OpenAI support customer managed keys?"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(completion.first_content(), Some("Yes, and it keeps them under lock and key."));
}

#[tokio::test]
async fn chat_completion_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/deployments/missing/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .chat_completion("missing", &[ChatMessage::user("hi")])
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[test]
fn unusable_endpoints_are_rejected_at_construction() {
    for endpoint in ["", "   ", "/", "not a url", "ftp://resource.openai.azure.com"] {
        let result = AzureOpenAIClient::new(AzureOpenAIConfig::new(endpoint, "test-key"));
        assert!(
            matches!(result, Err(AifError::Config(_))),
            "endpoint {endpoint:?} should be rejected"
        );
    }

    assert!(AzureOpenAIClient::new(AzureOpenAIConfig::new(
        "https://my-resource.openai.azure.com/",
        "test-key"
    ))
    .is_ok());
}

#[tokio::test]
async fn malformed_request_is_a_config_error_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = AzureOpenAIClient::new(AzureOpenAIConfig::new(server.uri(), "bad\nkey"))
        .expect("client should build")
        .with_retry_config(RetryConfig::default().with_initial_delay(Duration::ZERO));

    let err = client.retrieve_job("ftjob-abc123").await.unwrap_err();

    assert!(matches!(err, AifError::Config(_)), "got {err:?}");
    assert!(!err.is_retryable());
}
