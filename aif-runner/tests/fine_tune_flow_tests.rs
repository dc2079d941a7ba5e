use aif_client::MockFineTuningService;
use aif_core::{AifError, JobStatus};
use aif_runner::{FineTuneRequest, FineTuneSession, PollPolicy};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_datasets(dir: &Path) -> FineTuneRequest {
    let line = r#"{"messages":[{"role":"system","content":"Be funny."},{"role":"user","content":"Hi"},{"role":"assistant","content":"Hello, said the walrus."}]}"#;
    std::fs::write(dir.join("training.jsonl"), format!("{line}\n{line}\n")).unwrap();
    std::fs::write(dir.join("validation.jsonl"), format!("{line}\n")).unwrap();

    FineTuneRequest {
        training_file: dir.join("training.jsonl"),
        validation_file: Some(dir.join("validation.jsonl")),
        ..FineTuneRequest::default()
    }
}

fn session_for(service: &Arc<MockFineTuningService>) -> FineTuneSession<Vec<u8>> {
    FineTuneSession::new(service.clone(), service.clone(), Vec::new())
}

fn transcript(session: FineTuneSession<Vec<u8>>) -> String {
    String::from_utf8(session.into_output()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn polls_until_terminal_with_three_reads() {
    let dir = TempDir::new().unwrap();
    let request = write_datasets(dir.path());
    let service = Arc::new(
        MockFineTuningService::new()
            .with_job_statuses(vec![JobStatus::Running, JobStatus::Running, JobStatus::Succeeded])
            .with_reply("Yes, and it never loses them, unlike my car keys."),
    );
    let mut session = session_for(&service);

    let outcome = session.run(&request).await.expect("flow should succeed");

    assert_eq!(service.retrieve_calls(), 3);
    assert_eq!(outcome.poll_attempts, 3);
    assert_eq!(outcome.job.status, JobStatus::Succeeded);

    let files = service.uploaded_files();
    assert_eq!(outcome.training_file_id, files[0].id);
    assert_eq!(outcome.validation_file_id.as_deref(), Some(files[1].id.as_str()));
    assert_eq!(outcome.job.training_file, outcome.training_file_id);
    assert_eq!(outcome.job.validation_file, outcome.validation_file_id);

    let output = transcript(session);
    assert!(output.contains(&format!("Training file ID: {}", files[0].id)));
    assert!(output.contains(&format!("Validation file ID: {}", files[1].id)));
    // Once on creation, then on each of the three reads.
    assert_eq!(output.matches(&format!("Job ID: {}", outcome.job.id)).count(), 4);
    assert_eq!(output.matches("Status: running").count(), 2);
    assert_eq!(output.matches("Status: succeeded").count(), 1);
    assert!(output.contains("\"fine_tuned_model\": \"gpt-35-turbo-1106.ft-"));
    assert!(output.trim_end().ends_with("Yes, and it never loses them, unlike my car keys."));
}

#[tokio::test(start_paused = true)]
async fn inference_targets_configured_deployment() {
    let dir = TempDir::new().unwrap();
    let request = write_datasets(dir.path());
    let service = Arc::new(MockFineTuningService::new().with_fine_tuned_model("custom-ft"));
    let mut session = session_for(&service);

    let outcome = session.run(&request).await.unwrap();

    assert_eq!(outcome.fine_tuned_model.as_deref(), Some("custom-ft"));
    let requests = service.chat_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "gpt-35-turbo-1106-ft");
    assert_eq!(requests[0].1, request.chat_messages);
    assert!(outcome.completion.is_some());
}

#[tokio::test(start_paused = true)]
async fn pending_states_keep_the_loop_polling() {
    let dir = TempDir::new().unwrap();
    let request = write_datasets(dir.path());
    let service = Arc::new(MockFineTuningService::new().with_job_statuses(vec![
        JobStatus::ValidatingFiles,
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Succeeded,
    ]));
    let mut session = session_for(&service);

    let outcome = session.run(&request).await.unwrap();

    assert_eq!(service.retrieve_calls(), 4);
    assert_eq!(outcome.job.status, JobStatus::Succeeded);
}

#[tokio::test(start_paused = true)]
async fn failed_job_skips_inference() {
    let dir = TempDir::new().unwrap();
    let request = write_datasets(dir.path());
    let service = Arc::new(
        MockFineTuningService::new().with_job_statuses(vec![JobStatus::Running, JobStatus::Failed]),
    );
    let mut session = session_for(&service);

    let outcome = session.run(&request).await.unwrap();

    assert_eq!(outcome.job.status, JobStatus::Failed);
    assert!(outcome.fine_tuned_model.is_none());
    assert!(outcome.completion.is_none());
    assert!(service.chat_requests().is_empty());
    assert!(transcript(session).contains("Status: failed"));
}

#[tokio::test(start_paused = true)]
async fn stalled_job_is_bounded_by_max_attempts() {
    let dir = TempDir::new().unwrap();
    let request = write_datasets(dir.path());
    let service =
        Arc::new(MockFineTuningService::new().with_job_statuses(vec![JobStatus::Running]));
    let mut session = session_for(&service)
        .with_poll_policy(PollPolicy::fine_tuning().with_max_attempts(Some(5)));

    let err = session.run(&request).await.unwrap_err();

    match err {
        AifError::PollExhausted { resource, attempts, last_status, .. } => {
            assert_eq!(resource, "fine_tuning.job");
            assert_eq!(attempts, 5);
            assert_eq!(last_status, "running");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn missing_dataset_fails_before_upload() {
    let dir = TempDir::new().unwrap();
    let request = FineTuneRequest {
        training_file: dir.path().join("training.jsonl"),
        validation_file: None,
        ..FineTuneRequest::default()
    };
    let service = Arc::new(MockFineTuningService::new());
    let mut session = session_for(&service);

    let err = session.run(&request).await.unwrap_err();

    assert!(matches!(err, AifError::Io(_)));
    assert!(service.uploaded_files().is_empty());
}

#[tokio::test(start_paused = true)]
async fn status_cancel_and_events_commands() {
    let dir = TempDir::new().unwrap();
    let request = write_datasets(dir.path());
    let service = Arc::new(MockFineTuningService::new());
    let mut session = session_for(&service);

    let (training, validation) = session.upload_datasets(&request).await.unwrap();
    let mut job_request = aif_core::CreateJobRequest::new("gpt-35-turbo-1106", training);
    job_request.validation_file = validation;
    let job = session.create_job(&job_request).await.unwrap();

    let shown = session.show_job(&job.id).await.unwrap();
    assert_eq!(shown.status, JobStatus::Running);

    let cancelled = session.cancel_job(&job.id).await.unwrap();
    assert_eq!(cancelled.status, JobStatus::Cancelled);

    let events = session.show_events(&job.id, Some(10)).await.unwrap();
    assert_eq!(events.first().map(|e| e.message.as_str()), Some("Job enqueued."));

    let output = transcript(session);
    assert!(output.contains("Status: cancelled"));
    assert!(output.contains("info: Job status changed to running."));
}
