//! The fine-tuning flow: upload datasets, start a job, follow it, call the
//! resulting deployment.

use crate::poll::{PollOutcome, PollPolicy, poll_until};
use aif_core::{
    ChatCompletion, ChatMessage, ChatService, CreateJobRequest, FilePurpose, FineTuningJob,
    FineTuningService, Hyperparameters, JobEvent, JobStatus, Result,
};
use aif_telemetry::Instrument;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Inputs of one fine-tuning flow invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct FineTuneRequest {
    pub training_file: PathBuf,
    pub validation_file: Option<PathBuf>,
    /// Base model; Azure names use dashes, never dots.
    pub base_model: String,
    pub suffix: Option<String>,
    pub seed: Option<i64>,
    pub hyperparameters: Hyperparameters,
    /// Deployment serving the fine-tuned model. `None` skips inference.
    pub deployment: Option<String>,
    pub chat_messages: Vec<ChatMessage>,
}

impl Default for FineTuneRequest {
    fn default() -> Self {
        Self {
            training_file: PathBuf::from("training.jsonl"),
            validation_file: Some(PathBuf::from("validation.jsonl")),
            base_model: "gpt-35-turbo-1106".to_string(),
            suffix: None,
            seed: None,
            hyperparameters: Hyperparameters::default(),
            deployment: Some("gpt-35-turbo-1106-ft".to_string()),
            chat_messages: vec![
                ChatMessage::system("You are a chatbot that always responds in a humorous way."),
                ChatMessage::user("Does Azure OpenAI support customer managed keys?"),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FineTuneOutcome {
    pub training_file_id: String,
    pub validation_file_id: Option<String>,
    /// The job as last observed, in a terminal status.
    pub job: FineTuningJob,
    pub poll_attempts: u32,
    pub fine_tuned_model: Option<String>,
    pub completion: Option<ChatCompletion>,
}

/// Runs the fine-tuning flow against explicitly supplied services, writing
/// the console transcript to `out`.
pub struct FineTuneSession<W> {
    fine_tuning: Arc<dyn FineTuningService>,
    chat: Arc<dyn ChatService>,
    poll_policy: PollPolicy,
    out: W,
}

impl<W: Write> FineTuneSession<W> {
    pub fn new(
        fine_tuning: Arc<dyn FineTuningService>,
        chat: Arc<dyn ChatService>,
        out: W,
    ) -> Self {
        Self { fine_tuning, chat, poll_policy: PollPolicy::fine_tuning(), out }
    }

    #[must_use]
    pub fn with_poll_policy(mut self, poll_policy: PollPolicy) -> Self {
        self.poll_policy = poll_policy;
        self
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub async fn run(&mut self, request: &FineTuneRequest) -> Result<FineTuneOutcome> {
        let span = aif_telemetry::flow_span("fine_tuning");
        async move {
            let (training_file_id, validation_file_id) = self.upload_datasets(request).await?;

            let mut job_request = CreateJobRequest::new(&request.base_model, &training_file_id)
                .with_hyperparameters(request.hyperparameters.clone());
            job_request.validation_file = validation_file_id.clone();
            job_request.suffix = request.suffix.clone();
            job_request.seed = request.seed;

            let job = self.create_job(&job_request).await?;
            let PollOutcome { value: job, attempts } = self.wait_for_job(&job.id).await?;

            let fine_tuned_model = match (&job.status, job.fine_tuned_model()) {
                (JobStatus::Succeeded, Some(model)) => Some(model.to_string()),
                _ => None,
            };

            let completion = match (&fine_tuned_model, &request.deployment) {
                (Some(model), Some(deployment)) => {
                    writeln!(self.out, "Fine-tuned model: {model}")?;
                    Some(self.chat(deployment, &request.chat_messages).await?)
                }
                (Some(model), None) => {
                    writeln!(self.out, "Fine-tuned model: {model}")?;
                    None
                }
                (None, _) => {
                    tracing::warn!(
                        job.id = %job.id,
                        status = %job.status,
                        "job produced no fine-tuned model; skipping inference"
                    );
                    None
                }
            };

            Ok(FineTuneOutcome {
                training_file_id,
                validation_file_id,
                job,
                poll_attempts: attempts,
                fine_tuned_model,
                completion,
            })
        }
        .instrument(span)
        .await
    }

    /// Upload the training and (optional) validation datasets.
    pub async fn upload_datasets(
        &mut self,
        request: &FineTuneRequest,
    ) -> Result<(String, Option<String>)> {
        let training =
            self.fine_tuning.upload_file(&request.training_file, FilePurpose::FineTune).await?;

        let validation = match &request.validation_file {
            Some(path) => Some(self.fine_tuning.upload_file(path, FilePurpose::FineTune).await?),
            None => None,
        };

        writeln!(self.out, "Training file ID: {}", training.id)?;
        if let Some(validation) = &validation {
            writeln!(self.out, "Validation file ID: {}", validation.id)?;
        }

        Ok((training.id, validation.map(|file| file.id)))
    }

    pub async fn create_job(&mut self, request: &CreateJobRequest) -> Result<FineTuningJob> {
        let job = self.fine_tuning.create_job(request).await?;
        tracing::info!(job.id = %job.id, status = %job.status, "fine-tuning job created");
        self.print_job_status(&job)?;
        self.print_job_json(&job)?;
        Ok(job)
    }

    /// Poll a job until it is terminal, printing id and status on every read
    /// and the full job once it settles.
    pub async fn wait_for_job(&mut self, job_id: &str) -> Result<PollOutcome<FineTuningJob>> {
        let service = self.fine_tuning.as_ref();
        let out = &mut self.out;

        let outcome = poll_until(
            &self.poll_policy,
            "fine_tuning.job",
            job_id,
            move || service.retrieve_job(job_id),
            |job: &FineTuningJob, _attempt: u32| {
                writeln!(out, "Job ID: {}", job.id)?;
                writeln!(out, "Status: {}", job.status)?;
                Ok(())
            },
        )
        .await?;

        self.print_job_json(&outcome.value)?;
        Ok(outcome)
    }

    /// Retrieve a job once and print it.
    pub async fn show_job(&mut self, job_id: &str) -> Result<FineTuningJob> {
        let job = self.fine_tuning.retrieve_job(job_id).await?;
        self.print_job_status(&job)?;
        if let Some(model) = job.fine_tuned_model() {
            writeln!(self.out, "Fine-tuned model: {model}")?;
        }
        Ok(job)
    }

    pub async fn cancel_job(&mut self, job_id: &str) -> Result<FineTuningJob> {
        let job = self.fine_tuning.cancel_job(job_id).await?;
        self.print_job_status(&job)?;
        Ok(job)
    }

    /// Print the newest `limit` events of a job, oldest first.
    pub async fn show_events(&mut self, job_id: &str, limit: Option<u32>) -> Result<Vec<JobEvent>> {
        let page = self.fine_tuning.list_job_events(job_id, limit).await?;
        let mut events = page.data;
        events.reverse();
        for event in &events {
            let level = event.level.as_deref().unwrap_or("info");
            writeln!(self.out, "[{}] {level}: {}", event.created_at, event.message)?;
        }
        Ok(events)
    }

    /// One non-streaming completion against `deployment`; prints the first choice.
    pub async fn chat(
        &mut self,
        deployment: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatCompletion> {
        let completion = self.chat.chat_completion(deployment, messages).await?;
        match completion.first_content() {
            Some(content) => writeln!(self.out, "{content}")?,
            None => tracing::warn!(deployment, "completion carried no content"),
        }
        Ok(completion)
    }

    fn print_job_status(&mut self, job: &FineTuningJob) -> Result<()> {
        writeln!(self.out, "Job ID: {}", job.id)?;
        writeln!(self.out, "Status: {}", job.status)?;
        Ok(())
    }

    fn print_job_json(&mut self, job: &FineTuningJob) -> Result<()> {
        writeln!(self.out, "{}", serde_json::to_string_pretty(job)?)?;
        Ok(())
    }
}
