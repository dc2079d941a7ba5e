//! In-memory stand-ins for the remote services.
//!
//! Status transitions are scripted: each status read pops the next scripted
//! value, mirroring a service that moves the resource forward between polls.

use aif_core::{
    Agent, AgentDeletion, AgentsService, AifError, ChatChoice, ChatCompletion, ChatMessage,
    ChatResponseMessage, ChatRole, ChatService, CreateAgentRequest, CreateJobRequest,
    CreateMessageRequest, EventPage, FilePurpose, FineTuneFile, FineTuningJob, FineTuningService,
    JobEvent, JobStatus, Message, MessageContent, MessagePage, MessageRole, Result, Run, RunError,
    RunStatus, Thread,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

fn not_found(kind: &str, id: &str) -> AifError {
    AifError::Service {
        status: 404,
        code: Some("not_found".to_string()),
        message: format!("No {kind} found with id '{id}'."),
    }
}

fn bad_request(message: impl Into<String>) -> AifError {
    AifError::Service { status: 400, code: Some("invalid_request".to_string()), message: message.into() }
}

struct MockRun {
    run: Run,
    remaining: VecDeque<RunStatus>,
}

#[derive(Default)]
struct AgentsState {
    clock: i64,
    agents: HashMap<String, Agent>,
    threads: HashMap<String, Vec<Message>>,
    runs: HashMap<String, MockRun>,
    get_run_calls: u32,
    cancel_run_calls: u32,
}

impl AgentsState {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }
}

/// Scripted in-memory [`AgentsService`].
pub struct MockAgentsService {
    state: Mutex<AgentsState>,
    run_script: Vec<RunStatus>,
    reply_segments: Vec<String>,
    run_error: RunError,
    page_size: usize,
}

impl Default for MockAgentsService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAgentsService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AgentsState::default()),
            run_script: vec![RunStatus::InProgress, RunStatus::Completed],
            reply_segments: vec!["Hello from the mock agent.".to_string()],
            run_error: RunError {
                code: "server_error".to_string(),
                message: "The run failed.".to_string(),
            },
            page_size: 20,
        }
    }

    /// Statuses reported by successive `get_run` calls after creation (`queued`).
    #[must_use]
    pub fn with_run_statuses(mut self, statuses: Vec<RunStatus>) -> Self {
        self.run_script = statuses;
        self
    }

    /// Text segments of the assistant message appended when a run completes.
    #[must_use]
    pub fn with_reply_segments(mut self, segments: Vec<&str>) -> Self {
        self.reply_segments = segments.into_iter().map(str::to_string).collect();
        self
    }

    #[must_use]
    pub fn with_run_error(mut self, code: &str, message: &str) -> Self {
        self.run_error = RunError { code: code.to_string(), message: message.to_string() };
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn lock(&self) -> MutexGuard<'_, AgentsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get_run_calls(&self) -> u32 {
        self.lock().get_run_calls
    }

    pub fn cancel_run_calls(&self) -> u32 {
        self.lock().cancel_run_calls
    }

    pub fn agent_exists(&self, agent_id: &str) -> bool {
        self.lock().agents.contains_key(agent_id)
    }

    pub fn agent_count(&self) -> usize {
        self.lock().agents.len()
    }

    pub fn thread_messages(&self, thread_id: &str) -> Vec<Message> {
        self.lock().threads.get(thread_id).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl AgentsService for MockAgentsService {
    async fn create_agent(&self, request: &CreateAgentRequest) -> Result<Agent> {
        if request.model.trim().is_empty() {
            return Err(bad_request("Invalid model name."));
        }
        let mut state = self.lock();
        let created_at = state.tick();
        let agent = Agent {
            id: format!("asst_{created_at}"),
            model: request.model.clone(),
            name: Some(request.name.clone()),
            instructions: Some(request.instructions.clone()),
            created_at,
        };
        state.agents.insert(agent.id.clone(), agent.clone());
        Ok(agent)
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<AgentDeletion> {
        let mut state = self.lock();
        match state.agents.remove(agent_id) {
            Some(_) => Ok(AgentDeletion { id: agent_id.to_string(), deleted: true }),
            None => Err(not_found("assistant", agent_id)),
        }
    }

    async fn create_thread(&self) -> Result<Thread> {
        let mut state = self.lock();
        let created_at = state.tick();
        let thread = Thread { id: format!("thread_{created_at}"), created_at };
        state.threads.insert(thread.id.clone(), Vec::new());
        Ok(thread)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: &CreateMessageRequest,
    ) -> Result<Message> {
        let mut state = self.lock();
        if !state.threads.contains_key(thread_id) {
            return Err(not_found("thread", thread_id));
        }
        let created_at = state.tick();
        let message = Message {
            id: format!("msg_{created_at}"),
            thread_id: thread_id.to_string(),
            role: request.role,
            content: vec![MessageContent::text(request.content.clone())],
            created_at,
            assistant_id: None,
            run_id: None,
        };
        if let Some(messages) = state.threads.get_mut(thread_id) {
            messages.push(message.clone());
        }
        Ok(message)
    }

    async fn list_messages(&self, thread_id: &str, after: Option<&str>) -> Result<MessagePage> {
        let state = self.lock();
        let messages = state.threads.get(thread_id).ok_or_else(|| not_found("thread", thread_id))?;

        let start = match after {
            Some(cursor) => messages
                .iter()
                .position(|m| m.id == cursor)
                .map(|index| index + 1)
                .ok_or_else(|| bad_request(format!("Unknown cursor '{cursor}'.")))?,
            None => 0,
        };
        let data: Vec<Message> = messages.iter().skip(start).take(self.page_size).cloned().collect();
        let has_more = start + data.len() < messages.len();

        Ok(MessagePage {
            first_id: data.first().map(|m| m.id.clone()),
            last_id: data.last().map(|m| m.id.clone()),
            data,
            has_more,
        })
    }

    async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run> {
        let mut state = self.lock();
        if !state.threads.contains_key(thread_id) {
            return Err(not_found("thread", thread_id));
        }
        if !state.agents.contains_key(agent_id) {
            return Err(not_found("assistant", agent_id));
        }
        let created_at = state.tick();
        let run = Run {
            id: format!("run_{created_at}"),
            thread_id: thread_id.to_string(),
            assistant_id: agent_id.to_string(),
            status: RunStatus::Queued,
            last_error: None,
            created_at,
        };
        state.runs.insert(
            run.id.clone(),
            MockRun { run: run.clone(), remaining: self.run_script.iter().cloned().collect() },
        );
        Ok(run)
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.get_run_calls += 1;

        let mock = state
            .runs
            .get_mut(run_id)
            .filter(|mock| mock.run.thread_id == thread_id)
            .ok_or_else(|| not_found("run", run_id))?;

        let Some(next) = mock.remaining.pop_front() else {
            return Ok(mock.run.clone());
        };
        mock.run.status = next;

        match mock.run.status {
            RunStatus::Completed => {
                let run = mock.run.clone();
                state.clock += 1;
                let reply = Message {
                    id: format!("msg_{}", state.clock),
                    thread_id: thread_id.to_string(),
                    role: MessageRole::Assistant,
                    content: self.reply_segments.iter().map(MessageContent::text).collect(),
                    created_at: state.clock,
                    assistant_id: Some(run.assistant_id.clone()),
                    run_id: Some(run.id.clone()),
                };
                if let Some(messages) = state.threads.get_mut(thread_id) {
                    messages.push(reply);
                }
                Ok(run)
            }
            RunStatus::Failed => {
                mock.run.last_error = Some(self.run_error.clone());
                Ok(mock.run.clone())
            }
            _ => Ok(mock.run.clone()),
        }
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let mut state = self.lock();
        state.cancel_run_calls += 1;
        let mock = state
            .runs
            .get_mut(run_id)
            .filter(|mock| mock.run.thread_id == thread_id)
            .ok_or_else(|| not_found("run", run_id))?;
        if mock.run.status.is_terminal() {
            return Err(bad_request(format!(
                "Cannot cancel run with status '{}'.",
                mock.run.status
            )));
        }
        mock.run.status = RunStatus::Cancelling;
        mock.remaining = VecDeque::from([RunStatus::Cancelled]);
        Ok(mock.run.clone())
    }
}

struct MockJob {
    job: FineTuningJob,
    remaining: VecDeque<JobStatus>,
    events: Vec<JobEvent>,
}

#[derive(Default)]
struct FineTuningState {
    clock: i64,
    files: HashMap<String, FineTuneFile>,
    jobs: HashMap<String, MockJob>,
    retrieve_calls: u32,
    chat_requests: Vec<(String, Vec<ChatMessage>)>,
}

/// Scripted in-memory [`FineTuningService`] and [`ChatService`].
pub struct MockFineTuningService {
    state: Mutex<FineTuningState>,
    job_script: Vec<JobStatus>,
    fine_tuned_model: Option<String>,
    reply: String,
}

impl Default for MockFineTuningService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFineTuningService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FineTuningState::default()),
            job_script: vec![JobStatus::Running, JobStatus::Succeeded],
            fine_tuned_model: None,
            reply: "Mock completion.".to_string(),
        }
    }

    /// Statuses reported by successive `retrieve_job` calls after creation (`pending`).
    #[must_use]
    pub fn with_job_statuses(mut self, statuses: Vec<JobStatus>) -> Self {
        self.job_script = statuses;
        self
    }

    /// Model name exposed once a job succeeds. Defaults to `<base>.ft-<job id>`.
    #[must_use]
    pub fn with_fine_tuned_model(mut self, model: &str) -> Self {
        self.fine_tuned_model = Some(model.to_string());
        self
    }

    #[must_use]
    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    fn lock(&self) -> MutexGuard<'_, FineTuningState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn retrieve_calls(&self) -> u32 {
        self.lock().retrieve_calls
    }

    pub fn uploaded_files(&self) -> Vec<FineTuneFile> {
        let mut files: Vec<_> = self.lock().files.values().cloned().collect();
        files.sort_by_key(|file| file.created_at);
        files
    }

    pub fn chat_requests(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.lock().chat_requests.clone()
    }
}

#[async_trait]
impl FineTuningService for MockFineTuningService {
    async fn upload_file(&self, path: &Path, purpose: FilePurpose) -> Result<FineTuneFile> {
        let bytes = tokio::fs::read(path).await?;
        let mut state = self.lock();
        state.clock += 1;
        let file = FineTuneFile {
            id: format!("file-{}", state.clock),
            filename: path.file_name().map(|name| name.to_string_lossy().into_owned()),
            purpose: Some(purpose.as_str().to_string()),
            bytes: Some(bytes.len() as u64),
            status: Some("processed".to_string()),
            created_at: state.clock,
        };
        state.files.insert(file.id.clone(), file.clone());
        Ok(file)
    }

    async fn create_job(&self, request: &CreateJobRequest) -> Result<FineTuningJob> {
        let mut state = self.lock();
        for file_id in std::iter::once(&request.training_file).chain(request.validation_file.iter()) {
            if !state.files.contains_key(file_id) {
                return Err(bad_request(format!("File with id '{file_id}' was not found.")));
            }
        }
        state.clock += 1;
        let job = FineTuningJob {
            id: format!("ftjob-{}", state.clock),
            model: request.model.clone(),
            status: JobStatus::Pending,
            fine_tuned_model: None,
            training_file: request.training_file.clone(),
            validation_file: request.validation_file.clone(),
            created_at: state.clock,
            finished_at: None,
            error: None,
            extra: serde_json::Map::new(),
        };
        let events = vec![JobEvent {
            id: format!("ftevent-{}-0", state.clock),
            created_at: state.clock,
            level: Some("info".to_string()),
            message: "Job enqueued.".to_string(),
            kind: Some("message".to_string()),
        }];
        state.jobs.insert(
            job.id.clone(),
            MockJob { job: job.clone(), remaining: self.job_script.iter().cloned().collect(), events },
        );
        Ok(job)
    }

    async fn retrieve_job(&self, job_id: &str) -> Result<FineTuningJob> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.retrieve_calls += 1;
        state.clock += 1;
        let clock = state.clock;

        let mock = state.jobs.get_mut(job_id).ok_or_else(|| not_found("fine-tuning job", job_id))?;
        if let Some(next) = mock.remaining.pop_front() {
            mock.job.status = next;
            mock.events.push(JobEvent {
                id: format!("ftevent-{job_id}-{}", mock.events.len()),
                created_at: clock,
                level: Some("info".to_string()),
                message: format!("Job status changed to {}.", mock.job.status),
                kind: Some("message".to_string()),
            });
            if mock.job.status.is_terminal() {
                mock.job.finished_at = Some(clock);
            }
            if mock.job.status == JobStatus::Succeeded {
                mock.job.fine_tuned_model = Some(
                    self.fine_tuned_model
                        .clone()
                        .unwrap_or_else(|| format!("{}.ft-{job_id}", mock.job.model)),
                );
            }
        }
        Ok(mock.job.clone())
    }

    async fn cancel_job(&self, job_id: &str) -> Result<FineTuningJob> {
        let mut state = self.lock();
        let mock = state.jobs.get_mut(job_id).ok_or_else(|| not_found("fine-tuning job", job_id))?;
        if mock.job.status.is_terminal() {
            return Err(bad_request(format!("Job is already {}.", mock.job.status)));
        }
        mock.job.status = JobStatus::Cancelled;
        mock.remaining.clear();
        Ok(mock.job.clone())
    }

    async fn list_job_events(&self, job_id: &str, limit: Option<u32>) -> Result<EventPage> {
        let state = self.lock();
        let mock = state.jobs.get(job_id).ok_or_else(|| not_found("fine-tuning job", job_id))?;
        let limit = limit.map(|l| l as usize).unwrap_or(20);
        // Newest first, as the service lists them.
        let data: Vec<JobEvent> = mock.events.iter().rev().take(limit).cloned().collect();
        Ok(EventPage { has_more: mock.events.len() > data.len(), data })
    }
}

#[async_trait]
impl ChatService for MockFineTuningService {
    async fn chat_completion(
        &self,
        deployment: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatCompletion> {
        if messages.is_empty() {
            return Err(bad_request("'messages' must not be empty."));
        }
        let mut state = self.lock();
        state.chat_requests.push((deployment.to_string(), messages.to_vec()));
        Ok(ChatCompletion {
            id: format!("chatcmpl-{}", state.chat_requests.len()),
            model: Some(deployment.to_string()),
            choices: vec![ChatChoice {
                index: 0,
                message: ChatResponseMessage {
                    role: ChatRole::Assistant,
                    content: Some(self.reply.clone()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        })
    }
}
