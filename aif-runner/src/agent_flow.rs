//! The agent conversation flow: agent, thread, message, run, transcript, cleanup.

use crate::poll::{PollPolicy, poll_until};
use aif_core::{
    AgentsService, AifError, CreateAgentRequest, CreateMessageRequest, Message, Result, Run,
    RunStatus,
};
use aif_telemetry::Instrument;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Inputs of one agent flow invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentFlowRequest {
    pub model: String,
    pub name: String,
    pub instructions: String,
    pub message: String,
}

impl Default for AgentFlowRequest {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            name: "my-agent".to_string(),
            instructions: "You are a helpful agent".to_string(),
            message: "Who is PM of India?".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentFlowOutcome {
    pub agent_id: String,
    pub thread_id: String,
    pub message_id: String,
    pub run: Run,
    /// The whole thread in creation order.
    pub messages: Vec<Message>,
    pub agent_deleted: bool,
}

/// Create a run and block until the service reports a terminal status.
///
/// A run that stops in `requires_action` is asking for tool outputs this
/// client cannot produce, so it is cancelled once and then followed to its
/// terminal status.
pub async fn execute_run(
    service: &dyn AgentsService,
    thread_id: &str,
    agent_id: &str,
    policy: &PollPolicy,
) -> Result<Run> {
    let created = service.create_run(thread_id, agent_id).await?;
    tracing::info!(run.id = %created.id, status = %created.status, "run created");
    if created.status.is_terminal() {
        return Ok(created);
    }

    let run_id = created.id.as_str();
    let cancel_requested = AtomicBool::new(false);
    let cancel_requested = &cancel_requested;

    let outcome = poll_until(
        policy,
        "run",
        run_id,
        move || async move {
            let run = service.get_run(thread_id, run_id).await?;
            if run.status == RunStatus::RequiresAction
                && !cancel_requested.swap(true, Ordering::SeqCst)
            {
                tracing::warn!(run.id = %run.id, "run requires tool outputs; cancelling");
                return service.cancel_run(thread_id, run_id).await;
            }
            Ok(run)
        },
        |_, _| Ok(()),
    )
    .await?;

    Ok(outcome.value)
}

/// Fetch every message of a thread, oldest first, following pagination.
pub async fn list_all_messages(service: &dyn AgentsService, thread_id: &str) -> Result<Vec<Message>> {
    let mut messages = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = service.list_messages(thread_id, cursor.as_deref()).await?;
        let empty = page.data.is_empty();
        messages.extend(page.data);
        if !page.has_more {
            return Ok(messages);
        }
        let last_id = page.last_id.ok_or_else(|| {
            AifError::UnexpectedResponse(format!(
                "message page for thread {thread_id} has more results but no last_id"
            ))
        })?;
        // The cursor must move forward or the listing never ends.
        if empty || cursor.as_deref() == Some(last_id.as_str()) {
            return Err(AifError::UnexpectedResponse(format!(
                "message listing for thread {thread_id} did not advance past {last_id}"
            )));
        }
        cursor = Some(last_id);
    }
}

/// Runs the agent flow once against an explicitly supplied service, writing
/// the console transcript to `out`.
pub struct AgentSession<W> {
    service: Arc<dyn AgentsService>,
    poll_policy: PollPolicy,
    out: W,
}

impl<W: Write> AgentSession<W> {
    pub fn new(service: Arc<dyn AgentsService>, out: W) -> Self {
        Self { service, poll_policy: PollPolicy::run(), out }
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

    /// Run the whole flow.
    ///
    /// Once the agent exists it is deleted on every path, including when a
    /// later step fails; the step's error is then returned.
    pub async fn run(&mut self, request: &AgentFlowRequest) -> Result<AgentFlowOutcome> {
        let span = aif_telemetry::flow_span("agent");
        async move {
            let agent = self
                .service
                .create_agent(&CreateAgentRequest::new(
                    &request.model,
                    &request.name,
                    &request.instructions,
                ))
                .await?;
            let conversation = match writeln!(self.out, "Created agent, ID: {}", agent.id) {
                Ok(()) => self.converse(&agent.id, &request.message).await,
                Err(error) => Err(error.into()),
            };
            let agent_deleted = self.delete_agent(&agent.id).await;

            let (thread_id, message_id, run, messages) = conversation?;
            Ok(AgentFlowOutcome {
                agent_id: agent.id,
                thread_id,
                message_id,
                run,
                messages,
                agent_deleted,
            })
        }
        .instrument(span)
        .await
    }

    async fn converse(
        &mut self,
        agent_id: &str,
        content: &str,
    ) -> Result<(String, String, Run, Vec<Message>)> {
        let service = Arc::clone(&self.service);

        let thread = service.create_thread().await?;
        writeln!(self.out, "Created thread, ID: {}", thread.id)?;

        let message =
            service.create_message(&thread.id, &CreateMessageRequest::user(content)).await?;
        writeln!(self.out, "Created message, ID: {}", message.id)?;

        let run = execute_run(service.as_ref(), &thread.id, agent_id, &self.poll_policy).await?;
        writeln!(self.out, "Run finished with status: {}", run.status)?;
        if run.status == RunStatus::Failed {
            match &run.last_error {
                Some(error) => writeln!(self.out, "Run failed: {error}")?,
                None => writeln!(self.out, "Run failed: no error details reported")?,
            }
        }

        let messages = list_all_messages(service.as_ref(), &thread.id).await?;
        self.render_messages(&messages)?;

        Ok((thread.id, message.id, run, messages))
    }

    /// Print one line per message carrying text: its role and last text segment.
    pub fn render_messages(&mut self, messages: &[Message]) -> Result<()> {
        for message in messages {
            if let Some(text) = message.last_text() {
                writeln!(self.out, "{}: {}", message.role, text)?;
            }
        }
        Ok(())
    }

    /// Delete the agent, reporting rather than propagating service errors.
    ///
    /// Returns whether the service confirmed the deletion. A console write
    /// failure is logged and does not change the result.
    pub async fn delete_agent(&mut self, agent_id: &str) -> bool {
        let (deleted, written) = match self.service.delete_agent(agent_id).await {
            Ok(_) => (true, writeln!(self.out, "Deleted agent")),
            Err(error) => {
                tracing::warn!(agent.id = agent_id, error = %error, "agent deletion failed");
                (false, writeln!(self.out, "Failed to delete agent {agent_id}: {error}"))
            }
        };
        if let Err(error) = written {
            tracing::warn!(agent.id = agent_id, error = %error, "could not report agent deletion");
        }
        deleted
    }
}
