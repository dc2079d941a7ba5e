//! # aif-core
//!
//! Core types and traits shared by the Azure AI agent and fine-tuning flows.
//!
//! ## Overview
//!
//! - [`AgentsService`] - agents, threads, messages and runs of a Foundry project
//! - [`FineTuningService`] - dataset uploads and fine-tuning jobs
//! - [`ChatService`] - chat completions against a named deployment
//! - [`AifError`] / [`Result`] - unified error handling
//!
//! All entities are owned by the remote service. Values in this crate are
//! snapshots of the last response and are never built locally from scratch.

pub mod agents;
pub mod error;
pub mod fine_tuning;
pub mod status;

pub use agents::{
    Agent, AgentDeletion, AgentsService, CreateAgentRequest, CreateMessageRequest, Message,
    MessageContent, MessagePage, MessageRole, MessageText, Run, RunError, Thread,
};
pub use error::{AifError, Result};
pub use fine_tuning::{
    ChatChoice, ChatCompletion, ChatMessage, ChatResponseMessage, ChatRole, ChatService,
    ChatUsage, CreateJobRequest, EventPage, FilePurpose, FineTuneFile, FineTuningJob,
    FineTuningService, Hyperparameters, JobError, JobEvent,
};
pub use status::{JobStatus, RunStatus};
