//! # aif-runner
//!
//! Controllers that sequence the two remote flows.
//!
//! ## Overview
//!
//! - [`AgentSession`] - create an agent, thread and message, run it to a
//!   terminal status, print the transcript, delete the agent
//! - [`FineTuneSession`] - upload datasets, create a fine-tuning job, follow it,
//!   call the fine-tuned deployment
//! - [`PollPolicy`] / [`poll_until`] - bounded polling with backoff and jitter
//!
//! Services are passed in explicitly, so the same controllers run against the
//! REST clients or the in-memory mocks.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aif_runner::{AgentFlowRequest, AgentSession};
//! use std::sync::Arc;
//!
//! let mut session = AgentSession::new(Arc::new(agents_client), std::io::stdout());
//! session.run(&AgentFlowRequest::default()).await?;
//! ```

mod agent_flow;
mod fine_tune_flow;
mod poll;

pub use agent_flow::{
    AgentFlowOutcome, AgentFlowRequest, AgentSession, execute_run, list_all_messages,
};
pub use fine_tune_flow::{FineTuneOutcome, FineTuneRequest, FineTuneSession};
pub use poll::{PollOutcome, PollPolicy, Pollable, poll_until};
