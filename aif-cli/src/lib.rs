//! # aif-cli
//!
//! Command-line entry point for the Azure AI agent and fine-tuning flows.
//!
//! ## Overview
//!
//! - [`Cli`] - `clap` definition of the `aif` binary
//! - [`dispatch`] - runs one subcommand against the real services
//! - [`config`] - service configuration from the environment
//!
//! ## Usage
//!
//! ```bash
//! # Agent flow (needs AZURE_AI_PROJECT_ENDPOINT and a token or key)
//! aif agent --message "Who is PM of India?"
//!
//! # Fine-tuning flow (needs AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_API_KEY)
//! aif --env-file azureopenai.env fine-tune run --training training.jsonl
//! aif fine-tune events ftjob-abc123 --limit 10
//! ```
//!
//! Flow output goes to stdout; logs go to stderr and follow `RUST_LOG`.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Commands, FineTuneCommand, PollArgs};
pub use commands::dispatch;
