//! Subcommand handlers wiring configuration, clients and sessions together.

use crate::cli::{AgentArgs, ChatArgs, Commands, FineTuneCommand, FineTuneRunArgs};
use crate::config::{agents_config_from_env, openai_config_from_env};
use aif_client::{AgentsClient, AzureOpenAIClient};
use aif_core::ChatMessage;
use aif_runner::{AgentSession, FineTuneSession, PollPolicy};
use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;

/// Run one parsed subcommand, writing console output to `out`.
pub async fn dispatch<W: Write>(command: Commands, out: W) -> Result<()> {
    match command {
        Commands::Agent(args) => run_agent(&args, out).await,
        Commands::FineTune(command) => run_fine_tune(command, out).await,
        Commands::Chat(args) => run_chat(&args, out).await,
    }
}

async fn run_agent<W: Write>(args: &AgentArgs, out: W) -> Result<()> {
    let config = agents_config_from_env()?;
    let client = AgentsClient::new(config).context("failed to build agents client")?;

    let mut session = AgentSession::new(Arc::new(client), out)
        .with_poll_policy(args.poll.apply(PollPolicy::run()));
    session.run(&args.request()).await?;
    Ok(())
}

fn fine_tune_session<W: Write>(out: W) -> Result<FineTuneSession<W>> {
    let config = openai_config_from_env()?;
    let client =
        Arc::new(AzureOpenAIClient::new(config).context("failed to build Azure OpenAI client")?);
    Ok(FineTuneSession::new(client.clone(), client, out))
}

async fn run_fine_tune<W: Write>(command: FineTuneCommand, out: W) -> Result<()> {
    let mut session = fine_tune_session(out)?;
    match command {
        FineTuneCommand::Run(args) => run_fine_tune_job(session, &args).await,
        FineTuneCommand::Status { job_id } => {
            session.show_job(&job_id).await?;
            Ok(())
        }
        FineTuneCommand::Cancel { job_id } => {
            session.cancel_job(&job_id).await?;
            Ok(())
        }
        FineTuneCommand::Events { job_id, limit } => {
            session.show_events(&job_id, limit).await?;
            Ok(())
        }
    }
}

async fn run_fine_tune_job<W: Write>(
    session: FineTuneSession<W>,
    args: &FineTuneRunArgs,
) -> Result<()> {
    let mut session = session.with_poll_policy(args.poll.apply(PollPolicy::fine_tuning()));
    let outcome = session.run(&args.request()).await?;
    tracing::info!(
        job.id = %outcome.job.id,
        status = %outcome.job.status,
        attempts = outcome.poll_attempts,
        "fine-tuning flow finished"
    );
    Ok(())
}

async fn run_chat<W: Write>(args: &ChatArgs, out: W) -> Result<()> {
    let mut session = fine_tune_session(out)?;
    let messages = [ChatMessage::system(&args.system), ChatMessage::user(&args.user)];
    session.chat(&args.deployment, &messages).await?;
    Ok(())
}
