use aif_core::Hyperparameters;
use aif_runner::{AgentFlowRequest, FineTuneRequest, PollPolicy};
use aif_telemetry::LogFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "aif")]
#[command(version, about = "Azure AI agent and fine-tuning flows", long_about = None)]
pub struct Cli {
    /// Dotenv file loaded before reading the environment (default: ./.env if present)
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Log output format on stderr
    #[arg(long, value_enum, default_value_t = CliLogFormat::Text, global = true)]
    pub log_format: CliLogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliLogFormat {
    Text,
    Json,
}

impl From<CliLogFormat> for LogFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Text => LogFormat::Text,
            CliLogFormat::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an agent, ask it one question, print the thread and delete the agent
    Agent(AgentArgs),

    /// Fine-tuning jobs on Azure OpenAI
    #[command(subcommand)]
    FineTune(FineTuneCommand),

    /// One chat completion against a deployment
    Chat(ChatArgs),
}

#[derive(Args, Debug)]
pub struct AgentArgs {
    /// Model deployment backing the agent
    #[arg(long, default_value = "gpt-4o-mini")]
    pub model: String,

    #[arg(long, default_value = "my-agent")]
    pub name: String,

    #[arg(long, default_value = "You are a helpful agent")]
    pub instructions: String,

    /// User message posted to the thread
    #[arg(short, long, default_value = "Who is PM of India?")]
    pub message: String,

    #[command(flatten)]
    pub poll: PollArgs,
}

impl AgentArgs {
    pub fn request(&self) -> AgentFlowRequest {
        AgentFlowRequest {
            model: self.model.clone(),
            name: self.name.clone(),
            instructions: self.instructions.clone(),
            message: self.message.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum FineTuneCommand {
    /// Upload datasets, create a job, wait for it and call the fine-tuned deployment
    Run(FineTuneRunArgs),

    /// Print the current status of a job
    Status {
        job_id: String,
    },

    /// Cancel a job
    Cancel {
        job_id: String,
    },

    /// Print the most recent events of a job, oldest first
    Events {
        job_id: String,

        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Args, Debug)]
pub struct FineTuneRunArgs {
    /// Training dataset (JSONL, chat format)
    #[arg(long, default_value = "training.jsonl")]
    pub training: PathBuf,

    /// Validation dataset (JSONL, chat format)
    #[arg(long, default_value = "validation.jsonl")]
    pub validation: PathBuf,

    /// Train without a validation dataset
    #[arg(long, conflicts_with = "validation")]
    pub no_validation: bool,

    /// Base model; use dashes, never dots
    #[arg(long, default_value = "gpt-35-turbo-1106")]
    pub model: String,

    #[arg(long)]
    pub suffix: Option<String>,

    #[arg(long)]
    pub seed: Option<i64>,

    #[arg(long)]
    pub n_epochs: Option<u32>,

    #[arg(long)]
    pub batch_size: Option<u32>,

    #[arg(long)]
    pub learning_rate_multiplier: Option<f64>,

    /// Deployment serving the fine-tuned model
    #[arg(long, default_value = "gpt-35-turbo-1106-ft")]
    pub deployment: String,

    /// Stop once the job is terminal without calling the deployment
    #[arg(long)]
    pub skip_inference: bool,

    #[command(flatten)]
    pub poll: PollArgs,
}

impl FineTuneRunArgs {
    pub fn request(&self) -> FineTuneRequest {
        let defaults = FineTuneRequest::default();
        FineTuneRequest {
            training_file: self.training.clone(),
            validation_file: (!self.no_validation).then(|| self.validation.clone()),
            base_model: self.model.clone(),
            suffix: self.suffix.clone(),
            seed: self.seed,
            hyperparameters: Hyperparameters {
                n_epochs: self.n_epochs,
                batch_size: self.batch_size,
                learning_rate_multiplier: self.learning_rate_multiplier,
            },
            deployment: (!self.skip_inference).then(|| self.deployment.clone()),
            chat_messages: defaults.chat_messages,
        }
    }
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    #[arg(long, default_value = "gpt-35-turbo-1106-ft")]
    pub deployment: String,

    #[arg(long, default_value = "You are a chatbot that always responds in a humorous way.")]
    pub system: String,

    #[arg(long, default_value = "Does Azure OpenAI support customer managed keys?")]
    pub user: String,
}

/// Overrides applied on top of a flow's default [`PollPolicy`].
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct PollArgs {
    /// Seconds before the first re-read
    #[arg(long, value_name = "SECS", value_parser = positive_seconds)]
    pub poll_interval: Option<Duration>,

    /// Upper bound on the backoff, in seconds
    #[arg(long, value_name = "SECS", value_parser = positive_seconds)]
    pub max_poll_interval: Option<Duration>,

    /// Give up after this many status reads
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Give up once this many seconds have passed
    #[arg(long, value_name = "SECS", value_parser = positive_seconds)]
    pub timeout: Option<Duration>,
}

impl PollArgs {
    pub fn apply(&self, mut policy: PollPolicy) -> PollPolicy {
        if let Some(interval) = self.poll_interval {
            policy = policy.with_initial_interval(interval);
        }
        if let Some(max) = self.max_poll_interval {
            let max = max.max(policy.initial_interval);
            policy = policy.with_max_interval(max);
        }
        if self.max_attempts.is_some() {
            policy = policy.with_max_attempts(self.max_attempts);
        }
        if let Some(timeout) = self.timeout {
            policy = policy.with_deadline(Some(timeout));
        }
        policy
    }
}

/// A finite, strictly positive number of seconds.
fn positive_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value.trim().parse().map_err(|_| format!("`{value}` is not a number"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("`{value}` must be a positive, finite number of seconds"));
    }
    let duration = Duration::try_from_secs_f64(secs).map_err(|e| format!("`{value}`: {e}"))?;
    if duration.is_zero() {
        return Err(format!("`{value}` rounds down to zero"));
    }
    Ok(duration)
}
