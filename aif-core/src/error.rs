use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum AifError {
    /// The remote service answered with a non-success status.
    #[error("Service error (status {status}{}): {message}", code_suffix(.code))]
    Service { status: u16, code: Option<String>, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Polling {resource} {id} gave up after {attempts} attempts (last status: {last_status})"
    )]
    PollExhausted { resource: &'static str, id: String, attempts: u32, last_status: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AifError>;

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(", code {c}")).unwrap_or_default()
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AifError {
    /// Build a [`AifError::Service`] from an HTTP status and response body.
    ///
    /// Azure services wrap failures as `{"error": {"code": ..., "message": ...}}`.
    /// Bodies that do not follow the envelope are kept verbatim as the message.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => Self::Service {
                status,
                code: envelope.error.code,
                message: envelope.error.message.unwrap_or_else(|| body.to_string()),
            },
            Err(_) => Self::Service { status, code: None, message: body.to_string() },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Transient failures worth another attempt on an idempotent request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Service { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
            Self::Transport(_) => true,
            _ => false,
        }
    }
}
