//! Remote lifecycle statuses.
//!
//! Both enumerations are owned by the service and may grow, so each carries an
//! `Other` variant that round-trips unknown values verbatim instead of failing
//! deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! wire_status {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
        terminal: [$($terminal:ident),+ $(,)?]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(value) => value,
                }
            }

            /// Whether the service will never move this resource out of the status again.
            pub fn is_terminal(&self) -> bool {
                matches!(self, $(Self::$terminal)|+)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(value),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(status: $name) -> Self {
                status.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_status! {
    /// Status of an agent run on a thread.
    RunStatus {
        Queued => "queued",
        InProgress => "in_progress",
        RequiresAction => "requires_action",
        Cancelling => "cancelling",
        Cancelled => "cancelled",
        Failed => "failed",
        Completed => "completed",
        Expired => "expired",
        Incomplete => "incomplete",
    }
    terminal: [Completed, Failed, Cancelled, Expired, Incomplete]
}

wire_status! {
    /// Status of a fine-tuning job.
    JobStatus {
        ValidatingFiles => "validating_files",
        Pending => "pending",
        Queued => "queued",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Cancelled => "cancelled",
    }
    terminal: [Succeeded, Failed, Cancelled]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_job_states_are_not_terminal() {
        for status in ["validating_files", "pending", "queued", "running", "notRunning"] {
            assert!(!JobStatus::from(status).is_terminal(), "{status} should keep polling");
        }
        for status in ["succeeded", "failed", "cancelled"] {
            assert!(JobStatus::from(status).is_terminal(), "{status} should stop polling");
        }
    }

    #[test]
    fn run_terminal_states() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Expired.is_terminal());
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::RequiresAction.is_terminal());
        assert!(!RunStatus::Cancelling.is_terminal());
    }

    #[test]
    fn unknown_status_round_trips_verbatim() {
        let status: JobStatus = serde_json::from_str("\"notRunning\"").unwrap();
        assert_eq!(status, JobStatus::Other("notRunning".to_string()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"notRunning\"");
    }

    #[test]
    fn known_status_serializes_to_wire_name() {
        assert_eq!(serde_json::to_string(&RunStatus::InProgress).unwrap(), "\"in_progress\"");
        assert_eq!(RunStatus::from("requires_action"), RunStatus::RequiresAction);
        assert_eq!(JobStatus::ValidatingFiles.to_string(), "validating_files");
    }
}
