//! # aif-telemetry
//!
//! Structured logging for the agent and fine-tuning flows.
//!
//! Logs go to stderr so that stdout carries only the flows' console output.
//! Filtering follows `RUST_LOG` (default `info`); output is plain text or one
//! JSON object per event.
//!
//! ```rust
//! use aif_telemetry::{Instrument, LogFormat, init_with_format, poll_span};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! init_with_format("aif-cli", LogFormat::Json)?;
//!
//! async {
//!     aif_telemetry::info!(status = "running", "polled");
//! }
//! .instrument(poll_span("fine_tuning.job", "ftjob-abc123"))
//! .await;
//! # Ok(())
//! # }
//! ```

pub mod init;
pub mod spans;

pub use tracing::{Instrument, Span, debug, error, info, instrument, trace, warn};

pub use init::{LogFormat, init_telemetry, init_with_format};
pub use spans::{flow_span, poll_span, service_call_span};
