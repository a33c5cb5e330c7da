//! Error types for telemetry parsing and polling
//!
//! Parsing never fails the caller on malformed input data: the aggregator logs
//! and drops bad lines, and the watcher logs and skips bad ticks. These errors
//! surface from the individual parsing and capture steps so that callers driving
//! those steps directly can decide what to do.

use thiserror::Error;

/// Errors raised by the telemetry parsers, collaborators, and watchers
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A line had the shape of a known layout but its numbers could not be read
    #[error("Failed to parse line '{line}': {reason}")]
    Parse { line: String, reason: String },

    /// The named interface is absent from a counter capture
    #[error("Interface '{interface}' not found in counter capture")]
    InterfaceNotFound { interface: String },

    /// The connection collaborator could not run a capture command
    #[error("Capture command '{command}' failed: {message}")]
    Capture { command: String, message: String },

    /// The output sink rejected a write
    #[error("Output sink write failed: {message}")]
    Sink { message: String },

    /// A watcher group was started without any watchers
    #[error("No watchers to watch")]
    NoWatchers,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    pub(crate) fn parse(line: &str, reason: impl Into<String>) -> Self {
        TelemetryError::Parse {
            line: line.trim().to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from malformed input rather than a collaborator
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            TelemetryError::Parse { .. } | TelemetryError::InterfaceNotFound { .. }
        )
    }
}

/// Convenience alias used throughout the collectors
pub type TelemetryResult<T> = Result<T, TelemetryError>;
