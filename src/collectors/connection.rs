//! Connection collaborator used to run capture commands
//!
//! Remote transports live outside this crate. The watchers only need something
//! that runs a command and hands back its output lines, so that is the whole
//! trait. [`LocalConnection`] runs commands on this host.

use async_trait::async_trait;
use log::{debug, trace};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::collectors::errors::{TelemetryError, TelemetryResult};

/// Output of one captured command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl CaptureOutput {
    /// Builds an output from raw text blocks
    pub fn from_text(stdout: &str, stderr: &str) -> Self {
        Self {
            stdout: stdout.lines().map(str::to_string).collect(),
            stderr: stderr.lines().map(str::to_string).collect(),
        }
    }
}

/// Runs a command and returns its standard output and standard error lines.
///
/// Implementations serialize commands issued on one underlying session, and may
/// block for as long as their transport needs.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn capture(&self, command: &str) -> TelemetryResult<CaptureOutput>;
}

/// Runs capture commands through the local shell
#[derive(Debug, Default)]
pub struct LocalConnection {
    /// Held for the duration of a command so commands never interleave
    session: Mutex<()>,
}

impl LocalConnection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Connection for LocalConnection {
    async fn capture(&self, command: &str) -> TelemetryResult<CaptureOutput> {
        let _session = self.session.lock().await;
        trace!("Running local capture command: {}", command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| TelemetryError::Capture {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        let capture = CaptureOutput::from_text(
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        );

        if !output.status.success() {
            return Err(TelemetryError::Capture {
                command: command.to_string(),
                message: format!("{} ({})", output.status, capture.stderr.join(" ").trim()),
            });
        }

        debug!(
            "Local capture '{}' returned {} stdout lines, {} stderr lines",
            command,
            capture.stdout.len(),
            capture.stderr.len()
        );
        Ok(capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_output_from_text() {
        let output = CaptureOutput::from_text("a\nb\n", "");
        assert_eq!(output.stdout, vec!["a".to_string(), "b".to_string()]);
        assert!(output.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_local_capture_lines() {
        let connection = LocalConnection::new();
        let output = connection.capture("printf 'one\\ntwo\\n'").await.unwrap();
        assert_eq!(output.stdout, vec!["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn test_local_capture_failure() {
        let connection = LocalConnection::new();
        let err = connection.capture("exit 3").await.unwrap_err();
        assert!(matches!(err, TelemetryError::Capture { .. }));
    }
}
