//! Shared helpers for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use throughput_watcher::collectors::{CaptureOutput, Connection, TelemetryError, TelemetryResult};

const TABLE_HEADER: &str = "Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed";

/// Builds a counter table holding `lo` plus one line per given interface
pub fn counter_table(interfaces: &[(&str, [u64; 16])]) -> String {
    let mut table = format!(
        "{}\n    lo:   52989     577    0    0    0     0          0         0    52989     577    0    0    0     0       0          0\n",
        TABLE_HEADER
    );
    for (name, fields) in interfaces {
        let values = fields
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        table.push_str(&format!("{:>6}: {}\n", name, values));
    }
    table
}

/// Replays captures in order and keeps repeating the last one.
///
/// An optional delay makes each capture take a while, standing in for a slow
/// remote transport.
pub struct ScriptedConnection {
    captures: Mutex<VecDeque<Option<String>>>,
    delay: Duration,
    calls: AtomicU64,
}

impl ScriptedConnection {
    /// `None` entries fail the capture
    pub fn new(captures: Vec<Option<String>>) -> Self {
        Self {
            captures: Mutex::new(captures.into()),
            delay: Duration::ZERO,
            calls: AtomicU64::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn capture(&self, command: &str) -> TelemetryResult<CaptureOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = {
            let mut captures = self.captures.lock().unwrap();
            if captures.len() > 1 {
                captures.pop_front().flatten()
            } else {
                captures.front().cloned().flatten()
            }
        };

        match next {
            Some(text) => Ok(CaptureOutput::from_text(&text, "")),
            None => Err(TelemetryError::Capture {
                command: command.to_string(),
                message: "connection closed".to_string(),
            }),
        }
    }
}

/// Polls `condition` for up to five seconds
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
