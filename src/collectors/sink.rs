//! Output sinks for formatted records
//!
//! Several watchers may share one sink. Every `write` call carries one or more
//! complete lines and is performed under the sink's lock, so lines from
//! different watchers never interleave.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::collectors::errors::{TelemetryError, TelemetryResult};

/// Accepts pre-formatted text; each call appends and flushes
pub trait OutputSink: Send + Sync {
    fn write(&self, text: &str) -> TelemetryResult<()>;
}

impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
    fn write(&self, text: &str) -> TelemetryResult<()> {
        (**self).write(text)
    }
}

/// Sink over any writer, serialized by a mutex
#[derive(Debug)]
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the wrapped writer
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WriterSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl WriterSink<File> {
    /// Opens `path` for appending, creating it if needed
    pub fn append(path: &Path) -> TelemetryResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> OutputSink for WriterSink<W> {
    fn write(&self, text: &str) -> TelemetryResult<()> {
        let mut writer = self.writer.lock().map_err(|_| TelemetryError::Sink {
            message: "writer lock poisoned".to_string(),
        })?;
        writer
            .write_all(text.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| TelemetryError::Sink {
                message: e.to_string(),
            })
    }
}

/// Keeps every write in memory, in order
#[derive(Debug, Default)]
pub struct MemorySink {
    writes: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each write call, in the order received
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }

    /// All writes concatenated
    pub fn contents(&self) -> String {
        self.writes().concat()
    }
}

impl OutputSink for MemorySink {
    fn write(&self, text: &str) -> TelemetryResult<()> {
        self.writes
            .lock()
            .map_err(|_| TelemetryError::Sink {
                message: "memory sink lock poisoned".to_string(),
            })?
            .push(text.to_string());
        Ok(())
    }
}
