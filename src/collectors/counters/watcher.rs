//! Polling watcher for interface counters
//!
//! A [`PollingWatcher`] owns one background task per watched interface. Each
//! tick captures the counter table through the [`Connection`], parses the
//! interface's line, differences it against the previous snapshot, and writes
//! one record line to the [`OutputSink`]. The header line is written on the
//! first tick after every `start()`.
//!
//! Stopping is cooperative. `stop()` raises a shared flag and wakes the task;
//! the flag is checked at the top of each tick and again before a record is
//! written, and the sink always receives whole lines.

use chrono::Utc;
use log::{Level, debug, error, info, log, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::collectors::connection::Connection;
use crate::collectors::counters::rate::{RateCalculator, RateRecord, header_line};
use crate::collectors::counters::snapshot::CounterSnapshotParser;
use crate::collectors::errors::{TelemetryError, TelemetryResult};
use crate::collectors::sink::OutputSink;

/// Command that prints the kernel's interface counter table
pub const DEFAULT_COUNTER_COMMAND: &str = "cat /proc/net/dev";

/// Consecutive failed ticks after which failures are logged as warnings
pub const DEFAULT_FAILURE_WARN_THRESHOLD: u32 = 3;

/// Shortest poll period accepted by the timer
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of a watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatcherState {
    Idle,
    Running,
    Stopping,
}

/// What to watch and how often
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Interface name as printed in the counter table
    pub interface: String,
    /// Poll period
    pub interval: Duration,
    /// Command run through the connection to capture the counter table
    pub command: String,
    /// Prefix every record with a local timestamp column
    pub timestamp: bool,
    pub failure_warn_threshold: u32,
}

impl WatcherConfig {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            interval: Duration::from_secs(1),
            command: DEFAULT_COUNTER_COMMAND.to_string(),
            timestamp: false,
            failure_warn_threshold: DEFAULT_FAILURE_WARN_THRESHOLD,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: bool) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_failure_warn_threshold(mut self, threshold: u32) -> Self {
        self.failure_warn_threshold = threshold;
        self
    }
}

/// Counters shared between a watcher and its task
#[derive(Debug, Default)]
struct WatcherCounters {
    ticks: AtomicU64,
    records_written: AtomicU64,
    consecutive_failures: AtomicU32,
}

/// Point-in-time view of a watcher's progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherStats {
    pub ticks: u64,
    pub records_written: u64,
    pub consecutive_failures: u32,
}

/// Stop flag plus a wake-up for a task sleeping on its timer
#[derive(Debug, Default)]
struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    fn set(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    fn is_set(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Polls one interface's counters on a timer and writes deltas to a sink.
///
/// Dropping a running watcher signals its task to stop at the next check; call
/// [`stop`](Self::stop) to also wait for an in-flight tick to finish.
pub struct PollingWatcher {
    config: Arc<WatcherConfig>,
    connection: Arc<dyn Connection>,
    sink: Arc<dyn OutputSink>,
    counters: Arc<WatcherCounters>,
    state: WatcherState,
    stop: Option<Arc<StopSignal>>,
    task: Option<JoinHandle<()>>,
}

impl PollingWatcher {
    pub fn new(config: WatcherConfig, connection: Arc<dyn Connection>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            config: Arc::new(config),
            connection,
            sink,
            counters: Arc::new(WatcherCounters::default()),
            state: WatcherState::Idle,
            stop: None,
            task: None,
        }
    }

    /// Launches the background loop and returns immediately.
    ///
    /// Calling this on a running watcher does nothing.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("Watcher for '{}' is already running", self.config.interface);
            return;
        }

        let stop = Arc::new(StopSignal::default());
        self.counters.consecutive_failures.store(0, Ordering::Relaxed);

        let poll_loop = PollLoop {
            config: Arc::clone(&self.config),
            connection: Arc::clone(&self.connection),
            sink: Arc::clone(&self.sink),
            counters: Arc::clone(&self.counters),
            stop: Arc::clone(&stop),
            parser: CounterSnapshotParser::new(self.config.interface.clone()),
            calculator: RateCalculator::new(),
            header_written: false,
        };

        self.task = Some(tokio::spawn(poll_loop.run()));
        self.stop = Some(stop);
        self.state = WatcherState::Running;

        info!(
            "Started counter watcher for '{}' (interval={:?}, command='{}', timestamp={})",
            self.config.interface, self.config.interval, self.config.command, self.config.timestamp
        );
    }

    /// Stops the background loop.
    ///
    /// Once this returns the timer will not fire again and no further writes
    /// reach the sink. A tick in progress either finishes its write or drops
    /// its record; it is never cut off mid-line.
    pub async fn stop(&mut self) {
        self.signal_stop();
        if self.stop.take().is_none() {
            return;
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(
                    "Counter watcher task for '{}' ended abnormally: {}",
                    self.config.interface, e
                );
            }
        }

        self.state = WatcherState::Idle;
        info!(
            "Stopped counter watcher for '{}' after {} ticks",
            self.config.interface,
            self.counters.ticks.load(Ordering::Relaxed)
        );
    }

    /// Raises the stop flag without waiting for the task.
    ///
    /// The loop writes nothing once the flag is up. Follow with
    /// [`stop`](Self::stop) to wait for an in-flight tick and return to idle.
    pub fn signal_stop(&mut self) {
        if let Some(stop) = &self.stop {
            self.state = WatcherState::Stopping;
            stop.set();
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == WatcherState::Running
            && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    pub fn stats(&self) -> WatcherStats {
        WatcherStats {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            records_written: self.counters.records_written.load(Ordering::Relaxed),
            consecutive_failures: self.counters.consecutive_failures.load(Ordering::Relaxed),
        }
    }
}

impl Drop for PollingWatcher {
    fn drop(&mut self) {
        if let Some(stop) = &self.stop {
            stop.set();
        }
    }
}

/// State owned by the background task
struct PollLoop {
    config: Arc<WatcherConfig>,
    connection: Arc<dyn Connection>,
    sink: Arc<dyn OutputSink>,
    counters: Arc<WatcherCounters>,
    stop: Arc<StopSignal>,
    parser: CounterSnapshotParser,
    calculator: RateCalculator,
    header_written: bool,
}

impl PollLoop {
    async fn run(mut self) {
        let mut ticker = time::interval(self.config.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.stop.notify.notified() => {}
                _ = ticker.tick() => {}
            }
            if self.stop.is_set() {
                break;
            }
            self.tick().await;
        }

        debug!("Counter watcher loop for '{}' exited", self.config.interface);
    }

    async fn tick(&mut self) {
        let tick = self.counters.ticks.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.header_written {
            match self.sink.write(&header_line(self.config.timestamp)) {
                Ok(()) => self.header_written = true,
                Err(e) => {
                    error!(
                        "Failed to write header for '{}' on tick #{}: {}",
                        self.config.interface, tick, e
                    );
                    self.record_failure(tick, &e);
                    return;
                }
            }
        }

        match self.poll().await {
            Ok(Some(record)) => {
                if self.stop.is_set() {
                    debug!(
                        "Stop requested during tick #{} for '{}', dropping record",
                        tick, self.config.interface
                    );
                    return;
                }
                match self.sink.write(&record.to_line(self.config.timestamp)) {
                    Ok(()) => {
                        self.counters.records_written.fetch_add(1, Ordering::Relaxed);
                        self.counters.consecutive_failures.store(0, Ordering::Relaxed);
                        trace!("Wrote counter record for '{}' on tick #{}", self.config.interface, tick);
                    }
                    Err(e) => {
                        error!(
                            "Failed to write counter record for '{}' on tick #{}: {}",
                            self.config.interface, tick, e
                        );
                        self.record_failure(tick, &e);
                    }
                }
            }
            Ok(None) => {
                self.counters.consecutive_failures.store(0, Ordering::Relaxed);
            }
            Err(e) => self.record_failure(tick, &e),
        }
    }

    async fn poll(&mut self) -> TelemetryResult<Option<RateRecord>> {
        let output = self.connection.capture(&self.config.command).await?;
        for line in output.stderr.iter().filter(|line| !line.trim().is_empty()) {
            debug!("stderr from '{}': {}", self.config.command, line);
        }

        let snapshot = self.parser.parse_lines(&output.stdout, Utc::now())?;
        Ok(self.calculator.update(snapshot))
    }

    fn record_failure(&self, tick: u64, error: &TelemetryError) {
        let failures = self.counters.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        match failure_level(failures, self.config.failure_warn_threshold) {
            Level::Warn => log!(
                Level::Warn,
                "Counter watcher for '{}' has failed {} consecutive ticks (latest tick #{}): {} - interface or connection may be down",
                self.config.interface,
                failures,
                tick,
                error
            ),
            level => log!(
                level,
                "Counter watcher for '{}' skipped tick #{}: {}",
                self.config.interface,
                tick,
                error
            ),
        }
    }
}

/// Log level for a run of `failures` consecutive failed ticks
fn failure_level(failures: u32, threshold: u32) -> Level {
    if failures >= threshold {
        Level::Warn
    } else {
        Level::Info
    }
}
