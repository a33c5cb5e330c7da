//! Interface counter polling
//!
//! - `snapshot`: counter table parsing into [`CounterSnapshot`]s
//! - `rate`: deltas between successive snapshots and their record format
//! - `watcher`: timer-driven polling with start/stop lifecycle
//! - `group`: several watchers started and stopped together

pub mod group;
pub mod rate;
pub mod snapshot;
pub mod watcher;

pub use group::WatcherGroup;
pub use rate::{RateCalculator, RateRecord, TIMESTAMP_FORMAT, header_line};
pub use snapshot::{
    COUNTER_FIELD_COUNT, COUNTER_FIELDS, CounterField, CounterSnapshot, CounterSnapshotParser,
};
pub use watcher::{
    DEFAULT_COUNTER_COMMAND, DEFAULT_FAILURE_WARN_THRESHOLD, PollingWatcher, WatcherConfig,
    WatcherState, WatcherStats,
};
