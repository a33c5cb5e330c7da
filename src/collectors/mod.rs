pub mod bandwidth;
pub mod connection;
pub mod counters;
pub mod errors;
pub mod sink;

pub use bandwidth::BandwidthAggregator;
pub use connection::{CaptureOutput, Connection, LocalConnection};
pub use counters::{PollingWatcher, RateCalculator, WatcherConfig, WatcherGroup};
pub use errors::{TelemetryError, TelemetryResult};
pub use sink::{MemorySink, OutputSink, WriterSink};
