//! Bandwidth-test output parsing
//!
//! - `classifier`: layout detection and line classification
//! - `aggregator`: per-interval folding of classified lines
//! - `formatting`: rendering of aggregated figures
//!
//! ## Usage
//!
//! ```rust
//! use throughput_watcher::collectors::bandwidth::BandwidthAggregator;
//!
//! let mut aggregator = BandwidthAggregator::new();
//! aggregator.consume("[  3]  0.0- 1.0 sec  1.00 MBytes  8.39 Mbits/sec");
//! assert_eq!(aggregator.bandwidth(0.0), Some(8.39));
//! ```

pub mod aggregator;
pub mod classifier;
pub mod formatting;

pub use aggregator::{BandwidthAggregator, IntervalKey};
pub use classifier::{
    BandwidthSample, BandwidthUnit, LineClass, LineClassifier, LineLayout, StreamId,
};
pub use formatting::{format_bandwidth, format_interval_record};

#[cfg(test)]
pub mod tests;
