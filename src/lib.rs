//! Telemetry parsing for network tests
//!
//! Two feeds are handled:
//!
//! - bandwidth-test output, folded into one Mbit/s figure per reporting
//!   interval by [`collectors::BandwidthAggregator`]
//! - interface counter tables, polled on a timer by
//!   [`collectors::PollingWatcher`] and written out as per-tick deltas
//!
//! Transports and output destinations are supplied by the caller through the
//! [`collectors::Connection`] and [`collectors::OutputSink`] traits.

pub mod collectors;
pub mod config;
