//! Per-interval bandwidth aggregation
//!
//! The aggregator owns one [`LineClassifier`] and folds every accepted line into
//! a bucket keyed by the interval start. A bucket keeps the running sum of the
//! per-stream figures and, separately, the explicit aggregate figure if the test
//! printed one. The explicit aggregate wins whenever it is present, whatever
//! order the lines arrived in.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::collectors::bandwidth::classifier::{LineClass, LineClassifier, LineLayout};

/// Interval start in seconds, used as the aggregation bucket identity.
///
/// Keys come from parsed text, so equal text always yields an equal key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntervalKey(f64);

impl IntervalKey {
    pub fn new(seconds: f64) -> Self {
        Self(seconds)
    }

    pub fn seconds(self) -> f64 {
        self.0
    }
}

impl From<f64> for IntervalKey {
    fn from(seconds: f64) -> Self {
        Self(seconds)
    }
}

impl PartialEq for IntervalKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IntervalKey {}

impl PartialOrd for IntervalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IntervalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct IntervalBucket {
    /// Sum of per-stream figures in Mbit/s
    stream_sum: f64,
    /// Explicit sum line in Mbit/s, if one was seen
    aggregate: Option<f64>,
}

impl IntervalBucket {
    fn bandwidth(&self) -> f64 {
        self.aggregate.unwrap_or(self.stream_sum)
    }
}

/// Folds bandwidth-test output into one Mbit/s figure per interval.
///
/// One instance serves one capture session; call [`reset`](Self::reset) before
/// reusing it for another. Not internally synchronized.
#[derive(Debug, Clone, Default)]
pub struct BandwidthAggregator {
    classifier: LineClassifier,
    buckets: BTreeMap<IntervalKey, IntervalBucket>,
    /// Lines that had a bandwidth layout but could not be parsed
    rejected_lines: u64,
}

impl BandwidthAggregator {
    /// Creates an aggregator that learns the reporting interval from its input
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an aggregator for a test reporting every `interval_secs` seconds
    pub fn with_interval(interval_secs: f64) -> Self {
        Self {
            classifier: LineClassifier::with_interval(interval_secs),
            ..Self::default()
        }
    }

    /// Classifies one line and folds it into the aggregate.
    ///
    /// Noise and cumulative totals leave the aggregate untouched; malformed
    /// bandwidth lines are logged and dropped.
    pub fn consume(&mut self, line: &str) {
        match self.classifier.classify(line) {
            Ok(LineClass::PerStream(sample)) => {
                let bucket = self.buckets.entry(sample.interval_start.into()).or_default();
                bucket.stream_sum += sample.mbits_per_second();
                trace!(
                    "Interval {:.1}: stream {:?} adds {:.3} Mbit/s (stream_sum={:.3})",
                    sample.interval_start,
                    sample.stream_id,
                    sample.mbits_per_second(),
                    bucket.stream_sum
                );
            }
            Ok(LineClass::Aggregate(sample)) => {
                let bucket = self.buckets.entry(sample.interval_start.into()).or_default();
                bucket.aggregate = Some(sample.mbits_per_second());
                trace!(
                    "Interval {:.1}: aggregate {:.3} Mbit/s",
                    sample.interval_start,
                    sample.mbits_per_second()
                );
            }
            Ok(LineClass::CumulativeTotal(sample)) => {
                debug!(
                    "Skipping cumulative total {:.1}-{:.1} ({:?}, {:.3} Mbit/s)",
                    sample.interval_start,
                    sample.interval_end,
                    sample.stream_id,
                    sample.mbits_per_second()
                );
            }
            Ok(LineClass::NotApplicable) => {}
            Err(e) => {
                self.rejected_lines += 1;
                warn!("Ignoring malformed bandwidth line: {}", e);
            }
        }
    }

    /// Consumes every line of an iterator in order
    pub fn consume_all<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.consume(line.as_ref());
        }
    }

    /// Clears the aggregate and forgets the learned interval grid and layout
    pub fn reset(&mut self) {
        debug!(
            "Resetting bandwidth aggregator ({} intervals discarded)",
            self.buckets.len()
        );
        self.buckets.clear();
        self.classifier.reset();
        self.rejected_lines = 0;
    }

    /// Current interval start to Mbit/s mapping
    pub fn intervals(&self) -> BTreeMap<IntervalKey, f64> {
        self.buckets
            .iter()
            .map(|(key, bucket)| (*key, bucket.bandwidth()))
            .collect()
    }

    /// Bandwidth in Mbit/s for the interval starting exactly at `interval_start`
    pub fn bandwidth(&self, interval_start: f64) -> Option<f64> {
        self.buckets
            .get(&IntervalKey::from(interval_start))
            .map(IntervalBucket::bandwidth)
    }

    /// Iterates `(interval_start, Mbit/s)` pairs in interval order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.buckets
            .iter()
            .map(|(key, bucket)| (key.seconds(), bucket.bandwidth()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Layout of the most recent bandwidth line
    pub fn layout(&self) -> Option<LineLayout> {
        self.classifier.layout()
    }

    /// Number of malformed bandwidth lines dropped since the last reset
    pub fn rejected_lines(&self) -> u64 {
        self.rejected_lines
    }
}
