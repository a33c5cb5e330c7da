//! Counter deltas between successive snapshots

use chrono::{DateTime, Local, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::collectors::counters::snapshot::{
    COUNTER_FIELD_COUNT, COUNTER_FIELDS, CounterField, CounterSnapshot,
};

/// Timestamp layout of the optional leading record column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d:%H:%M:%S";

/// Field-wise difference between two snapshots of one interface.
///
/// Deltas are signed: a counter that went backwards (interface reset, link
/// renegotiation) shows up as a negative value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRecord {
    pub interface: String,
    /// Capture time of the newer snapshot
    pub timestamp: DateTime<Utc>,
    pub deltas: [i64; COUNTER_FIELD_COUNT],
}

impl RateRecord {
    pub fn get(&self, field: CounterField) -> i64 {
        self.deltas[field.index()]
    }

    /// Renders the record as one newline-terminated, comma-separated line
    pub fn to_line(&self, with_timestamp: bool) -> String {
        let deltas = self
            .deltas
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        if with_timestamp {
            let local = self.timestamp.with_timezone(&Local);
            format!("{},{}\n", local.format(TIMESTAMP_FORMAT), deltas)
        } else {
            format!("{}\n", deltas)
        }
    }
}

/// Header matching [`RateRecord::to_line`]
pub fn header_line(with_timestamp: bool) -> String {
    let names = COUNTER_FIELDS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(",");
    if with_timestamp {
        format!("timestamp,{}\n", names)
    } else {
        format!("{}\n", names)
    }
}

/// Keeps the previous snapshot and turns each new one into a [`RateRecord`]
#[derive(Debug, Clone, Default)]
pub struct RateCalculator {
    previous: Option<CounterSnapshot>,
}

impl RateCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Differences `current` against `previous`.
    ///
    /// Returns `None` without a previous snapshot, or when it belongs to a
    /// different interface; either way `current` only serves as a baseline.
    pub fn compute(previous: Option<&CounterSnapshot>, current: &CounterSnapshot) -> Option<RateRecord> {
        let previous = previous.filter(|previous| previous.interface == current.interface)?;

        let mut deltas = [0i64; COUNTER_FIELD_COUNT];
        for (delta, (now, before)) in deltas
            .iter_mut()
            .zip(current.fields.iter().zip(previous.fields.iter()))
        {
            // Two's complement keeps the sign when a counter went backwards
            *delta = now.wrapping_sub(*before) as i64;
        }

        Some(RateRecord {
            interface: current.interface.clone(),
            timestamp: current.timestamp,
            deltas,
        })
    }

    /// Computes a record against the stored snapshot, then keeps `current` as the next baseline
    pub fn update(&mut self, current: CounterSnapshot) -> Option<RateRecord> {
        let record = Self::compute(self.previous.as_ref(), &current);
        if record.is_none() {
            debug!(
                "Baseline established for '{}' at {}",
                current.interface,
                current.timestamp.format("%H:%M:%S%.3f")
            );
        }
        self.previous = Some(current);
        record
    }

    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }

    /// Drops the stored snapshot so the next one becomes a new baseline
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
