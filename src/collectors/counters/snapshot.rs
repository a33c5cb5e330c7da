//! Interface counter snapshots
//!
//! Parses the kernel's per-interface counter table (`/proc/net/dev`):
//!
//! ```text
//! Inter-|   Receive                                                |  Transmit
//!  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
//!     lo:   52989     577    0    0    0     0          0         0    52989     577    0    0    0     0       0          0
//! wlan0-mon: 15683751  116759    0    0    0     0          0         0        0       0    0    0    0     0       0          0
//! ```

use chrono::{DateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::collectors::errors::{TelemetryError, TelemetryResult};

/// Number of counters reported per interface
pub const COUNTER_FIELD_COUNT: usize = 16;

/// One counter column of the interface table, in declared order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterField {
    ReceiveBytes,
    ReceivePackets,
    ReceiveErrs,
    ReceiveDrop,
    ReceiveFifo,
    ReceiveFrame,
    ReceiveCompressed,
    ReceiveMulticast,
    TransmitBytes,
    TransmitPackets,
    TransmitErrs,
    TransmitDrop,
    TransmitFifo,
    TransmitColls,
    TransmitCarrier,
    TransmitCompressed,
}

/// Column names paired with their fields, in the order the table prints them
pub const COUNTER_FIELDS: [(&str, CounterField); COUNTER_FIELD_COUNT] = [
    ("receive_bytes", CounterField::ReceiveBytes),
    ("receive_packets", CounterField::ReceivePackets),
    ("receive_errs", CounterField::ReceiveErrs),
    ("receive_drop", CounterField::ReceiveDrop),
    ("receive_fifo", CounterField::ReceiveFifo),
    ("receive_frame", CounterField::ReceiveFrame),
    ("receive_compressed", CounterField::ReceiveCompressed),
    ("receive_multicast", CounterField::ReceiveMulticast),
    ("transmit_bytes", CounterField::TransmitBytes),
    ("transmit_packets", CounterField::TransmitPackets),
    ("transmit_errs", CounterField::TransmitErrs),
    ("transmit_drop", CounterField::TransmitDrop),
    ("transmit_fifo", CounterField::TransmitFifo),
    ("transmit_colls", CounterField::TransmitColls),
    ("transmit_carrier", CounterField::TransmitCarrier),
    ("transmit_compressed", CounterField::TransmitCompressed),
];

impl CounterField {
    /// Position of this field in the table and in every record
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used in the record header
    pub fn name(self) -> &'static str {
        COUNTER_FIELDS[self.index()].0
    }

    /// All fields in declared order
    pub fn all() -> impl Iterator<Item = CounterField> {
        COUNTER_FIELDS.iter().map(|(_, field)| *field)
    }
}

/// Counter values for one interface at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub interface: String,
    pub timestamp: DateTime<Utc>,
    pub fields: [u64; COUNTER_FIELD_COUNT],
}

impl CounterSnapshot {
    pub fn get(&self, field: CounterField) -> u64 {
        self.fields[field.index()]
    }
}

/// Extracts one interface's counters from raw counter-table captures
#[derive(Debug, Clone)]
pub struct CounterSnapshotParser {
    interface: String,
}

impl CounterSnapshotParser {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Parses a capture given as one block of text
    pub fn parse(&self, capture: &str, timestamp: DateTime<Utc>) -> TelemetryResult<CounterSnapshot> {
        self.parse_lines(capture.lines(), timestamp)
    }

    /// Parses a capture given as individual lines.
    ///
    /// Fails with [`TelemetryError::InterfaceNotFound`] when no line names the
    /// interface, and with [`TelemetryError::Parse`] when the line exists but
    /// does not hold 16 unsigned integers.
    pub fn parse_lines<I, S>(&self, lines: I, timestamp: DateTime<Utc>) -> TelemetryResult<CounterSnapshot>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            let line = line.as_ref();
            // Wide counters can run into the colon, so split on it rather than whitespace
            let Some((name, counters)) = line.split_once(':') else {
                continue;
            };
            if name.trim() != self.interface {
                continue;
            }

            let fields = parse_counters(line, counters)?;
            trace!(
                "Parsed counters for '{}': rx_bytes={}, tx_bytes={}",
                self.interface,
                fields[CounterField::ReceiveBytes.index()],
                fields[CounterField::TransmitBytes.index()]
            );
            return Ok(CounterSnapshot {
                interface: self.interface.clone(),
                timestamp,
                fields,
            });
        }

        Err(TelemetryError::InterfaceNotFound {
            interface: self.interface.clone(),
        })
    }
}

fn parse_counters(line: &str, counters: &str) -> TelemetryResult<[u64; COUNTER_FIELD_COUNT]> {
    let mut fields = [0u64; COUNTER_FIELD_COUNT];
    let mut columns = counters.split_whitespace();

    for (slot, (name, _)) in fields.iter_mut().zip(COUNTER_FIELDS.iter()) {
        let text = columns
            .next()
            .ok_or_else(|| TelemetryError::parse(line, format!("missing column {name}")))?;
        *slot = text
            .parse()
            .map_err(|_| TelemetryError::parse(line, format!("invalid {name} '{text}'")))?;
    }

    if columns.next().is_some() {
        return Err(TelemetryError::parse(
            line,
            format!("more than {COUNTER_FIELD_COUNT} counter columns"),
        ));
    }
    Ok(fields)
}
