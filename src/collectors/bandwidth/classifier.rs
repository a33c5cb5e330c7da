//! Line classification for bandwidth-test output
//!
//! Bandwidth tests report throughput in one of two layouts. The human layout is
//! the bracketed table printed by default:
//!
//! ```text
//! [  3]  0.0- 1.0 sec  1.00 MBytes  8.39 Mbits/sec
//! [SUM]  0.0- 1.0 sec  1.88 MBytes  15.7 Mbits/sec
//! ```
//!
//! The machine layout is the comma-separated report:
//!
//! ```text
//! 20120720091543,192.168.20.62,33596,192.168.20.50,5001,4,0.0-1.0,393216,3145728
//! ```
//!
//! The classifier detects the layout from the shape of each line, extracts a
//! [`BandwidthSample`], and sorts it into per-stream, aggregate, or cumulative
//! total lines. Everything else is noise.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::collectors::errors::{TelemetryError, TelemetryResult};

/// Number of bits in one byte, used to turn byte counts into bit rates
pub const BITS_PER_BYTE: f64 = 8.0;

/// Allowed difference between an interval width and the reporting grid, in seconds
pub const GRID_TOLERANCE: f64 = 1e-3;

/// Machine layout lines carry exactly this many fields
const MACHINE_FIELD_COUNT: usize = 9;

/// Stream id used by the machine layout for the sum across streams
const MACHINE_AGGREGATE_ID: i64 = -1;

/// Label used by the human layout for the sum across streams
const HUMAN_AGGREGATE_LABEL: &str = "SUM";

/// The two textual layouts a bandwidth test can report in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineLayout {
    /// Bracketed table with unit suffixes
    Human,
    /// Comma-separated report with raw byte counts
    Machine,
}

/// Identifies which stream a sample belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamId {
    /// One connection of the test
    Stream(u32),
    /// The sum across all connections
    Aggregate,
}

/// Bandwidth units as printed by the human layout (always per second)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandwidthUnit {
    Bits,
    Kbits,
    Mbits,
    Gbits,
    Bytes,
    KBytes,
    MBytes,
    GBytes,
}

impl BandwidthUnit {
    /// Parses a rate suffix such as `Mbits/sec` or `KBytes/sec`
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let unit = suffix.strip_suffix("/sec")?;
        match unit {
            "bits" => Some(BandwidthUnit::Bits),
            "Kbits" => Some(BandwidthUnit::Kbits),
            "Mbits" => Some(BandwidthUnit::Mbits),
            "Gbits" => Some(BandwidthUnit::Gbits),
            "Bytes" => Some(BandwidthUnit::Bytes),
            "KBytes" => Some(BandwidthUnit::KBytes),
            "MBytes" => Some(BandwidthUnit::MBytes),
            "GBytes" => Some(BandwidthUnit::GBytes),
            _ => None,
        }
    }

    /// Bits represented by one of this unit.
    ///
    /// Bit prefixes are decimal, byte prefixes are binary, matching how the
    /// bandwidth test prints them.
    pub fn bits(self) -> f64 {
        match self {
            BandwidthUnit::Bits => 1.0,
            BandwidthUnit::Kbits => 1e3,
            BandwidthUnit::Mbits => 1e6,
            BandwidthUnit::Gbits => 1e9,
            BandwidthUnit::Bytes => BITS_PER_BYTE,
            BandwidthUnit::KBytes => BITS_PER_BYTE * 1024.0,
            BandwidthUnit::MBytes => BITS_PER_BYTE * 1024.0 * 1024.0,
            BandwidthUnit::GBytes => BITS_PER_BYTE * 1024.0 * 1024.0 * 1024.0,
        }
    }

    /// Converts a value in this unit to Mbit/s, the canonical aggregate unit
    pub fn to_mbits(self, value: f64) -> f64 {
        if self == BandwidthUnit::Mbits {
            return value;
        }
        value * self.bits() / 1e6
    }
}

/// One measurement extracted from a single line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandwidthSample {
    pub stream_id: StreamId,
    /// Seconds since the start of the test
    pub interval_start: f64,
    pub interval_end: f64,
    pub bandwidth: f64,
    pub unit: BandwidthUnit,
}

impl BandwidthSample {
    /// Width of the reported interval in seconds
    pub fn duration(&self) -> f64 {
        self.interval_end - self.interval_start
    }

    /// Bandwidth normalized to Mbit/s
    pub fn mbits_per_second(&self) -> f64 {
        self.unit.to_mbits(self.bandwidth)
    }
}

/// Classification of one input line
#[derive(Debug, Clone, PartialEq)]
pub enum LineClass {
    /// One stream's figure for one interval
    PerStream(BandwidthSample),
    /// The explicit sum across streams for one interval
    Aggregate(BandwidthSample),
    /// End-of-run summary that does not sit on the interval grid
    CumulativeTotal(BandwidthSample),
    /// Headers, connection banners, blank lines and anything unrecognized
    NotApplicable,
}

/// Detects the layout of each line and classifies it against the interval grid
#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
    /// Reporting grid width in seconds; learned from the first sample when not fixed
    interval_width: Option<f64>,
    fixed_width: bool,
    /// Layout of the most recent bandwidth line
    layout: Option<LineLayout>,
}

impl LineClassifier {
    /// Creates a classifier that learns the reporting grid from the first sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a classifier with a known reporting interval in seconds
    pub fn with_interval(interval_width: f64) -> Self {
        Self {
            interval_width: Some(interval_width),
            fixed_width: true,
            layout: None,
        }
    }

    /// The reporting grid width, if configured or already learned
    pub fn interval_width(&self) -> Option<f64> {
        self.interval_width
    }

    /// Layout of the most recent bandwidth line, if any was seen
    pub fn layout(&self) -> Option<LineLayout> {
        self.layout
    }

    /// Forgets the learned grid and detected layout
    pub fn reset(&mut self) {
        if !self.fixed_width {
            self.interval_width = None;
        }
        self.layout = None;
    }

    /// Classifies one line.
    ///
    /// Returns an error only for lines that have a bandwidth layout's shape but
    /// whose numbers cannot be read.
    pub fn classify(&mut self, line: &str) -> TelemetryResult<LineClass> {
        let line = line.trim();
        let Some(layout) = detect_layout(line) else {
            return Ok(LineClass::NotApplicable);
        };

        let sample = match layout {
            LineLayout::Human => parse_human(line)?,
            LineLayout::Machine => parse_machine(line)?,
        };
        self.layout = Some(layout);

        let width = sample.duration();
        let grid = *self.interval_width.get_or_insert(width);

        if (width - grid).abs() > GRID_TOLERANCE {
            trace!(
                "Off-grid interval {:.1}-{:.1} (grid={:.1}s) classified as cumulative total",
                sample.interval_start, sample.interval_end, grid
            );
            return Ok(LineClass::CumulativeTotal(sample));
        }

        Ok(match sample.stream_id {
            StreamId::Aggregate => LineClass::Aggregate(sample),
            StreamId::Stream(_) => LineClass::PerStream(sample),
        })
    }
}

/// Detects which layout a line is written in, if any
pub fn detect_layout(line: &str) -> Option<LineLayout> {
    let has_rate_token = line.contains("bits/sec") || line.contains("Bytes/sec");
    if has_rate_token {
        return line.starts_with('[').then_some(LineLayout::Human);
    }
    if line.matches(',').count() == MACHINE_FIELD_COUNT - 1 {
        return Some(LineLayout::Machine);
    }
    None
}

fn parse_seconds(line: &str, text: &str, what: &str) -> TelemetryResult<f64> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| TelemetryError::parse(line, format!("invalid {what} '{}'", text.trim())))?;
    if !value.is_finite() || value < 0.0 {
        return Err(TelemetryError::parse(line, format!("invalid {what} '{}'", text.trim())));
    }
    Ok(value)
}

/// Splits `start-end` into its two endpoints and checks the interval is not empty
fn parse_interval(line: &str, start_text: &str, end_text: &str) -> TelemetryResult<(f64, f64)> {
    let start = parse_seconds(line, start_text, "interval start")?;
    let end = parse_seconds(line, end_text, "interval end")?;
    if end <= start {
        return Err(TelemetryError::parse(
            line,
            format!("empty interval {start}-{end}"),
        ));
    }
    Ok((start, end))
}

fn parse_human(line: &str) -> TelemetryResult<BandwidthSample> {
    let close = line
        .find(']')
        .ok_or_else(|| TelemetryError::parse(line, "missing stream id"))?;
    let label = line[1..close].trim();
    let stream_id = if label == HUMAN_AGGREGATE_LABEL {
        StreamId::Aggregate
    } else {
        let id = label
            .parse()
            .map_err(|_| TelemetryError::parse(line, format!("invalid stream id '{label}'")))?;
        StreamId::Stream(id)
    };

    let rest = &line[close + 1..];
    let (start_text, after) = rest
        .split_once('-')
        .ok_or_else(|| TelemetryError::parse(line, "missing interval range"))?;

    let tokens: Vec<&str> = after.split_whitespace().collect();
    let end_text = tokens
        .first()
        .ok_or_else(|| TelemetryError::parse(line, "missing interval end"))?;
    let (interval_start, interval_end) = parse_interval(line, start_text, end_text)?;

    // The transfer column uses bare unit names; the rate column is the first `/sec` token
    let (unit_position, unit) = tokens
        .iter()
        .enumerate()
        .find_map(|(i, token)| BandwidthUnit::from_suffix(token).map(|unit| (i, unit)))
        .ok_or_else(|| TelemetryError::parse(line, "missing bandwidth unit"))?;
    if unit_position < 2 {
        return Err(TelemetryError::parse(line, "missing bandwidth value"));
    }
    let value_text = tokens[unit_position - 1];
    let bandwidth: f64 = value_text
        .parse()
        .map_err(|_| TelemetryError::parse(line, format!("invalid bandwidth '{value_text}'")))?;

    Ok(BandwidthSample {
        stream_id,
        interval_start,
        interval_end,
        bandwidth,
        unit,
    })
}

fn parse_machine(line: &str) -> TelemetryResult<BandwidthSample> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != MACHINE_FIELD_COUNT {
        return Err(TelemetryError::parse(
            line,
            format!("expected {MACHINE_FIELD_COUNT} fields, found {}", fields.len()),
        ));
    }

    let raw_id: i64 = fields[5]
        .parse()
        .map_err(|_| TelemetryError::parse(line, format!("invalid stream id '{}'", fields[5])))?;
    let stream_id = if raw_id == MACHINE_AGGREGATE_ID {
        StreamId::Aggregate
    } else {
        let id = u32::try_from(raw_id)
            .map_err(|_| TelemetryError::parse(line, format!("invalid stream id '{raw_id}'")))?;
        StreamId::Stream(id)
    };

    let (start_text, end_text) = fields[6]
        .split_once('-')
        .ok_or_else(|| TelemetryError::parse(line, "missing interval range"))?;
    let (interval_start, interval_end) = parse_interval(line, start_text, end_text)?;

    let bytes: u64 = fields[7]
        .parse()
        .map_err(|_| TelemetryError::parse(line, format!("invalid byte count '{}'", fields[7])))?;
    let bits_per_second = bytes as f64 * BITS_PER_BYTE / (interval_end - interval_start);

    Ok(BandwidthSample {
        stream_id,
        interval_start,
        interval_end,
        bandwidth: bits_per_second,
        unit: BandwidthUnit::Bits,
    })
}
