//! Formatting utilities for bandwidth data
//!
//! Aggregated figures are kept in Mbit/s. These helpers render them for
//! terminal output with decimal bit-rate prefixes, the way bandwidth tests
//! print them.

/// Formats a bandwidth given in Mbit/s with an appropriate bit-rate unit
///
/// # Examples
///
/// ```
/// use throughput_watcher::collectors::bandwidth::formatting::format_bandwidth;
///
/// assert_eq!(format_bandwidth(0.0), "0.00 bits/s");
/// assert_eq!(format_bandwidth(0.5), "500.00 Kbits/s");
/// assert_eq!(format_bandwidth(15.7), "15.70 Mbits/s");
/// assert_eq!(format_bandwidth(2500.0), "2.50 Gbits/s");
/// ```
pub fn format_bandwidth(mbits_per_second: f64) -> String {
    let bits = mbits_per_second * 1e6;
    if bits < 1e3 {
        format!("{:.2} bits/s", bits)
    } else if bits < 1e6 {
        format!("{:.2} Kbits/s", bits / 1e3)
    } else if bits < 1e9 {
        format!("{:.2} Mbits/s", mbits_per_second)
    } else {
        format!("{:.2} Gbits/s", bits / 1e9)
    }
}

/// Formats one aggregated interval as a `start,Mbit/s` record line.
///
/// The start uses the shortest form that reads back exactly: `0.25`, `1.0`.
pub fn format_interval_record(interval_start: f64, mbits_per_second: f64) -> String {
    format!("{:?},{:.6}", interval_start, mbits_per_second)
}
