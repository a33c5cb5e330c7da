//! Tests for the machine (comma-separated) layout

#[cfg(test)]
mod tests {
    use crate::collectors::bandwidth::tests::fixtures::{TWO_STREAM_MACHINE, assert_close};
    use crate::collectors::bandwidth::{BandwidthAggregator, LineLayout};

    const EXPECTED: [f64; 12] = [
        6.291456, 7.340032, 15.728640, 4.194304, 5.24288, 7.340032, 0.0, 3.145728, 1.048576,
        1.048576, 0.0, 0.0,
    ];

    #[test]
    fn test_byte_counts_become_mbits() {
        let mut aggregator = BandwidthAggregator::new();
        aggregator.consume_all(TWO_STREAM_MACHINE.lines());

        assert_eq!(aggregator.layout(), Some(LineLayout::Machine));
        assert_eq!(aggregator.len(), EXPECTED.len());
        for (index, expected) in EXPECTED.iter().enumerate() {
            let interval = index as f64;
            let actual = aggregator
                .bandwidth(interval)
                .unwrap_or_else(|| panic!("missing interval {interval}"));
            assert_close(*expected, actual, interval);
        }
    }

    #[test]
    fn test_aggregate_stream_overrides_per_stream_sum() {
        let mut aggregator = BandwidthAggregator::new();
        aggregator.consume("20120720091543,10.0.0.1,1,10.0.0.2,5001,3,0.0-1.0,125000,1000000");
        aggregator.consume("20120720091543,10.0.0.1,2,10.0.0.2,5001,4,0.0-1.0,125000,1000000");
        assert_close(2.0, aggregator.bandwidth(0.0).unwrap(), 0.0);

        aggregator.consume("20120720091543,10.0.0.1,0,10.0.0.2,5001,-1,0.0-1.0,375000,3000000");
        assert_close(3.0, aggregator.bandwidth(0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_half_second_interval_scales_by_duration() {
        let mut aggregator = BandwidthAggregator::new();
        aggregator.consume("20120720091543,10.0.0.1,1,10.0.0.2,5001,3,0.0-0.5,125000,2000000");
        aggregator.consume("20120720091543,10.0.0.1,1,10.0.0.2,5001,3,0.5-1.0,62500,1000000");

        assert_close(2.0, aggregator.bandwidth(0.0).unwrap(), 0.0);
        assert_close(1.0, aggregator.bandwidth(0.5).unwrap(), 0.5);
    }
}
