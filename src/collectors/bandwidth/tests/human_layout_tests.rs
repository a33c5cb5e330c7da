//! Tests for the human (bracketed) layout

#[cfg(test)]
mod tests {
    use crate::collectors::bandwidth::tests::fixtures::{TWO_STREAM_HUMAN, assert_close};
    use crate::collectors::bandwidth::{BandwidthAggregator, LineLayout};

    const SUM_INTERVALS: [(f64, f64); 10] = [
        (0.0, 15.7),
        (1.0, 9.44),
        (2.0, 8.39),
        (3.0, 6.29),
        (4.0, 10.5),
        (5.0, 6.29),
        (6.0, 2.10),
        (7.0, 0.0),
        (8.0, 0.0),
        (9.0, 0.0),
    ];

    fn aggregate_fixture() -> BandwidthAggregator {
        let mut aggregator = BandwidthAggregator::new();
        aggregator.consume_all(TWO_STREAM_HUMAN.lines());
        aggregator
    }

    #[test]
    fn test_sum_lines_win_for_every_interval() {
        let aggregator = aggregate_fixture();

        for (interval, expected) in SUM_INTERVALS {
            let actual = aggregator
                .bandwidth(interval)
                .unwrap_or_else(|| panic!("missing interval {interval}"));
            assert_close(expected, actual, interval);
        }
        assert_eq!(aggregator.layout(), Some(LineLayout::Human));
        assert_eq!(aggregator.rejected_lines(), 0);
    }

    #[test]
    fn test_single_stream_tail_is_kept() {
        let aggregator = aggregate_fixture();

        // Stream 4 keeps reporting after stream 3 finished, without sum lines
        for interval in 10..19 {
            assert_eq!(aggregator.bandwidth(interval as f64), Some(0.0));
        }
    }

    #[test]
    fn test_cumulative_totals_are_excluded() {
        let aggregator = aggregate_fixture();
        let intervals = aggregator.intervals();

        // 0.0 through 18.0, one bucket per reported second
        assert_eq!(intervals.len(), 19);
        assert!(aggregator.bandwidth(10.7).is_none());
        assert!(aggregator.bandwidth(19.3).is_none());
        assert_close(15.7, aggregator.bandwidth(0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_repeated_parse_is_idempotent() {
        let first = aggregate_fixture();
        let second = aggregate_fixture();
        assert_eq!(first.intervals(), second.intervals());
    }
}
