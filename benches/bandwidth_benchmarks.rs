use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use throughput_watcher::collectors::bandwidth::BandwidthAggregator;
use throughput_watcher::collectors::counters::{CounterSnapshotParser, RateCalculator};

/// Builds a two-stream human capture with a sum line per interval
fn human_capture(intervals: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(intervals * 3 + 1);
    for i in 0..intervals {
        let (start, end) = (i as f64, (i + 1) as f64);
        lines.push(format!("[  3] {:4.1}-{:4.1} sec  1.00 MBytes  8.39 Mbits/sec", start, end));
        lines.push(format!("[  4] {:4.1}-{:4.1} sec   896 KBytes  7.34 Mbits/sec", start, end));
        lines.push(format!("[SUM] {:4.1}-{:4.1} sec  1.88 MBytes  15.7 Mbits/sec", start, end));
    }
    lines.push(format!("[SUM]  0.0-{:.1} sec  1.88 GBytes  15.7 Mbits/sec", intervals as f64 + 0.3));
    lines
}

fn machine_capture(intervals: usize) -> Vec<String> {
    (0..intervals)
        .flat_map(|i| {
            let range = format!("{:.1}-{:.1}", i as f64, (i + 1) as f64);
            [
                format!("20120720091543,192.168.20.62,33595,192.168.20.50,5001,3,{},393216,3145728", range),
                format!("20120720091543,192.168.20.62,33596,192.168.20.50,5001,4,{},393216,3145728", range),
                format!("20120720091543,192.168.20.62,0,192.168.20.50,5001,-1,{},786432,6291456", range),
            ]
        })
        .collect()
}

fn counter_table(receive_bytes: u64) -> String {
    let mut table = String::from(
        "Inter-|   Receive                                                |  Transmit\n \
         face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n",
    );
    for i in 0..32 {
        table.push_str(&format!(
            "  veth{}: {} 116759 0 0 0 0 0 0 52989 577 0 0 0 0 0 0\n",
            i, receive_bytes
        ));
    }
    table.push_str(&format!(
        "wlan0-mon: {} 116759 0 0 0 0 0 0 0 0 0 0 0 0 0 0\n",
        receive_bytes
    ));
    table
}

fn benchmark_bandwidth_aggregation(c: &mut Criterion) {
    let human = human_capture(3600);
    let machine = machine_capture(3600);

    c.bench_function("aggregate_human_capture", |b| {
        b.iter(|| {
            let mut aggregator = BandwidthAggregator::new();
            aggregator.consume_all(black_box(&human));
            black_box(aggregator.len())
        })
    });

    c.bench_function("aggregate_machine_capture", |b| {
        b.iter(|| {
            let mut aggregator = BandwidthAggregator::new();
            aggregator.consume_all(black_box(&machine));
            black_box(aggregator.len())
        })
    });
}

fn benchmark_counter_parsing(c: &mut Criterion) {
    let parser = CounterSnapshotParser::new("wlan0-mon");
    let before = counter_table(15683751);
    let after = counter_table(15683752);

    c.bench_function("parse_counter_table", |b| {
        b.iter(|| black_box(parser.parse(black_box(&after), Utc::now()).is_ok()))
    });

    c.bench_function("counter_delta", |b| {
        b.iter(|| {
            let mut calculator = RateCalculator::new();
            for capture in [&before, &after] {
                if let Ok(snapshot) = parser.parse(capture, Utc::now()) {
                    black_box(calculator.update(snapshot));
                }
            }
        })
    });
}

criterion_group!(benches, benchmark_bandwidth_aggregation, benchmark_counter_parsing);
criterion_main!(benches);
