use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;
use std::future::Future;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use throughput_watcher::collectors::bandwidth::{
    BandwidthAggregator, format_bandwidth, format_interval_record,
};
use throughput_watcher::collectors::{
    Connection, LocalConnection, OutputSink, PollingWatcher, WatcherGroup, WriterSink,
};
use throughput_watcher::config::{BandwidthSettings, WatcherSettings};

/// One aggregated interval in JSON output
#[derive(Debug, Serialize)]
struct IntervalRecord {
    interval_start: f64,
    mbits_per_second: f64,
}

pub struct BandwidthCommandHandler {
    aggregator: BandwidthAggregator,
}

impl BandwidthCommandHandler {
    pub fn new(settings: &BandwidthSettings, interval: Option<f64>) -> Self {
        let aggregator = match interval.or(settings.interval_secs) {
            Some(interval) => BandwidthAggregator::with_interval(interval),
            None => BandwidthAggregator::new(),
        };
        Self { aggregator }
    }

    pub fn handle_bandwidth_command(&mut self, file: Option<PathBuf>, json: bool, human: bool) -> Result<()> {
        match &file {
            Some(path) => self.consume_file(path)?,
            None => self.consume_reader(io::stdin().lock())?,
        }

        if self.aggregator.rejected_lines() > 0 {
            warn!(
                "{} malformed bandwidth lines were skipped",
                self.aggregator.rejected_lines()
            );
        }
        info!(
            "Aggregated {} intervals ({:?} layout)",
            self.aggregator.len(),
            self.aggregator.layout()
        );

        if json {
            let records: Vec<IntervalRecord> = self
                .aggregator
                .iter()
                .map(|(interval_start, mbits_per_second)| IntervalRecord {
                    interval_start,
                    mbits_per_second,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
            return Ok(());
        }

        for (interval_start, mbits) in self.aggregator.iter() {
            if human {
                println!("{:>8}s  {}", format!("{:?}", interval_start), format_bandwidth(mbits));
            } else {
                println!("{}", format_interval_record(interval_start, mbits));
            }
        }
        Ok(())
    }

    fn consume_file(&mut self, path: &Path) -> Result<()> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open bandwidth capture {}", path.display()))?;
        self.consume_reader(BufReader::new(file))
    }

    fn consume_reader<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for line in reader.lines() {
            let line = line.context("Failed to read bandwidth capture")?;
            self.aggregator.consume(&line);
        }
        Ok(())
    }
}

pub struct WatchCommandHandler {
    settings: WatcherSettings,
}

impl WatchCommandHandler {
    pub fn new(settings: WatcherSettings) -> Self {
        Self { settings }
    }

    pub async fn handle_watch_command(
        &self,
        interfaces: Vec<String>,
        interval: Option<u64>,
        timestamp: bool,
        output: Option<PathBuf>,
        duration: Option<u64>,
    ) -> Result<()> {
        let connection: Arc<dyn Connection> = Arc::new(LocalConnection::new());
        let sink: Arc<dyn OutputSink> = match &output {
            Some(path) => Arc::new(
                WriterSink::append(path)
                    .with_context(|| format!("Failed to open output file {}", path.display()))?,
            ),
            None => Arc::new(WriterSink::stdout()),
        };

        let interfaces = if interfaces.is_empty() {
            vec![self.settings.interface.clone()]
        } else {
            interfaces
        };

        let mut group = WatcherGroup::default();
        for interface in interfaces {
            let mut settings = self.settings.clone();
            settings.interface = interface;
            if let Some(interval) = interval {
                settings.interval_secs = interval;
            }
            settings.timestamp |= timestamp;
            group.push(PollingWatcher::new(
                settings.to_watcher_config(),
                Arc::clone(&connection),
                Arc::clone(&sink),
            ));
        }

        group.start().context("Failed to start counter watchers")?;

        match duration {
            Some(seconds) => {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(seconds)) => {
                        info!("Watch duration of {}s elapsed", seconds);
                    }
                    result = tokio::signal::ctrl_c() => {
                        result.context("Failed to listen for Ctrl-C")?;
                    }
                }
            }
            None => {
                tokio::signal::ctrl_c()
                    .await
                    .context("Failed to listen for Ctrl-C")?;
            }
        }

        info!("Stopping counter watchers (press Ctrl-C again to exit immediately)");
        if !stop_group(&mut group, tokio::signal::ctrl_c()).await? {
            warn!("Exiting without waiting for in-flight captures");
        }
        for (interface, stats) in group.stats() {
            info!(
                "Watcher '{}': {} ticks, {} records written, {} consecutive failures",
                interface, stats.ticks, stats.records_written, stats.consecutive_failures
            );
        }
        Ok(())
    }
}

/// Stops `group`, giving up on in-flight ticks once `interrupt` completes.
///
/// Returns `false` when the wait was abandoned. The watchers' stop flags are
/// raised either way, so an abandoned tick never writes.
async fn stop_group<F>(group: &mut WatcherGroup, interrupt: F) -> Result<bool>
where
    F: Future<Output = io::Result<()>>,
{
    let finished = tokio::select! {
        _ = group.stop() => true,
        result = interrupt => {
            result.context("Failed to listen for Ctrl-C")?;
            false
        }
    };
    if !finished {
        for watcher in group.watchers_mut() {
            watcher.signal_stop();
        }
    }
    Ok(finished)
}
