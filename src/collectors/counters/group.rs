//! Starts and stops a set of watchers together

use log::info;

use crate::collectors::counters::watcher::{PollingWatcher, WatcherStats};
use crate::collectors::errors::{TelemetryError, TelemetryResult};

/// A set of watchers sharing one lifecycle, typically one per interface
#[derive(Default)]
pub struct WatcherGroup {
    watchers: Vec<PollingWatcher>,
}

impl WatcherGroup {
    pub fn new(watchers: Vec<PollingWatcher>) -> Self {
        Self { watchers }
    }

    pub fn push(&mut self, watcher: PollingWatcher) {
        self.watchers.push(watcher);
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    pub fn watchers(&self) -> &[PollingWatcher] {
        &self.watchers
    }

    pub fn watchers_mut(&mut self) -> &mut [PollingWatcher] {
        &mut self.watchers
    }

    /// Starts every watcher; an empty group is an error
    pub fn start(&mut self) -> TelemetryResult<()> {
        if self.watchers.is_empty() {
            return Err(TelemetryError::NoWatchers);
        }
        for watcher in &mut self.watchers {
            watcher.start();
        }
        info!("Started {} counter watchers", self.watchers.len());
        Ok(())
    }

    /// Stops every watcher, waiting for each in-flight tick.
    ///
    /// All stop flags go up before the first wait, so a watcher stuck in a
    /// slow capture cannot keep the others writing.
    pub async fn stop(&mut self) {
        for watcher in &mut self.watchers {
            watcher.signal_stop();
        }
        for watcher in &mut self.watchers {
            watcher.stop().await;
        }
    }

    /// Progress of each watcher keyed by interface
    pub fn stats(&self) -> Vec<(String, WatcherStats)> {
        self.watchers
            .iter()
            .map(|watcher| (watcher.config().interface.clone(), watcher.stats()))
            .collect()
    }
}
