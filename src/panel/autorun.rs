//! Repeating run trigger for one panel.

use crate::config::types::{PlaygroundError, Result};
use crate::panel::controller::{PanelController, RunOutcome};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicUsize,
    runs: AtomicUsize,
    skipped: AtomicUsize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AutoRunStats {
    pub ticks: usize,
    pub runs: usize,
    pub skipped: usize,
}

/// Fires `run_code` on an interval; ticks that land on a busy panel or an
/// editor switch are skipped, never queued.
///
/// Stopping only ends the tick loop. A run already in progress completes.
pub struct AutoRunner {
    controller: Arc<PanelController>,
    switching: Arc<AtomicBool>,
    interval: Duration,
    counters: Arc<Counters>,
    stop_signal: Option<watch::Sender<bool>>,
}

impl AutoRunner {
    pub fn new(controller: Arc<PanelController>, switching: Arc<AtomicBool>, interval: Duration) -> Self {
        Self {
            controller,
            switching,
            interval,
            counters: Arc::new(Counters::default()),
            stop_signal: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        self.stop_signal.is_some()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(PlaygroundError::Config(
                "auto-run interval must be greater than zero".to_string(),
            ));
        }
        self.stop();

        let controller = Arc::clone(&self.controller);
        let switching = Arc::clone(&self.switching);
        let counters = Arc::clone(&self.counters);
        let period = self.interval;
        let (stop_tx, mut stop_rx) = watch::channel(false);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                // the stop signal is only observed between runs
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }
                counters.ticks.fetch_add(1, Ordering::Relaxed);
                if controller.is_running() || switching.load(Ordering::SeqCst) {
                    counters.skipped.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
                match controller.run_code(None).await {
                    RunOutcome::Skipped(_) => counters.skipped.fetch_add(1, Ordering::Relaxed),
                    _ => counters.runs.fetch_add(1, Ordering::Relaxed),
                };
            }
        });
        self.stop_signal = Some(stop_tx);
        log::info!(
            "Auto-run every {:?} on panel {}",
            period,
            self.controller.id()
        );
        Ok(())
    }

    /// Change the interval, restarting the trigger if it is active
    pub fn set_interval(&mut self, interval: Duration) -> Result<()> {
        self.interval = interval;
        if self.is_active() {
            self.start()?;
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(stop) = self.stop_signal.take() {
            // the task may already be gone
            let _ = stop.send(true);
            log::debug!("Auto-run stopped on panel {}", self.controller.id());
        }
    }

    pub fn stats(&self) -> AutoRunStats {
        AutoRunStats {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            runs: self.counters.runs.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
        }
    }
}

impl Drop for AutoRunner {
    fn drop(&mut self) {
        self.stop();
    }
}
