/// Wall-time measurement with named checkpoints
///
/// A [`Timer`] is consumed by [`Timer::stop`], so no checkpoint can be recorded
/// after the final report has been produced.
use crate::config::types::{PlaygroundError, Result};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};

/// Named intermediate measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkpoint {
    pub name: String,
    /// Elapsed time since the timer started
    pub time: Duration,
}

/// Final measurement of a stopped timer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerReport {
    pub label: String,
    pub total_time: Duration,
    pub checkpoints: Vec<Checkpoint>,
}

impl TimerReport {
    /// Total time in fractional milliseconds, rounded to microseconds
    pub fn total_ms(&self) -> f64 {
        (self.total_time.as_secs_f64() * 1_000_000.0).round() / 1000.0
    }

    pub fn formatted(&self) -> String {
        format_duration(self.total_time)
    }
}

#[derive(Debug)]
pub struct Timer {
    label: String,
    started: Instant,
    checkpoints: Vec<Checkpoint>,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
            checkpoints: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Record elapsed time under `name`, or "Checkpoint N" when unnamed
    pub fn checkpoint(&mut self, name: Option<&str>) -> Checkpoint {
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("Checkpoint {}", self.checkpoints.len() + 1),
        };
        let checkpoint = Checkpoint {
            name,
            time: self.started.elapsed(),
        };
        self.checkpoints.push(checkpoint.clone());
        checkpoint
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn stop(self) -> TimerReport {
        TimerReport {
            total_time: self.started.elapsed(),
            label: self.label,
            checkpoints: self.checkpoints,
        }
    }

    /// Time a synchronous closure
    pub fn measure<T>(label: &str, f: impl FnOnce() -> T) -> (T, TimerReport) {
        let timer = Self::start(label);
        let value = f();
        (value, timer.stop())
    }

    /// Time a future until it resolves
    pub async fn measure_async<F: Future>(label: &str, fut: F) -> (F::Output, TimerReport) {
        let timer = Self::start(label);
        let value = fut.await;
        (value, timer.stop())
    }
}

/// Format milliseconds as "Nms", "Ns Mms" or "Nm Ss"
pub fn format_time(ms: f64) -> Result<String> {
    if !ms.is_finite() || ms < 0.0 {
        return Err(PlaygroundError::InvalidTime(ms));
    }

    if ms >= 60_000.0 {
        let minutes = (ms / 60_000.0).floor();
        let seconds = ((ms % 60_000.0) / 1000.0).floor();
        return Ok(format!("{}m {}s", minutes, seconds));
    }

    if ms >= 1000.0 {
        let seconds = (ms / 1000.0).floor();
        let millis = (ms % 1000.0).floor();
        return Ok(format!("{}s {}ms", seconds, millis));
    }

    Ok(format!("{}ms", ms.round()))
}

/// Infallible formatting for measured durations
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_secs_f64() * 1000.0;
    // a Duration is always finite and non-negative
    format_time(ms).unwrap_or_else(|_| format!("{}ms", duration.as_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_known_buckets() {
        assert_eq!(format_time(999.0).unwrap(), "999ms");
        assert_eq!(format_time(1500.0).unwrap(), "1s 500ms");
        assert_eq!(format_time(65000.0).unwrap(), "1m 5s");
        assert_eq!(format_time(0.4).unwrap(), "0ms");
    }

    #[test]
    fn rejects_non_finite_time() {
        assert!(matches!(
            format_time(f64::NAN),
            Err(PlaygroundError::InvalidTime(_))
        ));
        assert!(format_time(f64::INFINITY).is_err());
        assert!(format_time(-1.0).is_err());
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(Duration::from_millis(61_250)), "1m 1s");
        assert_eq!(format_duration(Duration::from_micros(2_500_000)), "2s 500ms");
    }

    #[test]
    fn checkpoints_are_ordered_and_named() {
        let mut timer = Timer::start("task");
        let first = timer.checkpoint(Some("parse"));
        let second = timer.checkpoint(None);
        assert_eq!(first.name, "parse");
        assert_eq!(second.name, "Checkpoint 2");
        assert!(second.time >= first.time);

        let report = timer.stop();
        assert_eq!(report.label, "task");
        assert_eq!(report.checkpoints.len(), 2);
        assert!(report.total_time >= second.time);
    }

    #[test]
    fn measure_returns_value_and_report() {
        let (value, report) = Timer::measure("sum", || (1..=10).sum::<u32>());
        assert_eq!(value, 55);
        assert!(report.checkpoints.is_empty());
        assert!(report.total_ms() >= 0.0);
    }

    #[tokio::test]
    async fn measure_async_covers_suspension() {
        let (_, report) = Timer::measure_async(
            "sleep",
            tokio::time::sleep(Duration::from_millis(5)),
        )
        .await;
        assert!(report.total_time >= Duration::from_millis(5));
    }
}
