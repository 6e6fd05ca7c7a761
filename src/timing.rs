//! Wall-clock measurement of benchmark phases.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

/// Elapsed time for one measured block, attributed to a row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Measurement {
    pub label: String,
    pub rows: u64,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

impl Measurement {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "====Time of {} {} records: {} ms====",
            self.label,
            self.rows,
            self.elapsed_ms()
        )
    }
}

fn as_millis<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// Monotonic stopwatch around a block of work.
///
/// Uses [`Instant`], so wall-clock adjustments during a run do not skew the
/// result.
#[derive(Debug, Clone, Copy)]
pub struct TimingHarness {
    started: Instant,
}

impl TimingHarness {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn stop(self, label: impl Into<String>, rows: u64) -> Measurement {
        Measurement {
            label: label.into(),
            rows,
            elapsed: self.started.elapsed(),
        }
    }

    /// Time `block` from before its first poll until it resolves.
    pub async fn measure<F, T>(label: impl Into<String>, rows: u64, block: F) -> (Measurement, T)
    where
        F: Future<Output = T>,
    {
        let timer = Self::start();
        let output = block.await;
        (timer.stop(label, rows), output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_measure_covers_block() {
        let (measurement, value) = TimingHarness::measure("INSERT", 1000, async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            7
        })
        .await;

        assert_eq!(value, 7);
        assert_eq!(measurement.rows, 1000);
        assert!(measurement.elapsed >= Duration::from_millis(20));
    }

    #[test]
    fn test_elapsed_never_decreases() {
        let timer = TimingHarness::start();
        let first = timer.elapsed();
        let second = timer.elapsed();
        assert!(second >= first);
    }

    #[test]
    fn test_display_and_json() {
        let m = Measurement {
            label: "INSERT".to_string(),
            rows: 500,
            elapsed: Duration::from_millis(1234),
        };
        assert_eq!(m.to_string(), "====Time of INSERT 500 records: 1234 ms====");
        assert_eq!(
            serde_json::to_string(&m).unwrap(),
            r#"{"label":"INSERT","rows":500,"elapsed_ms":1234}"#
        );
    }
}
