use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default interval between two progress reports
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Weight of the newest sample in the smoothed speed
const SMOOTHING: f64 = 0.3;

/// The progress of a multi-file transfer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Relative path of the file currently in flight
    pub current_file: Option<String>,
    /// Bytes transmitted so far, over all files
    pub bytes_transmitted: u64,
    /// Total bytes of the entire transmission
    pub total_bytes: u64,
    /// Files completely transmitted
    pub files_transmitted: usize,
    /// Total number of files of the entire transmission
    pub total_files: usize,
    /// Estimated current transmission speed
    pub bits_per_second_estimation: u64,
}

impl Progress {
    pub fn new(total_bytes: u64, total_files: usize) -> Self {
        Self {
            total_bytes,
            total_files,
            ..Default::default()
        }
    }

    /// Fraction of bytes transmitted, in `0.0..=1.0`
    ///
    /// An empty transmission counts as complete.
    pub fn total_progress(&self) -> f32 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_transmitted as f64 / self.total_bytes as f64) as f32
    }

    pub fn remaining_seconds_estimation(&self) -> f32 {
        let remaining = self.total_bytes.saturating_sub(self.bytes_transmitted) as f32;
        remaining / ((self.bits_per_second_estimation as f32 + 1.0) / 8.0)
    }
}

/// Exponentially smoothed transfer speed, sampled at a fixed interval
#[derive(Debug)]
pub struct SpeedEstimator {
    interval: Duration,
    last_sample: Instant,
    last_bytes: u64,
    bits_per_second: Option<f64>,
}

impl SpeedEstimator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sample: Instant::now(),
            last_bytes: 0,
            bits_per_second: None,
        }
    }

    /// Feed the running byte count
    ///
    /// Returns `true` when a new sample was taken, which is also the signal
    /// to report progress.
    pub fn update(&mut self, bytes_total: u64) -> bool {
        self.update_at(bytes_total, Instant::now())
    }

    pub(crate) fn update_at(&mut self, bytes_total: u64, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_sample);
        if elapsed < self.interval {
            return false;
        }

        let delta = bytes_total.saturating_sub(self.last_bytes) as f64;
        let sample = delta * 8.0 / elapsed.as_secs_f64();
        self.bits_per_second = Some(match self.bits_per_second {
            Some(previous) => previous + SMOOTHING * (sample - previous),
            None => sample,
        });
        self.last_sample = now;
        self.last_bytes = bytes_total;
        true
    }

    pub fn bits_per_second(&self) -> u64 {
        self.bits_per_second.unwrap_or(0.0).round() as u64
    }
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new(PROGRESS_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_progress() {
        let mut p = Progress::new(200, 2);
        assert_eq!(p.total_progress(), 0.0);
        p.bytes_transmitted = 50;
        assert!((p.total_progress() - 0.25).abs() < f32::EPSILON);
        assert_eq!(Progress::new(0, 0).total_progress(), 1.0);
    }

    #[test]
    fn test_remaining_seconds() {
        let mut p = Progress::new(1_000, 1);
        p.bits_per_second_estimation = 7_999;
        // 1000 bytes at 1000 bytes/s
        assert!((p.remaining_seconds_estimation() - 1.0).abs() < 1e-3);

        p.bytes_transmitted = 1_000;
        assert_eq!(p.remaining_seconds_estimation(), 0.0);
    }

    #[test]
    fn test_speed_estimator_respects_interval() {
        let start = Instant::now();
        let mut est = SpeedEstimator::new(Duration::from_secs(1));
        est.last_sample = start;

        assert!(!est.update_at(500, start + Duration::from_millis(100)));
        assert_eq!(est.bits_per_second(), 0);

        assert!(est.update_at(1_000, start + Duration::from_secs(1)));
        assert_eq!(est.bits_per_second(), 8_000);

        // second sample: 3000 bytes/s, smoothed toward it
        assert!(est.update_at(4_000, start + Duration::from_secs(2)));
        assert_eq!(est.bits_per_second(), 8_000 + (0.3f64 * 16_000.0) as u64);
    }
}
