use std::collections::VecDeque;

const WINDOW: usize = 60;
const PUBLISH_EVERY_MS: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    pub fps: f64,
    pub frame_time_ms: f64,
}

/// Rolling average over the last 60 frames, republished every half second
/// so the readout stays legible.
#[derive(Debug, Default)]
pub struct FrameStats {
    samples: VecDeque<f64>,
    since_publish_ms: f64,
    latest: Option<FrameReport>,
}

impl FrameStats {
    pub fn record(&mut self, frame_time_ms: f64) {
        self.samples.push_back(frame_time_ms);
        if self.samples.len() > WINDOW {
            self.samples.pop_front();
        }

        self.since_publish_ms += frame_time_ms;
        if self.since_publish_ms >= PUBLISH_EVERY_MS {
            let avg = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
            self.latest = Some(FrameReport {
                fps: if avg > 0.0 { 1000.0 / avg } else { 0.0 },
                frame_time_ms: avg,
            });
            self.since_publish_ms = 0.0;
        }
    }

    pub fn latest(&self) -> Option<FrameReport> {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_published_before_half_a_second() {
        let mut stats = FrameStats::default();
        for _ in 0..29 {
            stats.record(16.0);
        }
        assert!(stats.latest().is_none());
    }

    #[test]
    fn publishes_average_of_recent_frames() {
        let mut stats = FrameStats::default();
        for _ in 0..50 {
            stats.record(10.0);
        }
        let report = stats.latest().unwrap();
        assert!((report.frame_time_ms - 10.0).abs() < 1e-9);
        assert!((report.fps - 100.0).abs() < 1e-9);
    }

    #[test]
    fn old_frames_fall_out_of_the_window() {
        let mut stats = FrameStats::default();
        for _ in 0..60 {
            stats.record(40.0);
        }
        for _ in 0..120 {
            stats.record(10.0);
        }
        let report = stats.latest().unwrap();
        assert!((report.frame_time_ms - 10.0).abs() < 1e-9);
    }
}
