/// Frame loop counters
use std::time::{Duration, Instant};

/// Frames between two DEBUG summaries
const REPORT_INTERVAL: u64 = 600;

#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub frames_submitted: u64,
    pub frames_skipped: u64,
    pub invalidations: u64,
    /// Wall time between the last two presented frames
    pub last_frame_time: Duration,
    last_present: Option<Instant>,
}

impl FrameStats {
    pub(crate) fn record_submitted(&mut self) {
        let now = Instant::now();
        if let Some(previous) = self.last_present {
            self.last_frame_time = now - previous;
        }
        self.last_present = Some(now);
        self.frames_submitted += 1;
        if self.frames_submitted % REPORT_INTERVAL == 0 {
            crate::engine_debug!("solar3d::frame",
                "{} frames submitted, {} skipped, {} invalidations, last frame {:.2} ms",
                self.frames_submitted, self.frames_skipped, self.invalidations,
                self.last_frame_time.as_secs_f64() * 1000.0);
        }
    }

    pub(crate) fn record_skipped(&mut self) {
        self.frames_skipped += 1;
    }

    pub(crate) fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }
}
