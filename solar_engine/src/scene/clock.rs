//! Simulated time.

use std::time::Duration;

/// Simulated seconds, advanced from real frame time.
///
/// Simulated time is the only input of entity transforms.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    time: f64,
    scale: f64,
    paused: bool,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self { time: 0.0, scale: 1.0, paused: false }
    }

    /// Current simulated time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Simulated seconds per real second (negative runs backwards)
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Advance by `real_dt` of wall-clock time, returns the new simulated time
    pub fn advance(&mut self, real_dt: Duration) -> f64 {
        if !self.paused {
            self.time += real_dt.as_secs_f64() * self.scale;
        }
        self.time
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}
