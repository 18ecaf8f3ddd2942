//! Wall-clock pacing for interactive stepping.

use std::time::Instant;

/// Gates stepping so the tick count tracks `target_ticks_per_second`.
///
/// A step is allowed when the target is non-positive (unthrottled), when
/// the engine is still at tick 0, or when the tick count lags
/// `target · elapsed`.
#[derive(Debug, Clone)]
pub struct RealtimePacer {
    target_ticks_per_second: f64,
    started: Option<Instant>,
}

impl RealtimePacer {
    pub fn new(target_ticks_per_second: f64) -> Self {
        Self {
            target_ticks_per_second,
            started: None,
        }
    }

    pub fn unthrottled() -> Self {
        Self::new(0.0)
    }

    pub fn target(&self) -> f64 {
        self.target_ticks_per_second
    }

    /// Decide whether to step now.
    pub fn should_step(&mut self, tick: usize) -> bool {
        self.should_step_at(tick, Instant::now())
    }

    /// Decide whether to step at `now`. The clock starts at tick 0.
    pub fn should_step_at(&mut self, tick: usize, now: Instant) -> bool {
        if tick == 0 || self.started.is_none() {
            self.started = Some(now);
        }
        if self.target_ticks_per_second <= 0.0 || tick == 0 {
            return true;
        }
        let elapsed = self
            .started
            .map(|s| now.saturating_duration_since(s).as_secs_f64())
            .unwrap_or(0.0);
        (tick as f64) < self.target_ticks_per_second * elapsed
    }
}
