use std::time::{Duration, Instant};

enum ClockSource {
    Wall { start: Instant },
    Manual,
}

/// Tick clock handed to the dispatcher every frame.
///
/// Wall clocks follow `Instant`; manual clocks only move through [`Time::advance_to`], which keeps
/// replays deterministic.
pub struct Time {
    source: ClockSource,
    elapsed: Duration,
    pub delta: Duration,
}

impl Time {
    pub fn new() -> Self {
        Self { source: ClockSource::Wall { start: Instant::now() }, elapsed: Duration::ZERO, delta: Duration::ZERO }
    }

    pub fn manual() -> Self {
        Self { source: ClockSource::Manual, elapsed: Duration::ZERO, delta: Duration::ZERO }
    }

    pub fn tick(&mut self) {
        if let ClockSource::Wall { start } = &self.source {
            let now = start.elapsed();
            self.delta = now.saturating_sub(self.elapsed);
            self.elapsed = now;
        }
    }

    pub fn advance_to(&mut self, at: Duration) {
        self.delta = at.saturating_sub(self.elapsed);
        self.elapsed = at;
    }

    pub fn advance_by(&mut self, step: Duration) {
        self.advance_to(self.elapsed + step);
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.source, ClockSource::Manual)
    }

    pub fn now(&self) -> Duration {
        self.elapsed
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
