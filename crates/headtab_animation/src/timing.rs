//! Fixed-duration eased animation

use crate::easing::Easing;

/// Configuration for a timed animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingConfig {
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            duration_ms: 300.0,
            easing: Easing::EaseInOutQuad,
        }
    }
}

impl TimingConfig {
    pub fn duration(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            ..Default::default()
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// A running timed animation from `from` to `to`
#[derive(Clone, Debug)]
pub struct TimingAnimation {
    from: f64,
    to: f64,
    elapsed_ms: f64,
    config: TimingConfig,
}

impl TimingAnimation {
    pub fn new(from: f64, to: f64, config: TimingConfig) -> Self {
        Self {
            from,
            to,
            elapsed_ms: 0.0,
            config,
        }
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn progress(&self) -> f64 {
        if self.config.duration_ms <= 0.0 {
            return 1.0;
        }
        (self.elapsed_ms / self.config.duration_ms).clamp(0.0, 1.0)
    }

    pub fn value(&self) -> f64 {
        let t = self.progress();
        if t >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * self.config.easing.apply(t)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Advance by `dt` seconds and return the new value
    pub fn step(&mut self, dt: f64) -> f64 {
        if dt > 0.0 {
            self.elapsed_ms += dt * 1000.0;
        }
        self.value()
    }
}
