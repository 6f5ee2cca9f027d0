//! Decay (fling) animation
//!
//! Models a released gesture decelerating exponentially from its release
//! velocity. Each millisecond the velocity is multiplied by `deceleration`,
//! which gives a closed form for any frame length:
//!
//! ```text
//! kv = deceleration ^ dt_ms
//! x' = x + v0 * deceleration * (1 - kv) / (1 - deceleration)
//! v' = v0 * kv
//! ```
//!
//! With a clamp range the animation stops at whichever bound it reaches.

/// Velocity (px/s) below which a decay is considered at rest
pub const VELOCITY_EPSILON: f64 = 1.0;

/// Configuration for a decay animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecayConfig {
    /// Release velocity in pixels per second
    pub velocity: f64,
    /// Per-millisecond velocity retention, in `(0, 1)`
    pub deceleration: f64,
    /// Optional `[min, max]` bounds
    pub clamp: Option<(f64, f64)>,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            velocity: 0.0,
            deceleration: 0.998,
            clamp: None,
        }
    }
}

impl DecayConfig {
    pub fn with_velocity(velocity: f64) -> Self {
        Self {
            velocity,
            ..Default::default()
        }
    }

    pub fn deceleration(mut self, deceleration: f64) -> Self {
        self.deceleration = deceleration;
        self
    }

    pub fn clamp(mut self, min: f64, max: f64) -> Self {
        self.clamp = Some((min, max.max(min)));
        self
    }
}

/// A running decay animation
#[derive(Clone, Debug)]
pub struct DecayAnimation {
    value: f64,
    velocity: f64,
    config: DecayConfig,
    finished: bool,
}

impl DecayAnimation {
    pub fn new(from: f64, config: DecayConfig) -> Self {
        let mut animation = Self {
            value: from,
            velocity: config.velocity,
            config,
            finished: false,
        };

        let invalid = !(config.deceleration > 0.0 && config.deceleration < 1.0)
            || !config.velocity.is_finite();
        if invalid {
            tracing::debug!(
                deceleration = config.deceleration,
                velocity = config.velocity,
                "Decay with invalid parameters settles immediately"
            );
            animation.velocity = 0.0;
        }

        if let Some((min, max)) = config.clamp {
            let clamped = from.clamp(min, max);
            let pushing_out = (clamped <= min && animation.velocity < 0.0)
                || (clamped >= max && animation.velocity > 0.0);
            animation.value = clamped;
            if pushing_out {
                animation.velocity = 0.0;
            }
        }

        if animation.velocity.abs() < VELOCITY_EPSILON {
            animation.velocity = 0.0;
            animation.finished = true;
        }
        animation
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance by `dt` seconds and return the new value
    pub fn step(&mut self, dt: f64) -> f64 {
        if self.finished || dt <= 0.0 {
            return self.value;
        }

        let dt_ms = dt * 1000.0;
        let decel = self.config.deceleration;
        let kv = decel.powf(dt_ms);
        let kx = decel * (1.0 - kv) / (1.0 - decel);
        let v0 = self.velocity / 1000.0;

        self.value += v0 * kx;
        self.velocity = v0 * kv * 1000.0;

        if let Some((min, max)) = self.config.clamp {
            if self.value <= min {
                self.value = min;
                self.finish();
                return self.value;
            }
            if self.value >= max {
                self.value = max;
                self.finish();
                return self.value;
            }
        }

        if self.velocity.abs() < VELOCITY_EPSILON {
            self.finish();
        }
        self.value
    }

    fn finish(&mut self) {
        self.velocity = 0.0;
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(animation: &mut DecayAnimation) -> usize {
        let mut frames = 0;
        while !animation.is_finished() && frames < 10_000 {
            animation.step(1.0 / 60.0);
            frames += 1;
        }
        frames
    }

    #[test]
    fn test_decay_moves_in_velocity_direction_and_stops() {
        let mut decay = DecayAnimation::new(0.0, DecayConfig::with_velocity(1000.0));
        let frames = run(&mut decay);

        assert!(decay.is_finished());
        assert!(frames < 10_000);
        // Total travel approaches v0 * d / (1 - d) = 1 * 0.998 / 0.002 ≈ 499px
        assert!(decay.value() > 450.0 && decay.value() < 500.0);
    }

    #[test]
    fn test_decay_respects_clamp() {
        let mut decay = DecayAnimation::new(50.0, DecayConfig::with_velocity(5000.0).clamp(0.0, 100.0));
        run(&mut decay);
        assert_eq!(decay.value(), 100.0);

        let mut decay =
            DecayAnimation::new(50.0, DecayConfig::with_velocity(-5000.0).clamp(0.0, 100.0));
        run(&mut decay);
        assert_eq!(decay.value(), 0.0);
    }

    #[test]
    fn test_zero_velocity_finishes_immediately() {
        let decay = DecayAnimation::new(30.0, DecayConfig::with_velocity(0.0));
        assert!(decay.is_finished());
        assert_eq!(decay.value(), 30.0);
    }

    #[test]
    fn test_start_outside_clamp_is_clamped() {
        let decay = DecayAnimation::new(-20.0, DecayConfig::with_velocity(-300.0).clamp(0.0, 100.0));
        assert!(decay.is_finished());
        assert_eq!(decay.value(), 0.0);
    }

    #[test]
    fn test_invalid_deceleration_settles() {
        let decay = DecayAnimation::new(10.0, DecayConfig::with_velocity(500.0).deceleration(1.5));
        assert!(decay.is_finished());
        assert_eq!(decay.value(), 10.0);
    }
}
