//! Property tests for clamped decay and timed animations.
//!
//! Whatever the release velocity and frame pacing, a clamped decay must never
//! leave its clamp range and must come to rest; a timed animation must land
//! exactly on its target.

use headtab_animation::{
    AnimationScheduler, DecayAnimation, DecayConfig, TimingAnimation, TimingConfig,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn clamped_decay_stays_in_range(
        start in -200.0f64..400.0,
        velocity in -20_000.0f64..20_000.0,
        max in 0.0f64..300.0,
        frame_ms in 4.0f64..40.0,
    ) {
        let mut decay = DecayAnimation::new(start, DecayConfig::with_velocity(velocity).clamp(0.0, max));
        prop_assert!(decay.value() >= 0.0 && decay.value() <= max);

        let mut frames = 0;
        while !decay.is_finished() && frames < 20_000 {
            let value = decay.step(frame_ms / 1000.0);
            prop_assert!((0.0..=max).contains(&value));
            frames += 1;
        }
        prop_assert!(decay.is_finished());
    }

    #[test]
    fn timing_lands_on_target(
        from in -500.0f64..500.0,
        to in -500.0f64..500.0,
        duration in 0.0f64..1000.0,
    ) {
        let mut scheduler = AnimationScheduler::new();
        scheduler.start(TimingAnimation::new(from, to, TimingConfig::duration(duration)));

        let mut last = None;
        for _ in 0..200 {
            for sample in scheduler.tick(0.016) {
                if sample.finished {
                    last = Some(sample.value);
                }
            }
            if last.is_some() {
                break;
            }
        }
        prop_assert_eq!(last, Some(to));
    }
}
