//! Animation scheduler
//!
//! Owns every running animation and advances them each frame. Owners keep
//! the returned [`AnimationId`] and cancel it before writing the animated
//! value themselves, so two animations never fight over one value.

use crate::decay::DecayAnimation;
use crate::timing::TimingAnimation;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    pub struct AnimationId;
}

/// Any animation the scheduler can drive
#[derive(Clone, Debug)]
pub enum Animation {
    Decay(DecayAnimation),
    Timing(TimingAnimation),
}

impl Animation {
    pub fn value(&self) -> f64 {
        match self {
            Animation::Decay(decay) => decay.value(),
            Animation::Timing(timing) => timing.value(),
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            Animation::Decay(decay) => decay.is_finished(),
            Animation::Timing(timing) => timing.is_finished(),
        }
    }

    pub fn step(&mut self, dt: f64) -> f64 {
        match self {
            Animation::Decay(decay) => decay.step(dt),
            Animation::Timing(timing) => timing.step(dt),
        }
    }
}

impl From<DecayAnimation> for Animation {
    fn from(decay: DecayAnimation) -> Self {
        Animation::Decay(decay)
    }
}

impl From<TimingAnimation> for Animation {
    fn from(timing: TimingAnimation) -> Self {
        Animation::Timing(timing)
    }
}

/// One animation's value after a tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSample {
    pub id: AnimationId,
    pub value: f64,
    /// The animation completed this frame and has been removed
    pub finished: bool,
}

/// The animation scheduler that ticks all active animations
pub struct AnimationScheduler {
    animations: SlotMap<AnimationId, Animation>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            animations: SlotMap::with_key(),
        }
    }

    pub fn start(&mut self, animation: impl Into<Animation>) -> AnimationId {
        self.animations.insert(animation.into())
    }

    pub fn is_running(&self, id: AnimationId) -> bool {
        self.animations.contains_key(id)
    }

    /// Stop an animation, returning the value it had reached
    pub fn cancel(&mut self, id: AnimationId) -> Option<f64> {
        self.animations.remove(id).map(|animation| animation.value())
    }

    /// Tick all animations by `dt` seconds
    ///
    /// Finished animations report their final value once and are removed.
    pub fn tick(&mut self, dt: f64) -> SmallVec<[AnimationSample; 4]> {
        let mut samples: SmallVec<[AnimationSample; 4]> = SmallVec::new();
        for (id, animation) in self.animations.iter_mut() {
            let value = animation.step(dt);
            samples.push(AnimationSample {
                id,
                value,
                finished: animation.is_finished(),
            });
        }
        for sample in &samples {
            if sample.finished {
                self.animations.remove(sample.id);
            }
        }
        samples
    }

    /// Check if any animations are still active
    pub fn has_active_animations(&self) -> bool {
        !self.animations.is_empty()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}
