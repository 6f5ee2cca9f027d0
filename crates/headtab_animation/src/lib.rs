//! headtab Animation System
//!
//! Physically-modeled flings, eased timing, and value interpolation for
//! offsets shared between gesture handlers and scrollable scenes.
//!
//! # Features
//!
//! - **Decay**: Velocity-seeded deceleration with optional clamping
//! - **Timing**: Fixed-duration interpolation with easing curves
//! - **Interpolation**: Piecewise-linear range mapping with extrapolation modes
//! - **Cancellable**: Every running animation can be stopped by id

pub mod decay;
pub mod easing;
pub mod interpolate;
pub mod scheduler;
pub mod timing;

pub use decay::{DecayAnimation, DecayConfig};
pub use easing::Easing;
pub use interpolate::{interpolate, Extrapolate};
pub use scheduler::{Animation, AnimationId, AnimationSample, AnimationScheduler};
pub use timing::{TimingAnimation, TimingConfig};
