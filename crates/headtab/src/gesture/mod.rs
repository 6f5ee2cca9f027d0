//! Gesture recognition
//!
//! - [`arbiter`]: which recognizers own a touch sequence
//! - [`composer`]: what the header and outer recognizers do with it

pub mod arbiter;
pub mod composer;

pub use arbiter::{ActivationEnvelope, Dispatch, GestureArbiter, RecognizerId, RecognizerSpec};
pub use composer::GestureComposer;
