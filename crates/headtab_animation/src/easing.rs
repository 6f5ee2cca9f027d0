//! Easing curves for timed animations

/// Maps linear progress in `[0, 1]` onto an eased progress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    /// Curve used by offset and opacity animations unless told otherwise
    EaseInOutQuad,
}

impl Easing {
    /// Progress outside `[0, 1]` is clamped first
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => t * (2.0 - t),
            Easing::EaseInOutQuad if t < 0.5 => 2.0 * t * t,
            Easing::EaseInOutQuad => {
                let u = 1.0 - t;
                1.0 - 2.0 * u * u
            }
        }
    }
}
