//! Gesture and scroll events
//!
//! Raw touch input arrives as [`TouchEvent`]s. Gesture recognizers turn those
//! into [`PanEvent`]s, and scrollable scenes report their offsets as
//! [`ScrollEvent`]s.

/// Where a touch sequence started
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TouchTarget {
    /// On the collapsible header or the tab bar
    Header,
    /// On a scene's scrollable content
    #[default]
    Content,
}

/// Phase of a raw touch event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// A raw touch sample. Translation is measured from the touch-down point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub target: TouchTarget,
    pub translation_x: f64,
    pub translation_y: f64,
    /// Velocity in pixels per second
    pub velocity_x: f64,
    pub velocity_y: f64,
}

impl TouchEvent {
    pub fn down(target: TouchTarget) -> Self {
        Self {
            phase: TouchPhase::Down,
            target,
            translation_x: 0.0,
            translation_y: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
        }
    }

    pub fn moved(target: TouchTarget, translation_x: f64, translation_y: f64) -> Self {
        Self {
            phase: TouchPhase::Move,
            translation_x,
            translation_y,
            ..Self::down(target)
        }
    }

    pub fn up(target: TouchTarget, velocity_y: f64) -> Self {
        Self {
            phase: TouchPhase::Up,
            velocity_y,
            ..Self::down(target)
        }
    }

    pub fn cancel(target: TouchTarget) -> Self {
        Self {
            phase: TouchPhase::Cancel,
            ..Self::down(target)
        }
    }

    /// Attach a velocity sample
    pub fn with_velocity(mut self, velocity_x: f64, velocity_y: f64) -> Self {
        self.velocity_x = velocity_x;
        self.velocity_y = velocity_y;
        self
    }
}

/// Lifecycle phase of a pan gesture as seen by its handlers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanPhase {
    /// Touch went down inside the recognizer; not yet active
    Begin,
    /// The activation envelope was crossed
    Start,
    /// Movement while active
    Update,
    /// Released while active
    End,
    /// Aborted, either by the platform or by arbitration
    Cancel,
}

/// A pan gesture event delivered to a recognizer's handlers
///
/// Translation is rebased to the point where the recognizer activated, so the
/// first `Update` after `Start` always reports zero translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanEvent {
    pub phase: PanPhase,
    pub translation_x: f64,
    pub translation_y: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
}

impl PanEvent {
    pub fn new(phase: PanPhase) -> Self {
        Self {
            phase,
            translation_x: 0.0,
            translation_y: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
        }
    }

    pub fn update(translation_y: f64) -> Self {
        Self {
            translation_y,
            ..Self::new(PanPhase::Update)
        }
    }

    pub fn end(velocity_y: f64) -> Self {
        Self {
            velocity_y,
            ..Self::new(PanPhase::End)
        }
    }

    /// Whether the gesture is over
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, PanPhase::End | PanPhase::Cancel)
    }
}

/// A scroll offset report from a scene's scrollable surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollEvent {
    /// Vertical content offset; may be negative during platform overscroll
    pub offset_y: f64,
    /// Milliseconds on the host's monotonic clock
    pub timestamp_ms: f64,
}

impl ScrollEvent {
    pub fn new(offset_y: f64, timestamp_ms: f64) -> Self {
        Self {
            offset_y,
            timestamp_ms,
        }
    }
}
