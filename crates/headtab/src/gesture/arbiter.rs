//! Gesture arbitration
//!
//! Decides which recognizers own a touch sequence. Every enabled recognizer
//! whose target was touched begins; each activates once the translation
//! leaves its activation envelope. A recognizer that activates while another
//! one is active must be declared simultaneous with it (in either direction),
//! otherwise it is cancelled.

use headtab_core::events::{PanEvent, PanPhase, TouchEvent, TouchPhase, TouchTarget};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Identity of a recognizer taking part in arbitration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecognizerId {
    /// Drags the header to collapse or expand it
    Header,
    /// Wraps the tab view; drives pull-to-refresh and scene syncing
    Outer,
    /// A scene's native scroll recognizer
    SceneScroll(i32),
    /// A recognizer owned by the application
    External(u32),
}

/// Translation band a recognizer tolerates before activating.
/// `None` on an axis means that axis never activates it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActivationEnvelope {
    pub x: Option<(f64, f64)>,
    pub y: Option<(f64, f64)>,
}

impl ActivationEnvelope {
    pub fn vertical(min: f64, max: f64) -> Self {
        Self {
            x: None,
            y: Some((min, max)),
        }
    }

    pub fn horizontal(mut self, min: f64, max: f64) -> Self {
        self.x = Some((min, max));
        self
    }

    /// Whether a translation has left the envelope
    pub fn is_crossed(&self, translation_x: f64, translation_y: f64) -> bool {
        let outside = |band: Option<(f64, f64)>, value: f64| {
            band.is_some_and(|(min, max)| value < min || value > max)
        };
        outside(self.x, translation_x) || outside(self.y, translation_y)
    }
}

/// How one recognizer takes part in arbitration
#[derive(Clone, Debug, PartialEq)]
pub struct RecognizerSpec {
    pub id: RecognizerId,
    pub envelope: ActivationEnvelope,
    /// Touch targets that begin this recognizer
    pub targets: SmallVec<[TouchTarget; 2]>,
    /// Only begins while this scene is active
    pub scene: Option<i32>,
    pub simultaneous_with: SmallVec<[RecognizerId; 8]>,
    pub enabled: bool,
}

impl RecognizerSpec {
    pub fn new(id: RecognizerId, envelope: ActivationEnvelope) -> Self {
        Self {
            id,
            envelope,
            targets: SmallVec::new(),
            scene: None,
            simultaneous_with: SmallVec::new(),
            enabled: true,
        }
    }

    pub fn target(mut self, target: TouchTarget) -> Self {
        self.targets.push(target);
        self
    }

    pub fn scene(mut self, index: i32) -> Self {
        self.scene = Some(index);
        self
    }

    pub fn simultaneous_with(mut self, others: impl IntoIterator<Item = RecognizerId>) -> Self {
        for other in others {
            if !self.simultaneous_with.contains(&other) {
                self.simultaneous_with.push(other);
            }
        }
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum RecognizerState {
    Possible,
    Active { origin_x: f64, origin_y: f64 },
    Failed,
}

/// A pan event routed to one recognizer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dispatch {
    pub recognizer: RecognizerId,
    pub event: PanEvent,
}

#[derive(Default)]
pub struct GestureArbiter {
    specs: Vec<RecognizerSpec>,
    states: FxHashMap<RecognizerId, RecognizerState>,
    /// Activation order of the current touch sequence
    active: SmallVec<[RecognizerId; 4]>,
}

impl GestureArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the participating recognizers. Takes effect from the next
    /// touch-down; a sequence in flight keeps its states.
    pub fn set_specs(&mut self, specs: Vec<RecognizerSpec>) {
        self.specs = specs;
    }

    pub fn specs(&self) -> &[RecognizerSpec] {
        &self.specs
    }

    pub fn is_active(&self, id: RecognizerId) -> bool {
        self.active.contains(&id)
    }

    fn spec(&self, id: RecognizerId) -> Option<&RecognizerSpec> {
        self.specs.iter().find(|spec| spec.id == id)
    }

    /// Whether two recognizers may be active at the same time
    pub fn can_run_together(&self, a: RecognizerId, b: RecognizerId) -> bool {
        let declares = |from: RecognizerId, to: RecognizerId| {
            self.spec(from)
                .is_some_and(|spec| spec.simultaneous_with.contains(&to))
        };
        declares(a, b) || declares(b, a)
    }

    /// Feed one touch event. `active_scene` selects which scene-bound
    /// recognizers may begin.
    pub fn handle(&mut self, touch: &TouchEvent, active_scene: i32) -> SmallVec<[Dispatch; 4]> {
        let mut out = SmallVec::new();
        match touch.phase {
            TouchPhase::Down => self.begin(touch, active_scene, &mut out),
            TouchPhase::Move => self.advance(touch, &mut out),
            TouchPhase::Up => self.finish(touch, PanPhase::End, &mut out),
            TouchPhase::Cancel => self.finish(touch, PanPhase::Cancel, &mut out),
        }
        out
    }

    fn begin(&mut self, touch: &TouchEvent, active_scene: i32, out: &mut SmallVec<[Dispatch; 4]>) {
        if !self.states.is_empty() {
            tracing::debug!("touch down during a live sequence, resetting");
            self.finish(touch, PanPhase::Cancel, out);
        }
        for spec in &self.specs {
            let participates = spec.enabled
                && spec.targets.contains(&touch.target)
                && spec.scene.map_or(true, |index| index == active_scene);
            if participates {
                self.states.insert(spec.id, RecognizerState::Possible);
                out.push(Dispatch {
                    recognizer: spec.id,
                    event: PanEvent::new(PanPhase::Begin),
                });
            }
        }
    }

    fn advance(&mut self, touch: &TouchEvent, out: &mut SmallVec<[Dispatch; 4]>) {
        let (tx, ty) = (touch.translation_x, touch.translation_y);

        // Activations, in declaration order
        let candidates: SmallVec<[RecognizerId; 8]> = self
            .specs
            .iter()
            .filter(|spec| self.states.get(&spec.id) == Some(&RecognizerState::Possible))
            .filter(|spec| spec.envelope.is_crossed(tx, ty))
            .map(|spec| spec.id)
            .collect();

        for id in candidates {
            let blocked_by = self
                .active
                .iter()
                .copied()
                .find(|other| !self.can_run_together(id, *other));
            if let Some(other) = blocked_by {
                tracing::trace!(?id, ?other, "recognizer blocked");
                self.states.insert(id, RecognizerState::Failed);
                out.push(Dispatch {
                    recognizer: id,
                    event: PanEvent::new(PanPhase::Cancel),
                });
                continue;
            }

            tracing::trace!(?id, tx, ty, "recognizer activated");
            self.states.insert(
                id,
                RecognizerState::Active {
                    origin_x: tx,
                    origin_y: ty,
                },
            );
            self.active.push(id);
            out.push(Dispatch {
                recognizer: id,
                event: PanEvent::new(PanPhase::Start),
            });
        }

        for &id in &self.active {
            if let Some(RecognizerState::Active { origin_x, origin_y }) = self.states.get(&id) {
                out.push(Dispatch {
                    recognizer: id,
                    event: PanEvent {
                        phase: PanPhase::Update,
                        translation_x: tx - origin_x,
                        translation_y: ty - origin_y,
                        velocity_x: touch.velocity_x,
                        velocity_y: touch.velocity_y,
                    },
                });
            }
        }
    }

    fn finish(&mut self, touch: &TouchEvent, phase: PanPhase, out: &mut SmallVec<[Dispatch; 4]>) {
        for spec in &self.specs {
            let Some(state) = self.states.get(&spec.id) else {
                continue;
            };
            let event = match state {
                RecognizerState::Active { origin_x, origin_y } => PanEvent {
                    phase,
                    translation_x: touch.translation_x - origin_x,
                    translation_y: touch.translation_y - origin_y,
                    velocity_x: touch.velocity_x,
                    velocity_y: touch.velocity_y,
                },
                // Never activated: no end, only cancellation
                RecognizerState::Possible => PanEvent::new(PanPhase::Cancel),
                RecognizerState::Failed => continue,
            };
            out.push(Dispatch {
                recognizer: spec.id,
                event,
            });
        }
        self.states.clear();
        self.active.clear();
    }
}
