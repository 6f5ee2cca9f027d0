//! Animation driver and the mutable engine state handed to handlers
//!
//! Each animated value has at most one running animation. Starting a new one
//! replaces the old, and whoever writes a value directly cancels its
//! animation first.

use crate::notify::NotificationSender;
use crate::registry::SceneRegistry;
use crate::store::SharedOffsetStore;
use headtab_animation::{Animation, AnimationId, AnimationScheduler};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// A value driven by an animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatedValue {
    HeaderCollapse,
    RefreshDrag,
    ContainerOpacity,
    SceneOpacity(i32),
}

/// What to do once an animation has reached its end
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Completion {
    #[default]
    None,
    /// Header fling finished or was interrupted
    HeaderSlideEnded,
    /// Indicator reached its refreshing position
    RefreshEntered,
    /// Overshoot past the rest position finished
    RefreshOvershot,
    /// Indicator is back at rest
    RefreshSettled,
    /// Fling of a drag held during refresh finished
    HoldReleased,
}

/// One frame's output for one animated value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationFrame {
    pub target: AnimatedValue,
    pub value: f64,
    /// Set on the frame the animation finished
    pub completion: Option<Completion>,
}

#[derive(Default)]
pub struct Animations {
    scheduler: AnimationScheduler,
    running: FxHashMap<AnimatedValue, (AnimationId, Completion)>,
}

impl Animations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start animating `target`, replacing any animation already driving it.
    /// The replaced animation's completion is returned and not run.
    pub fn start(
        &mut self,
        target: AnimatedValue,
        animation: impl Into<Animation>,
        completion: Completion,
    ) -> Option<Completion> {
        let replaced = self.cancel(target);
        let id = self.scheduler.start(animation);
        self.running.insert(target, (id, completion));
        replaced
    }

    /// Stop the animation driving `target`, returning its completion
    pub fn cancel(&mut self, target: AnimatedValue) -> Option<Completion> {
        let (id, completion) = self.running.remove(&target)?;
        self.scheduler.cancel(id);
        tracing::trace!(?target, ?completion, "animation cancelled");
        Some(completion)
    }

    pub fn is_running(&self, target: AnimatedValue) -> bool {
        self.running.contains_key(&target)
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Advance every animation by `dt` seconds
    pub fn tick(&mut self, dt: f64) -> SmallVec<[AnimationFrame; 4]> {
        let samples = self.scheduler.tick(dt);
        let mut frames = SmallVec::new();
        for sample in samples {
            let Some((&target, &(_, completion))) =
                self.running.iter().find(|(_, (id, _))| *id == sample.id)
            else {
                continue;
            };
            if sample.finished {
                self.running.remove(&target);
            }
            frames.push(AnimationFrame {
                target,
                value: sample.value,
                completion: sample.finished.then_some(completion),
            });
        }
        frames
    }
}

/// Borrowed engine state for gesture handlers and the refresh machine
pub struct EngineCx<'a> {
    pub store: &'a mut SharedOffsetStore,
    pub registry: &'a mut SceneRegistry,
    pub animations: &'a mut Animations,
    pub notifier: &'a NotificationSender,
}

impl EngineCx<'_> {
    pub fn active_index(&self) -> i32 {
        self.store.active_scene_index()
    }

    /// Offset of the active scene, if it is mounted and ready
    pub fn active_ready_offset(&self) -> Option<f64> {
        let index = self.active_index();
        self.registry
            .state(&*self.store, index)
            .filter(|state| state.is_ready)
            .map(|state| state.scroll_offset)
    }

    pub fn scroll_scene(&mut self, index: i32, offset: f64) -> bool {
        self.registry.scroll_to(self.store, index, offset)
    }

    /// Bring every ready scene except the active one to the shared offset,
    /// clamped to the collapse height
    pub fn sync_inactive_scenes(&mut self) {
        let active = self.active_index();
        let target = self
            .store
            .shared_offset()
            .clamp(0.0, self.store.collapse_height());
        for index in self.registry.indices() {
            if index != active {
                self.scroll_scene(index, target);
            }
        }
    }
}
