//! Header and outer gesture handlers
//!
//! The header recognizer drags the header itself, driving
//! `header_collapse_offset` and letting a reaction scroll the active scene
//! along. The outer recognizer wraps the whole tab view: it resyncs inactive
//! scenes when a touch begins and turns downward drags at the top of the
//! active scene into pull-to-refresh.

use super::arbiter::{ActivationEnvelope, RecognizerId, RecognizerSpec};
use crate::config::ContainerConfig;
use crate::engine::{AnimatedValue, Completion, EngineCx};
use crate::notify::AppNotification;
use crate::refresh::{RefreshPhase, RefreshStateMachine};
use headtab_animation::{DecayAnimation, DecayConfig};
use headtab_core::events::{PanEvent, PanPhase, TouchTarget};
use smallvec::SmallVec;

/// Vertical travel before the header or outer recognizer activates
pub const ACTIVE_OFFSET_Y: f64 = 10.0;

/// Nudge applied to the active scene to stop its momentum scroll
pub const STOP_SCROLL_EPSILON: f64 = 0.1;

/// Deceleration of the fling that follows a drag held during refresh
pub const HOLD_DECELERATION: f64 = 0.998;

pub struct GestureComposer {
    scroll_enabled: bool,
    window_width: f64,
    refresh_height: f64,
    external: SmallVec<[u32; 4]>,
    native: SmallVec<[i32; 8]>,
    /// Scene offset plus translation when the header drag started
    header_start_y: f64,
    /// Translation at which a pull started
    pull_baseline: f64,
    /// Indicator offset plus scene offset when a refresh-time drag started
    hold_start_y: f64,
}

impl GestureComposer {
    pub fn new(config: &ContainerConfig) -> Self {
        Self {
            scroll_enabled: config.scroll_enabled,
            window_width: config.window_width,
            refresh_height: config.refresh_height,
            external: config
                .header_simultaneous_with_external_gesture
                .iter()
                .copied()
                .collect(),
            native: SmallVec::new(),
            header_start_y: 0.0,
            pull_baseline: 0.0,
            hold_start_y: 0.0,
        }
    }

    /// Declare a scene's native scroll recognizer. Returns `false` if it was
    /// already known, so callers can skip rebuilding the arbitration.
    pub fn register_native_gesture(&mut self, index: i32) -> bool {
        if self.native.contains(&index) {
            return false;
        }
        self.native.push(index);
        tracing::debug!(index, "native scroll gesture registered");
        true
    }

    pub fn unregister_native_gesture(&mut self, index: i32) -> bool {
        let before = self.native.len();
        self.native.retain(|i| *i != index);
        before != self.native.len()
    }

    pub fn native_gestures(&self) -> &[i32] {
        &self.native
    }

    /// Recognizers for the current set of scenes
    pub fn recognizer_specs(&self) -> Vec<RecognizerSpec> {
        let natives = || self.native.iter().map(|&i| RecognizerId::SceneScroll(i));

        let header = RecognizerSpec::new(
            RecognizerId::Header,
            ActivationEnvelope::vertical(-ACTIVE_OFFSET_Y, ACTIVE_OFFSET_Y),
        )
        .target(TouchTarget::Header)
        .simultaneous_with(self.external.iter().map(|&id| RecognizerId::External(id)))
        .simultaneous_with(natives())
        .enabled(self.scroll_enabled);

        let outer = RecognizerSpec::new(
            RecognizerId::Outer,
            ActivationEnvelope::vertical(-ACTIVE_OFFSET_Y, ACTIVE_OFFSET_Y)
                .horizontal(-self.window_width, self.window_width),
        )
        .target(TouchTarget::Header)
        .target(TouchTarget::Content)
        .simultaneous_with([RecognizerId::Header])
        .simultaneous_with(natives())
        .enabled(self.scroll_enabled);

        let mut specs = vec![header, outer];
        specs.extend(self.native.iter().map(|&index| {
            RecognizerSpec::new(
                RecognizerId::SceneScroll(index),
                ActivationEnvelope::vertical(0.0, 0.0),
            )
            .target(TouchTarget::Content)
            .scene(index)
        }));
        specs
    }

    // =========================================================================
    // Header
    // =========================================================================

    /// Handle a header event. Returns a completion the caller must run when
    /// the slide ends without a fling.
    pub fn on_header(&mut self, event: &PanEvent, cx: &mut EngineCx<'_>) -> Option<Completion> {
        match event.phase {
            PanPhase::Begin => {
                if !cx.store.is_refreshing() {
                    stop_scroll(cx);
                }
                None
            }
            PanPhase::Start => None,
            PanPhase::Update => {
                self.header_update(event, cx);
                None
            }
            PanPhase::End | PanPhase::Cancel => self.header_release(event, cx),
        }
    }

    fn header_update(&mut self, event: &PanEvent, cx: &mut EngineCx<'_>) {
        let Some(scene_offset) = cx.active_ready_offset() else {
            return;
        };
        if !cx.store.is_sliding_header() {
            cx.animations.cancel(AnimatedValue::HeaderCollapse);
            self.header_start_y = scene_offset + event.translation_y;
            cx.store.set_slide_scene_index(cx.active_index());
            cx.store.set_sliding_header(true);
            tracing::debug!(start = self.header_start_y, "header slide started");
        }
        let offset = (self.header_start_y - event.translation_y).clamp(0.0, cx.store.header_bound());
        cx.store.set_header_collapse_offset(offset);
    }

    fn header_release(&mut self, event: &PanEvent, cx: &mut EngineCx<'_>) -> Option<Completion> {
        if !cx.store.is_sliding_header() {
            return None;
        }
        self.header_start_y = 0.0;
        if cx.active_ready_offset().is_none() {
            // The scene went away mid-drag; nothing to fling
            cx.animations.cancel(AnimatedValue::HeaderCollapse);
            return Some(Completion::HeaderSlideEnded);
        }
        let velocity = if event.phase == PanPhase::Cancel {
            0.0
        } else {
            -event.velocity_y
        };
        let fling = DecayAnimation::new(
            cx.store.header_collapse_offset(),
            DecayConfig::with_velocity(velocity).clamp(0.0, cx.store.header_bound()),
        );
        tracing::debug!(velocity, "header released");
        cx.animations
            .start(AnimatedValue::HeaderCollapse, fling, Completion::HeaderSlideEnded);
        None
    }

    // =========================================================================
    // Outer
    // =========================================================================

    /// Handle an outer event. Returns a completion the caller must run when
    /// the touch interrupted an animation whose completion still matters.
    pub fn on_outer(
        &mut self,
        event: &PanEvent,
        cx: &mut EngineCx<'_>,
        refresh: &mut RefreshStateMachine,
        refresh_enabled: bool,
    ) -> Option<Completion> {
        match event.phase {
            PanPhase::Begin => return self.outer_begin(cx),
            PanPhase::Start => {
                cx.store.set_pull_enough(false);
            }
            PanPhase::Update => {
                if refresh_enabled {
                    self.outer_update(event, cx, refresh);
                }
            }
            PanPhase::End | PanPhase::Cancel => {
                if refresh_enabled {
                    self.outer_release(event, cx, refresh);
                }
            }
        }
        None
    }

    fn outer_begin(&mut self, cx: &mut EngineCx<'_>) -> Option<Completion> {
        cx.active_ready_offset()?;
        let interrupted = cx.animations.cancel(AnimatedValue::HeaderCollapse);
        cx.store.set_slide_scene_index(-1);
        cx.store.set_drag_origin_scene_index(-1);
        cx.sync_inactive_scenes();
        interrupted.filter(|c| *c == Completion::HeaderSlideEnded)
    }

    fn outer_update(&mut self, event: &PanEvent, cx: &mut EngineCx<'_>, refresh: &mut RefreshStateMachine) {
        let Some(scene_offset) = cx.active_ready_offset() else {
            return;
        };
        if cx.store.is_refresh_animating() {
            return;
        }
        let ty = event.translation_y;

        if cx.store.is_refreshing() {
            // Holding the indicator while a refresh runs
            if !cx.store.is_dragging() {
                cx.animations.cancel(AnimatedValue::RefreshDrag);
                self.hold_start_y = self.refresh_height - cx.store.refresh_pull() + scene_offset;
                cx.store.set_drag_origin_scene_index(cx.active_index());
                cx.store.set_dragging(true);
            }
            cx.store
                .set_refresh_drag_offset((self.hold_start_y - ty).max(0.0));
            return;
        }

        if scene_offset != 0.0 || ty <= 0.0 {
            return;
        }
        if !cx.store.is_dragging() {
            if !refresh.begin_pull(cx) {
                return;
            }
            self.pull_baseline = ty;
            cx.store.set_drag_origin_scene_index(cx.active_index());
            cx.store.set_dragging(true);
            return;
        }

        let drag = self.refresh_height - (ty - self.pull_baseline);
        cx.store.set_refresh_drag_offset(drag);
        if drag < 0.0 && !cx.store.is_pull_enough() {
            cx.store.set_pull_enough(true);
            cx.notifier.send(AppNotification::PullEnough);
        }
    }

    fn outer_release(&mut self, event: &PanEvent, cx: &mut EngineCx<'_>, refresh: &mut RefreshStateMachine) {
        if !cx.store.is_dragging() {
            return;
        }
        let released = event.phase == PanPhase::End && cx.active_ready_offset().is_some();
        let velocity = if released { -event.velocity_y } else { 0.0 };
        self.finish_drag(cx, refresh, velocity, released);
    }

    /// End a pull or hold drag without a release, as when its scene unmounts
    /// or the tab changes underneath the finger. A pull springs back to rest.
    pub fn abort_drag(&mut self, cx: &mut EngineCx<'_>, refresh: &mut RefreshStateMachine) {
        if cx.store.is_dragging() {
            tracing::debug!("drag aborted");
            self.finish_drag(cx, refresh, 0.0, false);
        }
    }

    fn finish_drag(
        &mut self,
        cx: &mut EngineCx<'_>,
        refresh: &mut RefreshStateMachine,
        velocity: f64,
        released: bool,
    ) {
        cx.store.set_dragging(false);
        self.pull_baseline = 0.0;
        if cx.store.is_refresh_animating() {
            return;
        }

        if cx.store.is_refreshing() {
            self.hold_start_y = 0.0;
            let fling = DecayAnimation::new(
                cx.store.refresh_drag_offset(),
                DecayConfig::with_velocity(velocity)
                    .deceleration(HOLD_DECELERATION)
                    .clamp(0.0, f64::MAX),
            );
            cx.animations
                .start(AnimatedValue::RefreshDrag, fling, Completion::HoldReleased);
            return;
        }

        if refresh.phase() == RefreshPhase::Pulling {
            let past_threshold = released && cx.store.refresh_drag_offset() < 0.0;
            refresh.release_pull(cx, past_threshold);
        }
    }
}

/// Halt any momentum scroll of the active scene
fn stop_scroll(cx: &mut EngineCx<'_>) {
    if let Some(offset) = cx.active_ready_offset() {
        let index = cx.active_index();
        cx.scroll_scene(index, offset + STOP_SCROLL_EPSILON);
    }
}
