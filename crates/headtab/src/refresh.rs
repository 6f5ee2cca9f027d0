//! Pull-to-refresh state machine
//!
//! ```text
//!          pull down            release past threshold
//!   Idle ────────────► Pulling ───────────────────────► Refreshing
//!    ▲ ▲                  │  release short                  │ flag cleared
//!    │ └──────────────────┘                                 ▼
//!    └──────────────────── settle animation done ──────── Settling
//! ```
//!
//! The external refreshing flag may also move `Idle` straight to
//! `Refreshing`; that path does not notify the application, since the
//! application started it.

use crate::engine::{AnimatedValue, Completion, EngineCx};
use crate::notify::AppNotification;
use headtab_animation::{TimingAnimation, TimingConfig};
use headtab_core::fsm::{StateMachine, StateTransitions};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RefreshPhase {
    #[default]
    Idle,
    Pulling,
    Refreshing,
    Settling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshEvent {
    /// A pull gesture took hold of the indicator
    PullStarted,
    /// The pull was released past the threshold
    PullReleased,
    /// The pull was released short of the threshold, or cancelled
    PullAborted,
    /// The application set its refreshing flag
    ExternalStart,
    /// The application cleared its refreshing flag
    ExternalComplete,
    /// The indicator reached its resting position
    SettleFinished,
}

impl StateTransitions for RefreshPhase {
    type Event = RefreshEvent;

    fn on_event(&self, event: RefreshEvent) -> Option<Self> {
        use RefreshEvent::*;
        use RefreshPhase::*;

        match (self, event) {
            (Idle, PullStarted) => Some(Pulling),
            (Idle, ExternalStart) | (Pulling, ExternalStart) => Some(Refreshing),
            (Pulling, PullReleased) => Some(Refreshing),
            (Pulling, PullAborted) => Some(Idle),
            (Refreshing, ExternalComplete) => Some(Settling),
            (Settling, SettleFinished) => Some(Idle),
            _ => None,
        }
    }
}

/// Drives [`RefreshPhase`] and the indicator animations tied to it
pub struct RefreshStateMachine {
    machine: StateMachine<RefreshPhase>,
    refresh_height: f64,
    timing: TimingConfig,
    /// Flag set while settling; honored once the indicator is at rest
    pending_start: bool,
}

impl RefreshStateMachine {
    pub fn new(refresh_height: f64) -> Self {
        Self {
            machine: StateMachine::new(RefreshPhase::Idle),
            refresh_height,
            timing: TimingConfig::default(),
            pending_start: false,
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        self.machine.current()
    }

    /// Phase changes, oldest first
    pub fn history(&self) -> &[(RefreshPhase, RefreshEvent, RefreshPhase)] {
        self.machine.history()
    }

    fn send(&mut self, event: RefreshEvent) -> Option<RefreshPhase> {
        let from = self.machine.current();
        let to = self.machine.send(event);
        match to {
            Some(to) => tracing::debug!(?from, ?event, ?to, "refresh phase changed"),
            None => tracing::trace!(phase = ?from, ?event, "refresh event ignored"),
        }
        to
    }

    /// A pull gesture started moving the indicator
    pub fn begin_pull(&mut self, cx: &mut EngineCx<'_>) -> bool {
        if self.send(RefreshEvent::PullStarted).is_none() {
            return false;
        }
        cx.animations.cancel(AnimatedValue::RefreshDrag);
        true
    }

    /// The pull gesture ended. Past the threshold this starts a refresh and
    /// notifies the application exactly once; short of it the indicator
    /// springs back.
    pub fn release_pull(&mut self, cx: &mut EngineCx<'_>, past_threshold: bool) {
        if !past_threshold {
            if self.send(RefreshEvent::PullAborted).is_some() {
                self.animate_drag(cx, self.refresh_height, Completion::None);
            }
            return;
        }
        if self.send(RefreshEvent::PullReleased).is_some() {
            cx.notifier.send(AppNotification::StartRefresh);
            self.enter_refreshing(cx);
        }
    }

    /// Follow the application's refreshing flag
    pub fn set_external(&mut self, cx: &mut EngineCx<'_>, refreshing: bool) {
        match (self.phase(), refreshing) {
            (RefreshPhase::Settling, true) => {
                tracing::debug!("refresh requested while settling, deferred");
                self.pending_start = true;
            }
            (RefreshPhase::Settling, false) => self.pending_start = false,
            (_, true) => {
                if self.send(RefreshEvent::ExternalStart).is_some() {
                    self.enter_refreshing(cx);
                }
            }
            (_, false) => {
                if self.send(RefreshEvent::ExternalComplete).is_some() {
                    self.enter_settling(cx);
                }
            }
        }
    }

    /// Run the completion of a refresh animation
    pub fn complete(&mut self, cx: &mut EngineCx<'_>, completion: Completion) {
        match completion {
            Completion::RefreshEntered => {
                cx.store.set_refreshing_with_animation(true);
            }
            Completion::RefreshOvershot => {
                cx.store.set_refresh_drag_offset(self.refresh_height);
                self.finish_settling(cx);
            }
            Completion::RefreshSettled => self.finish_settling(cx),
            _ => {}
        }
    }

    fn enter_refreshing(&mut self, cx: &mut EngineCx<'_>) {
        cx.store.set_refreshing(true);
        cx.store.set_start_refreshing(true);
        cx.store.set_dragging(false);
        self.animate_drag(cx, 0.0, Completion::RefreshEntered);
    }

    fn enter_settling(&mut self, cx: &mut EngineCx<'_>) {
        cx.store.set_refreshing(false);
        cx.store.set_start_refreshing(false);
        cx.store.set_refreshing_with_animation(true);

        let current = cx.store.refresh_drag_offset();
        if current >= self.refresh_height {
            // Indicator already hidden; carry the content up past it first
            self.animate_drag(cx, current + self.refresh_height, Completion::RefreshOvershot);
        } else {
            self.animate_drag(cx, self.refresh_height, Completion::RefreshSettled);
        }
    }

    fn finish_settling(&mut self, cx: &mut EngineCx<'_>) {
        if self.send(RefreshEvent::SettleFinished).is_none() {
            return;
        }
        cx.store.set_refreshing_with_animation(false);
        cx.store.set_pull_enough(false);
        if std::mem::take(&mut self.pending_start) {
            self.set_external(cx, true);
        }
    }

    fn animate_drag(&self, cx: &mut EngineCx<'_>, to: f64, completion: Completion) {
        let from = cx.store.refresh_drag_offset();
        cx.animations.start(
            AnimatedValue::RefreshDrag,
            TimingAnimation::new(from, to, self.timing),
            completion,
        );
    }
}
