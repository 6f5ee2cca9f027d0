//! Reactions to shared state
//!
//! Each reaction is a pure function of the store: it reads signals and
//! returns at most one [`EngineCommand`]. Installed reactions run as effects
//! of the store's graph, so they re-evaluate whenever a signal they read
//! changes. They only queue their commands; the container applies the queue
//! and keeps draining it until no reaction has anything left to say.

use crate::store::{OffsetSignals, SceneState, StoreMetrics};
use headtab_animation::{interpolate, Extrapolate};
use headtab_core::reactive::{Effect, ReactiveGraph};
use parking_lot::Mutex;
use std::sync::Arc;

/// A state change requested by a reaction
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineCommand {
    /// Scroll a scene without animation
    ScrollScene { index: i32, offset: f64 },
    SetHeaderCollapse(f64),
    PublishHeaderPosition(f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    /// Publish the header translation to listeners
    HeaderPosition,
    /// Carry the content along while the indicator animates past rest
    RefreshAutoscroll,
    /// Scroll the active scene to follow a header drag
    HeaderSlide,
    /// Keep the active scene at the top while the indicator is visible
    PostDragResync,
    /// Keep the header collapse offset on the shared offset when not sliding
    HeaderFollow,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 5] = [
        ReactionKind::HeaderPosition,
        ReactionKind::RefreshAutoscroll,
        ReactionKind::HeaderSlide,
        ReactionKind::PostDragResync,
        ReactionKind::HeaderFollow,
    ];
}

fn active_scene(g: &ReactiveGraph, s: &OffsetSignals) -> Option<(i32, SceneState)> {
    let index = g.get(s.active_scene_index)?;
    let state = g.with(s.scenes, |table| table.get(index))??;
    Some((index, g.get(state)?))
}

/// Scroll the active scene to `offset` unless it is unready or already there
fn scroll_active(g: &ReactiveGraph, s: &OffsetSignals, offset: f64) -> Option<EngineCommand> {
    let (index, state) = active_scene(g, s)?;
    let offset = offset.max(0.0);
    if !state.is_ready || state.scroll_offset == offset {
        return None;
    }
    Some(EngineCommand::ScrollScene { index, offset })
}

/// Evaluate one reaction against the current state
pub fn evaluate(
    kind: ReactionKind,
    g: &ReactiveGraph,
    s: &OffsetSignals,
    m: &StoreMetrics,
) -> Option<EngineCommand> {
    let f = |signal| g.get(signal).unwrap_or(0.0);
    let flag = |signal| g.get(signal).unwrap_or(false);
    let index = |signal| g.get(signal).unwrap_or(-1);

    match kind {
        ReactionKind::HeaderPosition => {
            let collapse = m.collapse_height(f(s.header_height));
            let position = interpolate(
                f(s.shared_offset),
                &[0.0, collapse],
                &[0.0, -collapse],
                Extrapolate::Clamp,
            );
            Some(EngineCommand::PublishHeaderPosition(position))
        }
        ReactionKind::RefreshAutoscroll => {
            let drag = f(s.refresh_drag_offset);
            if drag > m.refresh_height && flag(s.is_refreshing_with_animation) {
                scroll_active(g, s, drag - m.refresh_height)
            } else {
                None
            }
        }
        ReactionKind::HeaderSlide => {
            let sliding = flag(s.is_sliding_header);
            if sliding && index(s.slide_scene_index) == index(s.active_scene_index) {
                scroll_active(g, s, f(s.header_collapse_offset))
            } else {
                None
            }
        }
        ReactionKind::PostDragResync => {
            let drag = f(s.refresh_drag_offset);
            let engaged = flag(s.is_dragging) || flag(s.is_refreshing_with_animation);
            let from_active = index(s.drag_origin_scene_index) == index(s.active_scene_index);
            if drag < m.refresh_height && f(s.shared_offset) != 0.0 && from_active && engaged {
                scroll_active(g, s, 0.0)
            } else {
                None
            }
        }
        ReactionKind::HeaderFollow => {
            if flag(s.is_sliding_header) {
                return None;
            }
            let bound = m.header_bound(f(s.header_height));
            let target = f(s.shared_offset).clamp(0.0, bound);
            (f(s.header_collapse_offset) != target).then_some(EngineCommand::SetHeaderCollapse(target))
        }
    }
}

pub type CommandQueue = Arc<Mutex<Vec<EngineCommand>>>;

/// Installs every reaction as an effect and collects their commands
pub struct ReactionScheduler {
    queue: CommandQueue,
    effects: Vec<(ReactionKind, Effect)>,
}

impl ReactionScheduler {
    pub fn install(graph: &mut ReactiveGraph, signals: OffsetSignals, metrics: StoreMetrics) -> Self {
        let queue: CommandQueue = Arc::new(Mutex::new(Vec::new()));
        let effects = ReactionKind::ALL
            .iter()
            .map(|&kind| {
                let queue = queue.clone();
                let effect = graph.create_effect(move |g| {
                    if let Some(command) = evaluate(kind, g, &signals, &metrics) {
                        tracing::trace!(?kind, ?command, "reaction fired");
                        queue.lock().push(command);
                    }
                });
                (kind, effect)
            })
            .collect();
        Self { queue, effects }
    }

    /// Take the commands queued since the last drain
    pub fn drain(&self) -> Vec<EngineCommand> {
        std::mem::take(&mut *self.queue.lock())
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    pub fn uninstall(self, graph: &mut ReactiveGraph) {
        for (_, effect) in self.effects {
            graph.dispose_effect(effect);
        }
    }
}
