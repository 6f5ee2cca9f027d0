//! Shared offset store
//!
//! Every value the gesture handlers, reactions, and scenes coordinate on lives
//! here as a signal of one [`ReactiveGraph`]. The container owns the store and
//! is its only writer; reactions observe it through the graph.

use crate::config::ContainerConfig;
use headtab_animation::{interpolate, Extrapolate};
use headtab_core::reactive::{Derived, ReactiveGraph, Signal};
use rustc_hash::FxHashMap;

/// Scroll state of one mounted scene
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SceneState {
    /// Last offset reported by or commanded on the scene, never negative
    pub scroll_offset: f64,
    /// Set once the scene has reported its content size
    pub is_ready: bool,
}

/// Scene index to scene state signal, for everything that must follow the
/// active scene without knowing the registry
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneTable(FxHashMap<i32, Signal<SceneState>>);

impl SceneTable {
    pub fn get(&self, index: i32) -> Option<Signal<SceneState>> {
        self.0.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, index: i32, state: Signal<SceneState>) {
        self.0.insert(index, state);
    }

    pub(crate) fn remove(&mut self, index: i32) -> Option<Signal<SceneState>> {
        self.0.remove(&index)
    }
}

/// Handles to every signal of the store
///
/// `Copy`, so reactions can capture the whole set.
#[derive(Clone, Copy, Debug)]
pub struct OffsetSignals {
    /// Offset of the active scene; the source of truth for header position
    pub shared_offset: Signal<f64>,
    /// Header collapse while the header itself is dragged
    pub header_collapse_offset: Signal<f64>,
    /// Refresh indicator drag; `refresh_height` at rest, below it while pulled
    pub refresh_drag_offset: Signal<f64>,
    pub is_dragging: Signal<bool>,
    pub is_refreshing: Signal<bool>,
    pub is_refreshing_with_animation: Signal<bool>,
    pub is_sliding_header: Signal<bool>,
    pub is_pull_enough: Signal<bool>,
    pub is_start_refreshing: Signal<bool>,
    pub active_scene_index: Signal<i32>,
    /// Scene a drag started on, -1 when none
    pub drag_origin_scene_index: Signal<i32>,
    /// Scene a header slide started on, -1 when none
    pub slide_scene_index: Signal<i32>,
    /// Measured header height, excluding the overflow part
    pub header_height: Signal<f64>,
    pub tabbar_height: Signal<f64>,
    pub tabview_height: Signal<f64>,
    /// Last published header position, for external listeners
    pub header_position: Signal<f64>,
    pub container_opacity: Signal<f64>,
    pub scenes: Signal<SceneTable>,
}

/// Values derived from the store's signals
#[derive(Clone, Copy, Debug)]
pub struct OffsetDerived {
    /// Pull distance shown by the refresh indicator
    pub refresh_pull: Derived<f64>,
    /// Header translation, `0` expanded to `-collapse_height` collapsed
    pub header_translate: Derived<f64>,
    /// Content translation while pulling, damped past the overflow
    pub refresh_translate: Derived<f64>,
    pub collapse_height: Derived<f64>,
    /// Minimum content height that lets the header fully collapse
    pub expect_height: Derived<f64>,
}

/// Lengths fixed by configuration that the derived values need
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StoreMetrics {
    pub refresh_height: f64,
    pub min_header_height: f64,
    pub overflow_height: f64,
    pub overflow_pull: f64,
    pub pull_extended_coefficient: f64,
    pub pan_header_max_offset: Option<f64>,
}

impl From<&ContainerConfig> for StoreMetrics {
    fn from(config: &ContainerConfig) -> Self {
        Self {
            refresh_height: config.refresh_height,
            min_header_height: config.min_header_height,
            overflow_height: config.overflow_height,
            overflow_pull: config.overflow_pull,
            pull_extended_coefficient: config.pull_extended_coefficient,
            pan_header_max_offset: config.pan_header_max_offset,
        }
    }
}

impl StoreMetrics {
    /// Distance the header can collapse for a given measured header height
    pub fn collapse_height(&self, header_height: f64) -> f64 {
        (header_height - self.min_header_height).max(0.0)
    }

    /// Upper bound of the header collapse offset while dragging the header
    pub fn header_bound(&self, header_height: f64) -> f64 {
        self.pan_header_max_offset
            .unwrap_or(self.collapse_height(header_height) + self.overflow_height)
    }

    /// Content translation for a pull distance
    pub fn refresh_translate(&self, pull: f64) -> f64 {
        let linear_end = self.refresh_height + self.overflow_pull;
        interpolate(
            pull,
            &[0.0, linear_end, linear_end + 1.0],
            &[0.0, linear_end, linear_end + self.pull_extended_coefficient],
            Extrapolate::Extend,
        )
    }
}

macro_rules! store_accessors {
    ($($name:ident / $setter:ident : $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&self) -> $ty {
                self.graph.peek(self.signals.$name).unwrap_or_default()
            }

            pub fn $setter(&mut self, value: $ty) -> bool {
                self.graph.set(self.signals.$name, value)
            }
        )*
    };
}

/// The reactive store shared by every part of the container
pub struct SharedOffsetStore {
    graph: ReactiveGraph,
    signals: OffsetSignals,
    derived: OffsetDerived,
    metrics: StoreMetrics,
}

impl SharedOffsetStore {
    pub fn new(config: &ContainerConfig) -> Self {
        let metrics = StoreMetrics::from(config);
        let mut graph = ReactiveGraph::new();

        let header_height = (config.init_header_height - config.overflow_height).max(0.0);
        let signals = OffsetSignals {
            shared_offset: graph.create_signal(0.0),
            header_collapse_offset: graph.create_signal(0.0),
            refresh_drag_offset: graph.create_signal(config.refresh_height),
            is_dragging: graph.create_signal(false),
            is_refreshing: graph.create_signal(false),
            is_refreshing_with_animation: graph.create_signal(false),
            is_sliding_header: graph.create_signal(false),
            is_pull_enough: graph.create_signal(false),
            is_start_refreshing: graph.create_signal(false),
            active_scene_index: graph.create_signal(config.initial_page),
            drag_origin_scene_index: graph.create_signal(-1),
            slide_scene_index: graph.create_signal(-1),
            header_height: graph.create_signal(header_height),
            tabbar_height: graph.create_signal(config.init_tabbar_height),
            tabview_height: graph.create_signal(0.0),
            header_position: graph.create_signal(0.0),
            container_opacity: graph.create_signal(if header_height == 0.0 { 0.0 } else { 1.0 }),
            scenes: graph.create_signal(SceneTable::default()),
        };

        let s = signals;
        let refresh_pull = graph.create_derived(move |g| {
            (metrics.refresh_height - g.get(s.refresh_drag_offset).unwrap_or(0.0)).max(0.0)
        });
        let collapse_height = graph.create_derived(move |g| {
            metrics.collapse_height(g.get(s.header_height).unwrap_or(0.0))
        });
        let header_translate = graph.create_derived(move |g| {
            let collapse = g.get_derived(collapse_height).unwrap_or(0.0);
            let shared = g.get(s.shared_offset).unwrap_or(0.0);
            interpolate(shared, &[0.0, collapse], &[0.0, -collapse], Extrapolate::Clamp)
        });
        let refresh_translate = graph.create_derived(move |g| {
            metrics.refresh_translate(g.get_derived(refresh_pull).unwrap_or(0.0))
        });
        let expect_height = graph.create_derived(move |g| {
            let header = g.get(s.header_height).unwrap_or(0.0);
            let tabview = g.get(s.tabview_height).unwrap_or(0.0);
            (header + tabview - metrics.min_header_height).floor()
        });

        Self {
            graph,
            signals,
            derived: OffsetDerived {
                refresh_pull,
                header_translate,
                refresh_translate,
                collapse_height,
                expect_height,
            },
            metrics,
        }
    }

    pub fn graph(&self) -> &ReactiveGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut ReactiveGraph {
        &mut self.graph
    }

    pub fn signals(&self) -> &OffsetSignals {
        &self.signals
    }

    pub fn derived(&self) -> &OffsetDerived {
        &self.derived
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    store_accessors! {
        shared_offset / set_shared_offset: f64,
        header_collapse_offset / set_header_collapse_offset: f64,
        refresh_drag_offset / set_refresh_drag_offset: f64,
        is_dragging / set_dragging: bool,
        is_refreshing / set_refreshing: bool,
        is_refreshing_with_animation / set_refreshing_with_animation: bool,
        is_sliding_header / set_sliding_header: bool,
        is_pull_enough / set_pull_enough: bool,
        is_start_refreshing / set_start_refreshing: bool,
        active_scene_index / set_active_scene_index: i32,
        drag_origin_scene_index / set_drag_origin_scene_index: i32,
        slide_scene_index / set_slide_scene_index: i32,
        header_height / set_header_height: f64,
        tabbar_height / set_tabbar_height: f64,
        tabview_height / set_tabview_height: f64,
        header_position / set_header_position: f64,
        container_opacity / set_container_opacity: f64,
    }

    pub fn refresh_pull(&self) -> f64 {
        self.graph.get_derived(self.derived.refresh_pull).unwrap_or(0.0)
    }

    pub fn header_translate(&self) -> f64 {
        self.graph.get_derived(self.derived.header_translate).unwrap_or(0.0)
    }

    pub fn refresh_translate(&self) -> f64 {
        self.graph.get_derived(self.derived.refresh_translate).unwrap_or(0.0)
    }

    pub fn collapse_height(&self) -> f64 {
        self.graph.get_derived(self.derived.collapse_height).unwrap_or(0.0)
    }

    pub fn expect_height(&self) -> f64 {
        self.graph.get_derived(self.derived.expect_height).unwrap_or(0.0)
    }

    pub fn header_bound(&self) -> f64 {
        self.metrics.header_bound(self.header_height())
    }

    /// A refresh animation is between its two resting states
    pub fn is_refresh_animating(&self) -> bool {
        self.is_refreshing() != self.is_refreshing_with_animation()
    }

    // =========================================================================
    // Scene states
    // =========================================================================

    pub fn scene_state(&self, index: i32) -> Option<SceneState> {
        let signal = self.graph.with(self.signals.scenes, |table| table.get(index))??;
        self.graph.peek(signal)
    }

    pub(crate) fn insert_scene(&mut self, index: i32) -> Signal<SceneState> {
        if let Some(existing) = self.graph.with(self.signals.scenes, |t| t.get(index)).flatten() {
            return existing;
        }
        let state = self.graph.create_signal(SceneState::default());
        self.graph
            .update(self.signals.scenes, |table| table.insert(index, state));
        state
    }

    pub(crate) fn remove_scene(&mut self, index: i32) {
        let mut removed = None;
        self.graph.update(self.signals.scenes, |table| {
            removed = table.remove(index);
        });
        if let Some(state) = removed {
            self.graph.remove_signal(state);
        }
    }

    pub(crate) fn update_scene(&mut self, index: i32, f: impl FnOnce(&mut SceneState)) -> bool {
        let Some(signal) = self.graph.with(self.signals.scenes, |t| t.get(index)).flatten() else {
            return false;
        };
        self.graph.update(signal, f)
    }
}
