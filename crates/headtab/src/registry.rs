//! Scene registry
//!
//! Tracks the scrollable surface of every mounted scene. Scenes are keyed by
//! their tab index and may mount lazily, so the table is sparse.

use crate::store::{SceneState, SharedOffsetStore};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A platform scroll view the engine can command
pub trait ScrollSurface: Send + Sync {
    /// Scroll the content to `y`
    fn scroll_to(&self, y: f64, animated: bool);
}

pub type SurfaceHandle = Arc<dyn ScrollSurface>;

/// A registered scene
#[derive(Clone)]
pub struct SceneEntry {
    pub index: i32,
    pub surface: SurfaceHandle,
    pub opacity: f64,
}

impl fmt::Debug for SceneEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneEntry")
            .field("index", &self.index)
            .field("opacity", &self.opacity)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct SceneRegistry {
    entries: FxHashMap<i32, SceneEntry>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scene's surface. Registering an index again replaces the
    /// surface and keeps the recorded scroll state.
    pub fn register(&mut self, store: &mut SharedOffsetStore, index: i32, surface: SurfaceHandle) {
        store.insert_scene(index);
        match self.entries.get_mut(&index) {
            Some(entry) => {
                tracing::debug!(index, "scene surface replaced");
                entry.surface = surface;
            }
            None => {
                tracing::debug!(index, "scene registered");
                self.entries.insert(
                    index,
                    SceneEntry {
                        index,
                        surface,
                        opacity: 0.0,
                    },
                );
            }
        }
    }

    pub fn unregister(&mut self, store: &mut SharedOffsetStore, index: i32) -> bool {
        if self.entries.remove(&index).is_none() {
            return false;
        }
        store.remove_scene(index);
        tracing::debug!(index, "scene unregistered");
        true
    }

    pub fn contains(&self, index: i32) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn get(&self, index: i32) -> Option<&SceneEntry> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered indices in ascending order
    pub fn indices(&self) -> Vec<i32> {
        let mut indices: Vec<i32> = self.entries.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    pub fn is_ready(&self, store: &SharedOffsetStore, index: i32) -> bool {
        self.contains(index) && store.scene_state(index).is_some_and(|s| s.is_ready)
    }

    pub fn mark_ready(&mut self, store: &mut SharedOffsetStore, index: i32) -> bool {
        if !self.contains(index) {
            return false;
        }
        store.update_scene(index, |state| state.is_ready = true)
    }

    pub fn set_opacity(&mut self, index: i32, opacity: f64) {
        if let Some(entry) = self.entries.get_mut(&index) {
            entry.opacity = opacity;
        }
    }

    pub fn opacity(&self, index: i32) -> f64 {
        self.entries.get(&index).map_or(0.0, |entry| entry.opacity)
    }

    /// Record an offset the scene is now at. The active scene's offset
    /// becomes the shared offset.
    pub fn record_scroll(&mut self, store: &mut SharedOffsetStore, index: i32, offset: f64) -> bool {
        if !self.contains(index) {
            return false;
        }
        let offset = offset.max(0.0);
        store.update_scene(index, |state| state.scroll_offset = offset);
        if index == store.active_scene_index() {
            store.set_shared_offset(offset);
        }
        true
    }

    /// Scroll a scene without animation and record the new offset.
    ///
    /// Returns `false` without touching the surface when the scene is unknown,
    /// not ready, or already at `offset`.
    pub fn scroll_to(&mut self, store: &mut SharedOffsetStore, index: i32, offset: f64) -> bool {
        let Some(entry) = self.entries.get(&index) else {
            return false;
        };
        let Some(state) = store.scene_state(index) else {
            return false;
        };
        if !state.is_ready {
            tracing::trace!(index, "skipping scroll of unready scene");
            return false;
        }
        let offset = offset.max(0.0);
        if state.scroll_offset == offset {
            return false;
        }

        tracing::trace!(index, from = state.scroll_offset, to = offset, "scroll scene");
        entry.surface.scroll_to(offset, false);
        self.record_scroll(store, index, offset)
    }

    pub fn state(&self, store: &SharedOffsetStore, index: i32) -> Option<SceneState> {
        if !self.contains(index) {
            return None;
        }
        store.scene_state(index)
    }
}
