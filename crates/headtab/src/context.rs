//! Scene-facing view of a container
//!
//! Scenes never hold the container. They borrow it for the duration of one
//! call through [`HeaderTabContext`], which exposes exactly what a scene
//! needs: the shared layout values and the registration and reporting hooks.

use crate::container::GestureContainer;
use crate::registry::SurfaceHandle;

pub struct HeaderTabContext<'a> {
    container: &'a mut GestureContainer,
}

impl<'a> HeaderTabContext<'a> {
    pub(crate) fn new(container: &'a mut GestureContainer) -> Self {
        Self { container }
    }

    pub fn shared_offset(&self) -> f64 {
        self.container.store().shared_offset()
    }

    pub fn header_collapse_offset(&self) -> f64 {
        self.container.store().header_collapse_offset()
    }

    pub fn header_height(&self) -> f64 {
        self.container.store().header_height()
    }

    pub fn tabbar_height(&self) -> f64 {
        self.container.store().tabbar_height()
    }

    /// Minimum content height that lets the header fully collapse
    pub fn expect_height(&self) -> f64 {
        self.container.store().expect_height()
    }

    pub fn min_header_height(&self) -> f64 {
        self.container.config().min_header_height
    }

    pub fn refresh_height(&self) -> f64 {
        self.container.config().refresh_height
    }

    pub fn overflow_pull(&self) -> f64 {
        self.container.config().overflow_pull
    }

    pub fn pull_extended_coefficient(&self) -> f64 {
        self.container.config().pull_extended_coefficient
    }

    pub fn active_index(&self) -> i32 {
        self.container.active_index()
    }

    pub fn is_sliding_header(&self) -> bool {
        self.container.store().is_sliding_header()
    }

    pub fn is_start_refreshing(&self) -> bool {
        self.container.store().is_start_refreshing()
    }

    pub fn scene_offset(&self, index: i32) -> Option<f64> {
        self.container.scene_offset(index)
    }

    pub fn scene_opacity(&self, index: i32) -> f64 {
        self.container.scene_opacity(index)
    }

    pub fn register_scene(&mut self, index: i32, surface: SurfaceHandle) {
        self.container.register_scene(index, surface);
    }

    pub fn unregister_scene(&mut self, index: i32) {
        self.container.unregister_scene(index);
    }

    /// Let the header and outer recognizers run alongside a scene's native
    /// scroll recognizer. Repeated registrations are ignored.
    pub fn register_native_gesture(&mut self, index: i32) {
        self.container.register_native_gesture(index);
    }

    pub fn report_scroll(&mut self, index: i32, offset: f64) {
        self.container.report_scroll(index, offset);
    }

    /// Mark the scene laid out. Returns whether it is ready.
    pub fn report_content_size(&mut self, index: i32) -> bool {
        self.container.report_content_size(index)
    }

    pub fn sync_initial_position(&mut self, index: i32) {
        self.container.sync_initial_position(index);
    }
}
