//! Collapsible scene wrapper
//!
//! Adapts one tab's scrollable surface to the container: registers it,
//! forwards its scroll offsets, syncs its first visible offset to the shared
//! one, and computes the insets that leave room for the header and tab bar.

use crate::context::HeaderTabContext;
use crate::registry::SurfaceHandle;
use headtab_core::events::ScrollEvent;

/// Minimum spacing of forwarded scroll reports
pub const SCROLL_EVENT_THROTTLE_MS: f64 = 16.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneOptions {
    pub index: i32,
    /// The wrapped surface came with its own scroll callback
    pub custom_on_scroll: bool,
    pub throttle_ms: f64,
}

impl SceneOptions {
    pub fn new(index: i32) -> Self {
        Self {
            index,
            custom_on_scroll: false,
            throttle_ms: SCROLL_EVENT_THROTTLE_MS,
        }
    }

    pub fn with_custom_on_scroll(mut self) -> Self {
        self.custom_on_scroll = true;
        self
    }
}

/// Layout a scene applies to its content
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLayout {
    /// Space above the content for the header and tab bar
    pub padding_top: f64,
    /// Smallest content height that still lets the header fully collapse
    pub min_height: f64,
    pub scroll_indicator_inset_top: f64,
}

pub struct CollapsibleScene {
    index: i32,
    throttle_ms: f64,
    last_report_ms: Option<f64>,
    pending: Option<f64>,
    synced: bool,
}

impl CollapsibleScene {
    /// Register the scene's surface and native recognizer with the container
    pub fn mount(ctx: &mut HeaderTabContext<'_>, options: SceneOptions, surface: SurfaceHandle) -> Self {
        if options.custom_on_scroll {
            tracing::warn!(
                index = options.index,
                "scene scroll callback is replaced by the container; observe the shared offset instead"
            );
        }
        ctx.register_native_gesture(options.index);
        ctx.register_scene(options.index, surface);
        Self {
            index: options.index,
            throttle_ms: options.throttle_ms,
            last_report_ms: None,
            pending: None,
            synced: false,
        }
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Forward a scroll report, throttled. Returns whether it was delivered;
    /// a throttled report is kept and delivered by [`Self::flush`].
    pub fn on_scroll(&mut self, ctx: &mut HeaderTabContext<'_>, event: ScrollEvent) -> bool {
        if let Some(last) = self.last_report_ms {
            if event.timestamp_ms - last < self.throttle_ms {
                self.pending = Some(event.offset_y);
                return false;
            }
        }
        self.last_report_ms = Some(event.timestamp_ms);
        self.pending = None;
        ctx.report_scroll(self.index, event.offset_y);
        true
    }

    /// Deliver the last throttled report, if any
    pub fn flush(&mut self, ctx: &mut HeaderTabContext<'_>) {
        if let Some(offset) = self.pending.take() {
            ctx.report_scroll(self.index, offset);
        }
    }

    /// The surface measured its content. The first time the content is tall
    /// enough, the scene jumps to the shared offset and fades in.
    pub fn on_content_size_change(&mut self, ctx: &mut HeaderTabContext<'_>, height: f64) -> bool {
        let ready = ctx.report_content_size(self.index);
        if !ready || self.synced || height.ceil() < ctx.expect_height() {
            return false;
        }
        self.synced = true;
        tracing::debug!(index = self.index, shared = ctx.shared_offset(), "scene synced");
        ctx.sync_initial_position(self.index);
        true
    }

    pub fn layout(&self, ctx: &HeaderTabContext<'_>) -> SceneLayout {
        SceneLayout {
            padding_top: ctx.header_height() + ctx.tabbar_height(),
            min_height: ctx.expect_height(),
            scroll_indicator_inset_top: ctx.header_height(),
        }
    }

    pub fn opacity(&self, ctx: &HeaderTabContext<'_>) -> f64 {
        ctx.scene_opacity(self.index)
    }

    pub fn unmount(self, ctx: &mut HeaderTabContext<'_>) {
        ctx.unregister_scene(self.index);
    }
}
