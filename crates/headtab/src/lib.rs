//! headtab
//!
//! Interaction engine for a collapsible header above a set of swipeable,
//! independently scrolling scenes, with pull-to-refresh.
//!
//! Every scene scrolls its own surface, yet the header must look as if a
//! single list were being scrolled. The engine keeps one authoritative
//! *shared offset* (the active scene's offset), derives the header
//! translation from it, resyncs inactive scenes whenever a drag begins or
//! the tab changes, and arbitrates between dragging the header, scrolling a
//! scene, and pulling the refresh indicator.
//!
//! # Example
//!
//! ```ignore
//! use headtab::prelude::*;
//! use std::sync::Arc;
//!
//! let mut container = GestureContainer::builder(ContainerConfig::default())
//!     .on_start_refresh(|| println!("refresh!"))
//!     .build()?;
//! container.on_header_layout(200.0);
//! container.on_container_layout(640.0);
//!
//! let mut ctx = container.context();
//! let mut scene = CollapsibleScene::mount(&mut ctx, SceneOptions::new(0), Arc::new(my_list));
//! scene.on_content_size_change(&mut ctx, 2400.0);
//! scene.on_scroll(&mut ctx, ScrollEvent::new(120.0, 0.0));
//!
//! container.handle_touch(TouchEvent::down(TouchTarget::Content));
//! container.frame(1.0 / 60.0);
//! container.dispatch_notifications();
//! ```

pub mod config;
pub mod container;
pub mod context;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod notify;
pub mod reactions;
pub mod refresh;
pub mod registry;
pub mod scene;
pub mod store;

pub use config::ContainerConfig;
pub use container::{ContainerRenderState, GestureContainer, GestureContainerBuilder, RefreshControlState};
pub use context::HeaderTabContext;
pub use error::ConfigError;
pub use notify::AppNotification;
pub use refresh::{RefreshPhase, RefreshStateMachine};
pub use registry::{SceneEntry, SceneRegistry, ScrollSurface, SurfaceHandle};
pub use scene::{CollapsibleScene, SceneLayout, SceneOptions};
pub use store::{SceneState, SharedOffsetStore};

pub use headtab_core::events::{PanEvent, PanPhase, ScrollEvent, TouchEvent, TouchPhase, TouchTarget};

pub mod prelude {
    pub use crate::config::ContainerConfig;
    pub use crate::container::{ContainerRenderState, GestureContainer, RefreshControlState};
    pub use crate::context::HeaderTabContext;
    pub use crate::notify::AppNotification;
    pub use crate::refresh::RefreshPhase;
    pub use crate::registry::{ScrollSurface, SurfaceHandle};
    pub use crate::scene::{CollapsibleScene, SceneLayout, SceneOptions};
    pub use headtab_core::events::{ScrollEvent, TouchEvent, TouchTarget};
}
