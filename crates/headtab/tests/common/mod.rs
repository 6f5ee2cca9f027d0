//! Shared fixtures for the container tests

#![allow(dead_code)]

use headtab::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;

pub const FRAME: f64 = 1.0 / 60.0;

/// A scroll surface that records every command it receives
#[derive(Default)]
pub struct RecordingSurface {
    commands: Mutex<Vec<f64>>,
}

impl RecordingSurface {
    pub fn commands(&self) -> Vec<f64> {
        self.commands.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.commands.lock().len()
    }
}

impl ScrollSurface for RecordingSurface {
    fn scroll_to(&self, y: f64, _animated: bool) {
        self.commands.lock().push(y);
    }
}

#[derive(Default)]
pub struct Counters {
    pub start_refresh: Mutex<usize>,
    pub pull_enough: Mutex<usize>,
}

pub struct Rig {
    pub container: GestureContainer,
    pub surfaces: Vec<Arc<RecordingSurface>>,
    pub scenes: Vec<CollapsibleScene>,
    pub counters: Arc<Counters>,
}

impl Rig {
    /// Container with a 100px header, 600px tab view, and refresh callbacks
    pub fn new(config: ContainerConfig) -> Self {
        let counters = Arc::new(Counters::default());
        let (a, b) = (counters.clone(), counters.clone());
        let mut container = GestureContainer::builder(config)
            .on_start_refresh(move || *a.start_refresh.lock() += 1)
            .on_pull_enough(move || *b.pull_enough.lock() += 1)
            .build()
            .unwrap();
        container.on_header_layout(100.0);
        container.on_container_layout(600.0);
        Self {
            container,
            surfaces: Vec::new(),
            scenes: Vec::new(),
            counters,
        }
    }

    pub fn default_config() -> ContainerConfig {
        ContainerConfig::default().with_header_height(100.0)
    }

    /// Mount a scene; `ready` also reports a tall content size
    pub fn mount(&mut self, index: i32, ready: bool) -> Arc<RecordingSurface> {
        let surface = Arc::new(RecordingSurface::default());
        let mut ctx = self.container.context();
        let mut scene = CollapsibleScene::mount(&mut ctx, SceneOptions::new(index), surface.clone());
        if ready {
            scene.on_content_size_change(&mut ctx, 5000.0);
        }
        self.surfaces.push(surface.clone());
        self.scenes.push(scene);
        surface
    }

    /// Unmount the scene with `index`, as a lazy tab view does
    pub fn unmount(&mut self, index: i32) {
        let Some(position) = self.scenes.iter().position(|scene| scene.index() == index) else {
            return;
        };
        let scene = self.scenes.remove(position);
        let mut ctx = self.container.context();
        scene.unmount(&mut ctx);
    }

    /// Report a scroll offset from the scene with `index`
    pub fn scroll(&mut self, index: i32, offset: f64) {
        let mut ctx = self.container.context();
        ctx.report_scroll(index, offset);
    }

    pub fn touch(&mut self, event: TouchEvent) {
        self.container.handle_touch(event);
    }

    /// Press, move past the activation slop, then move by each translation
    /// (relative to the activation point), then release
    pub fn drag(&mut self, target: TouchTarget, moves: &[f64], release_velocity: f64) {
        let slop = if moves.first().copied().unwrap_or(0.0) < 0.0 { -11.0 } else { 11.0 };
        self.touch(TouchEvent::down(target));
        self.touch(TouchEvent::moved(target, 0.0, slop));
        for ty in moves {
            self.touch(TouchEvent::moved(target, 0.0, slop + ty));
        }
        self.touch(TouchEvent::up(target, release_velocity));
    }

    pub fn settle(&mut self) {
        self.container.run_until_idle(FRAME, 600);
    }

    pub fn dispatch(&mut self) {
        self.container.dispatch_notifications();
    }

    pub fn start_refresh_calls(&self) -> usize {
        *self.counters.start_refresh.lock()
    }

    pub fn pull_enough_calls(&self) -> usize {
        *self.counters.pull_enough.lock()
    }
}

pub fn approx(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
