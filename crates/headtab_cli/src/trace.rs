//! Gesture trace files
//!
//! A trace describes the scenes to mount and a list of steps to replay
//! against a container. Traces are JSON, or TOML when the file ends in
//! `.toml`.

use anyhow::{bail, Context, Result};
use headtab::prelude::*;
use headtab::scene::SCROLL_EVENT_THROTTLE_MS;
use headtab::AppNotification;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Deserialize, Serialize)]
pub struct Trace {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub scenes: Vec<SceneConfig>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Measured sizes applied before the first step
#[derive(Debug, Deserialize, Serialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub header: Option<f64>,
    #[serde(default)]
    pub tabbar: Option<f64>,
    #[serde(default = "default_container_height")]
    pub container: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header: None,
            tabbar: None,
            container: default_container_height(),
        }
    }
}

fn default_container_height() -> f64 {
    640.0
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SceneConfig {
    pub index: i32,
    /// Content height reported once mounted. Omit to keep the scene unready.
    #[serde(default)]
    pub content_height: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Touch(TouchStep),
    Scroll { index: i32, offset: f64 },
    Frames(usize),
    SetIndex(i32),
    Refreshing(bool),
    /// Run frames until no animation is left
    Settle,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TouchStep {
    pub phase: Phase,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Header,
    #[default]
    Content,
}

impl From<Target> for TouchTarget {
    fn from(target: Target) -> Self {
        match target {
            Target::Header => TouchTarget::Header,
            Target::Content => TouchTarget::Content,
        }
    }
}

impl TouchStep {
    fn event(&self) -> TouchEvent {
        let target = self.target.into();
        match self.phase {
            Phase::Down => TouchEvent::down(target),
            Phase::Move => TouchEvent::moved(target, self.x, self.y),
            Phase::Up => TouchEvent::up(target, self.vy).with_velocity(self.vx, self.vy),
            Phase::Cancel => TouchEvent::cancel(target),
        }
    }
}

impl Step {
    pub fn label(&self) -> String {
        match self {
            Step::Touch(touch) => format!("touch {:?} {:?} y={}", touch.target, touch.phase, touch.y),
            Step::Scroll { index, offset } => format!("scroll #{index} -> {offset}"),
            Step::Frames(count) => format!("frames x{count}"),
            Step::SetIndex(index) => format!("set index {index}"),
            Step::Refreshing(refreshing) => format!("refreshing = {refreshing}"),
            Step::Settle => "settle".to_string(),
        }
    }
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let trace: Trace = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?
        };
        trace.validate()?;
        Ok(trace)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let trace: Trace = serde_json::from_str(content)?;
        trace.validate()?;
        Ok(trace)
    }

    fn validate(&self) -> Result<()> {
        for (i, scene) in self.scenes.iter().enumerate() {
            if self.scenes[..i].iter().any(|other| other.index == scene.index) {
                bail!("scene {} is listed twice", scene.index);
            }
        }
        Ok(())
    }
}

/// Scroll surface that only counts and logs the commands it receives
#[derive(Default)]
pub struct LoggingSurface {
    index: i32,
    commands: AtomicUsize,
}

impl LoggingSurface {
    pub fn new(index: i32) -> Self {
        Self {
            index,
            commands: AtomicUsize::new(0),
        }
    }

    pub fn commands(&self) -> usize {
        self.commands.load(Ordering::Relaxed)
    }
}

impl ScrollSurface for LoggingSurface {
    fn scroll_to(&self, y: f64, animated: bool) {
        self.commands.fetch_add(1, Ordering::Relaxed);
        tracing::info!(index = self.index, y, animated, "scroll command");
    }
}

/// Container state after one step
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub step: usize,
    pub label: String,
    pub active_index: i32,
    pub shared_offset: f64,
    pub header_collapse_offset: f64,
    pub header_translate: f64,
    pub refresh_phase: String,
    pub refresh_pull: f64,
    pub scenes: Vec<(i32, Option<f64>)>,
    pub notifications: Vec<String>,
}

impl Snapshot {
    pub fn line(&self) -> String {
        let scenes = self
            .scenes
            .iter()
            .map(|(index, offset)| match offset {
                Some(offset) => format!("{index}:{offset:.1}"),
                None => format!("{index}:-"),
            })
            .collect::<Vec<_>>()
            .join(" ");
        let mut line = format!(
            "{:>3} {:<32} active={} shared={:.1} collapse={:.1} translate={:.1} refresh={}({:.1}) [{}]",
            self.step,
            self.label,
            self.active_index,
            self.shared_offset,
            self.header_collapse_offset,
            self.header_translate,
            self.refresh_phase,
            self.refresh_pull,
            scenes,
        );
        if !self.notifications.is_empty() {
            line.push_str(&format!(" notify: {}", self.notifications.join(", ")));
        }
        line
    }
}

/// Replays a trace against a container
pub struct Simulator {
    container: GestureContainer,
    scenes: Vec<CollapsibleScene>,
    surfaces: Vec<Arc<LoggingSurface>>,
    dt: f64,
    clock_ms: f64,
}

impl Simulator {
    pub fn new(config: ContainerConfig, trace: &Trace, fps: u32) -> Result<Self> {
        if fps == 0 {
            bail!("fps must be positive");
        }
        // Notifications are drained into snapshots rather than dispatched; the
        // handler only has to exist for pull-to-refresh to engage.
        let mut container = GestureContainer::builder(config)
            .on_start_refresh(|| {})
            .build()
            .context("Invalid container configuration")?;

        if let Some(header) = trace.layout.header {
            container.on_header_layout(header);
        }
        if let Some(tabbar) = trace.layout.tabbar {
            container.on_tabbar_layout(tabbar);
        }
        container.on_container_layout(trace.layout.container);

        let mut scenes = Vec::with_capacity(trace.scenes.len());
        let mut surfaces = Vec::with_capacity(trace.scenes.len());
        for scene in &trace.scenes {
            let surface = Arc::new(LoggingSurface::new(scene.index));
            let mut ctx = container.context();
            let mut mounted = CollapsibleScene::mount(&mut ctx, SceneOptions::new(scene.index), surface.clone());
            if let Some(height) = scene.content_height {
                mounted.on_content_size_change(&mut ctx, height);
            }
            scenes.push(mounted);
            surfaces.push(surface);
        }

        Ok(Self {
            container,
            scenes,
            surfaces,
            dt: 1.0 / f64::from(fps),
            clock_ms: 0.0,
        })
    }

    pub fn container(&self) -> &GestureContainer {
        &self.container
    }

    /// Total scroll commands issued to every surface so far
    pub fn scroll_commands(&self) -> usize {
        self.surfaces.iter().map(|surface| surface.commands()).sum()
    }

    pub fn run(&mut self, steps: &[Step]) -> Vec<Snapshot> {
        steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                self.apply(step);
                self.snapshot(i + 1, step.label())
            })
            .collect()
    }

    pub fn apply(&mut self, step: &Step) {
        match step {
            Step::Touch(touch) => self.container.handle_touch(touch.event()),
            Step::Scroll { index, offset } => {
                let mut ctx = self.container.context();
                match self.scenes.iter_mut().find(|scene| scene.index() == *index) {
                    Some(scene) => {
                        scene.on_scroll(&mut ctx, ScrollEvent::new(*offset, self.clock_ms));
                        self.clock_ms += SCROLL_EVENT_THROTTLE_MS;
                    }
                    None => tracing::warn!(index, "scroll report for a scene the trace never mounted"),
                }
            }
            Step::Frames(count) => {
                for _ in 0..*count {
                    self.container.frame(self.dt);
                }
                self.clock_ms += self.dt * 1000.0 * *count as f64;
            }
            Step::SetIndex(index) => self.container.set_current_index(*index),
            Step::Refreshing(refreshing) => self.container.set_refreshing(*refreshing),
            Step::Settle => {
                let frames = self.container.run_until_idle(self.dt, 6000);
                tracing::debug!(frames, "settled");
            }
        }
    }

    fn snapshot(&mut self, step: usize, label: String) -> Snapshot {
        let notifications = self
            .container
            .drain_notifications()
            .into_iter()
            .map(|notification| match notification {
                AppNotification::StartRefresh => "start_refresh".to_string(),
                AppNotification::PullEnough => "pull_enough".to_string(),
                AppNotification::IndexChange(index) => format!("index_change({index})"),
            })
            .collect();
        let store = self.container.store();
        Snapshot {
            step,
            label,
            active_index: self.container.active_index(),
            shared_offset: self.container.shared_offset(),
            header_collapse_offset: self.container.header_collapse_offset(),
            header_translate: self.container.header_translate(),
            refresh_phase: format!("{:?}", self.container.refresh_phase()),
            refresh_pull: store.refresh_pull(),
            scenes: self
                .container
                .scene_indices()
                .into_iter()
                .map(|index| (index, self.container.scene_offset(index)))
                .collect(),
            notifications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r#"{
        "layout": { "header": 100, "container": 600 },
        "scenes": [
            { "index": 0, "content_height": 5000 },
            { "index": 1, "content_height": 5000 }
        ],
        "steps": [
            { "scroll": { "index": 0, "offset": 60 } },
            { "set_index": 1 },
            "settle"
        ]
    }"#;

    fn config() -> ContainerConfig {
        ContainerConfig::default().with_header_height(100.0)
    }

    #[test]
    fn test_parse_trace() {
        let trace = Trace::from_json(TRACE).unwrap();
        assert_eq!(trace.scenes.len(), 2);
        assert_eq!(trace.layout.header, Some(100.0));
        assert!(matches!(trace.steps[1], Step::SetIndex(1)));
        assert!(matches!(trace.steps[2], Step::Settle));
    }

    #[test]
    fn test_duplicate_scene_rejected() {
        let json = r#"{ "scenes": [ { "index": 0 }, { "index": 0 } ] }"#;
        assert!(Trace::from_json(json).is_err());
    }

    #[test]
    fn test_touch_step_defaults() {
        let json = r#"{ "steps": [ { "touch": { "phase": "move", "y": 12 } } ] }"#;
        let trace = Trace::from_json(json).unwrap();
        let Step::Touch(touch) = &trace.steps[0] else {
            panic!("expected a touch step");
        };
        let event = touch.event();
        assert_eq!(event.target, TouchTarget::Content);
        assert_eq!(event.translation_y, 12.0);
    }

    #[test]
    fn test_replay_tab_switch() {
        let trace = Trace::from_json(TRACE).unwrap();
        let mut sim = Simulator::new(config(), &trace, 60).unwrap();
        let snapshots = sim.run(&trace.steps);

        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].shared_offset, 60.0);
        assert_eq!(snapshots[1].active_index, 1);
        assert_eq!(sim.container().scene_offset(1), Some(60.0));
        assert!(snapshots[2].line().contains("active=1"));
    }

    #[test]
    fn test_replay_bundled_trace() {
        let trace = Trace::from_json(include_str!("../traces/pull_to_refresh.json")).unwrap();
        let mut sim = Simulator::new(ContainerConfig::default(), &trace, 60).unwrap();
        let snapshots = sim.run(&trace.steps);

        let released = &snapshots[6];
        assert_eq!(released.refresh_phase, "Refreshing");
        assert!(released.notifications.contains(&"start_refresh".to_string()));
        assert_eq!(snapshots[9].refresh_phase, "Idle");
        assert!(sim.scroll_commands() > 0);
    }

    #[test]
    fn test_zero_fps_rejected() {
        let trace = Trace::from_json(TRACE).unwrap();
        assert!(Simulator::new(config(), &trace, 0).is_err());
    }
}
