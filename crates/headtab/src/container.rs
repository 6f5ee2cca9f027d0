//! Gesture container
//!
//! Owns the store, the scene registry, gesture arbitration, the refresh
//! machine, and the animation driver. Every input (touch, scroll report,
//! layout, frame tick, refreshing flag) goes through one `&mut self` method,
//! which applies it and then drains reaction commands until the state is
//! quiescent.

use crate::config::ContainerConfig;
use crate::context::HeaderTabContext;
use crate::engine::{AnimatedValue, Animations, Completion, EngineCx};
use crate::error::Result;
use crate::gesture::{GestureArbiter, GestureComposer, RecognizerId};
use crate::notify::{AppNotification, NotificationHandlers, NotificationSender, Notifier};
use crate::reactions::{EngineCommand, ReactionScheduler};
use crate::refresh::{RefreshEvent, RefreshPhase, RefreshStateMachine};
use crate::registry::{SceneRegistry, SurfaceHandle};
use crate::store::SharedOffsetStore;
use headtab_animation::{TimingAnimation, TimingConfig};
use headtab_core::events::TouchEvent;
use headtab_core::reactive::{Effect, ReactiveGraph};

/// Upper bound on reaction passes per input; reactions converge in two or
/// three, so hitting this means two reactions disagree
const MAX_SETTLE_PASSES: usize = 16;

/// Layout changes of the tab bar below this are ignored
const TABBAR_LAYOUT_TOLERANCE: f64 = 1.0;

macro_rules! engine_cx {
    ($self:ident) => {
        EngineCx {
            store: &mut $self.store,
            registry: &mut $self.registry,
            animations: &mut $self.animations,
            notifier: &$self.sender,
        }
    };
}

/// What the refresh indicator should show
#[derive(Clone, Debug, PartialEq)]
pub struct RefreshControlState {
    pub phase: RefreshPhase,
    /// Pull distance, `0` at rest
    pub pull: f64,
    /// Pull relative to the refresh height, capped at `1`
    pub progress: f64,
    /// Vertical translation of the indicator
    pub translate_y: f64,
    pub top: f64,
    pub height: f64,
    pub color: Option<String>,
    pub is_refreshing: bool,
}

/// Transforms and opacities of the container's fixed parts
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerRenderState {
    pub header_translate_y: f64,
    /// Tab bar translation inside the header, pulling it under the overflow
    pub tabbar_translate_y: f64,
    /// Content translation while pulling to refresh
    pub content_translate_y: f64,
    pub opacity: f64,
    /// Present only when the application handles refreshes
    pub refresh_control: Option<RefreshControlState>,
}

pub struct GestureContainerBuilder {
    config: ContainerConfig,
    handlers: NotificationHandlers,
}

impl GestureContainerBuilder {
    pub fn on_start_refresh(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.handlers.on_start_refresh = Some(Box::new(callback));
        self
    }

    pub fn on_pull_enough(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.handlers.on_pull_enough = Some(Box::new(callback));
        self
    }

    pub fn on_index_change(mut self, callback: impl FnMut(i32) + Send + 'static) -> Self {
        self.handlers.on_index_change = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Result<GestureContainer> {
        self.config.validate()?;
        Ok(GestureContainer::assemble(self.config, self.handlers))
    }
}

pub struct GestureContainer {
    config: ContainerConfig,
    store: SharedOffsetStore,
    registry: SceneRegistry,
    animations: Animations,
    arbiter: GestureArbiter,
    composer: GestureComposer,
    refresh: RefreshStateMachine,
    reactions: ReactionScheduler,
    notifier: Notifier,
    sender: NotificationSender,
}

impl GestureContainer {
    pub fn builder(config: ContainerConfig) -> GestureContainerBuilder {
        GestureContainerBuilder {
            config,
            handlers: NotificationHandlers::default(),
        }
    }

    /// A container without application callbacks; pull-to-refresh stays off
    pub fn new(config: ContainerConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    fn assemble(config: ContainerConfig, handlers: NotificationHandlers) -> Self {
        let mut store = SharedOffsetStore::new(&config);
        let (signals, metrics) = (*store.signals(), *store.metrics());
        let reactions = ReactionScheduler::install(store.graph_mut(), signals, metrics);
        let composer = GestureComposer::new(&config);
        let mut arbiter = GestureArbiter::new();
        arbiter.set_specs(composer.recognizer_specs());
        let notifier = Notifier::new(handlers);
        let sender = notifier.sender();

        let mut container = Self {
            refresh: RefreshStateMachine::new(config.refresh_height),
            store,
            registry: SceneRegistry::new(),
            animations: Animations::new(),
            arbiter,
            composer,
            reactions,
            notifier,
            sender,
            config,
        };
        if container.config.is_refreshing {
            container.set_refreshing(true);
        }
        container.settle();
        tracing::debug!(
            initial_page = container.config.initial_page,
            header_height = container.store.header_height(),
            "gesture container ready"
        );
        container
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedOffsetStore {
        &self.store
    }

    pub fn graph(&self) -> &ReactiveGraph {
        self.store.graph()
    }

    /// Observe the store. The effect runs now and after every change to a
    /// signal it read.
    pub fn observe(&mut self, f: impl FnMut(&ReactiveGraph) + Send + 'static) -> Effect {
        self.store.graph_mut().create_effect(f)
    }

    pub fn unobserve(&mut self, effect: Effect) {
        self.store.graph_mut().dispose_effect(effect);
    }

    /// Scene-facing view of the container
    pub fn context(&mut self) -> HeaderTabContext<'_> {
        HeaderTabContext::new(self)
    }

    pub fn arbiter(&self) -> &GestureArbiter {
        &self.arbiter
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Feed a raw touch event through gesture arbitration
    pub fn handle_touch(&mut self, touch: TouchEvent) {
        let active = self.store.active_scene_index();
        let dispatches = self.arbiter.handle(&touch, active);
        let refresh_enabled = self.notifier.has_start_refresh_handler();

        for dispatch in dispatches {
            match dispatch.recognizer {
                RecognizerId::Header => {
                    let mut cx = engine_cx!(self);
                    if let Some(completion) = self.composer.on_header(&dispatch.event, &mut cx) {
                        self.run_completion(completion);
                    }
                }
                RecognizerId::Outer => {
                    let mut cx = engine_cx!(self);
                    let interrupted = self.composer.on_outer(
                        &dispatch.event,
                        &mut cx,
                        &mut self.refresh,
                        refresh_enabled,
                    );
                    if let Some(completion) = interrupted {
                        self.run_completion(completion);
                    }
                }
                other => {
                    tracing::trace!(recognizer = ?other, phase = ?dispatch.event.phase, "platform gesture");
                }
            }
            self.settle();
        }
    }

    /// Advance animations by `dt` seconds
    pub fn frame(&mut self, dt: f64) {
        for frame in self.animations.tick(dt) {
            match frame.target {
                AnimatedValue::HeaderCollapse => {
                    self.store.set_header_collapse_offset(frame.value);
                }
                AnimatedValue::RefreshDrag => {
                    self.store.set_refresh_drag_offset(frame.value);
                }
                AnimatedValue::ContainerOpacity => {
                    self.store.set_container_opacity(frame.value);
                }
                AnimatedValue::SceneOpacity(index) => self.registry.set_opacity(index, frame.value),
            }
            self.settle();
            if let Some(completion) = frame.completion {
                self.run_completion(completion);
                self.settle();
            }
        }
    }

    /// Tick frames of `dt` until no animation is running, up to `max_frames`.
    /// Returns the number of frames run.
    pub fn run_until_idle(&mut self, dt: f64, max_frames: usize) -> usize {
        let mut frames = 0;
        while !self.animations.is_empty() && frames < max_frames {
            self.frame(dt);
            frames += 1;
        }
        frames
    }

    pub fn is_animating(&self) -> bool {
        !self.animations.is_empty()
    }

    /// Follow the application's refreshing flag
    pub fn set_refreshing(&mut self, refreshing: bool) {
        let mut cx = engine_cx!(self);
        self.refresh.set_external(&mut cx, refreshing);
        self.settle();
    }

    /// Make `index` the active scene
    pub fn set_current_index(&mut self, index: i32) {
        let previous = self.store.active_scene_index();
        if index == previous {
            return;
        }

        if let Some(completion) = self.animations.cancel(AnimatedValue::HeaderCollapse) {
            self.run_completion(completion);
        }
        self.end_scene_gestures(None);
        {
            let mut cx = engine_cx!(self);
            cx.sync_inactive_scenes();
        }
        self.store.set_active_scene_index(index);
        self.store.set_slide_scene_index(-1);
        self.store.set_drag_origin_scene_index(-1);
        if let Some(state) = self.registry.state(&self.store, index).filter(|s| s.is_ready) {
            self.store.set_shared_offset(state.scroll_offset);
        }
        tracing::debug!(previous, index, shared = self.store.shared_offset(), "active scene changed");
        self.settle();
    }

    /// Ask the tab switcher to change tabs
    pub fn request_index_change(&mut self, index: i32) {
        self.sender.send(AppNotification::IndexChange(index));
    }

    // =========================================================================
    // Layout
    // =========================================================================

    pub fn on_header_layout(&mut self, height: f64) {
        let header_height = (height - self.config.overflow_height).max(0.0);
        self.store.set_header_height(header_height);
        if header_height != 0.0
            && self.store.container_opacity() < 1.0
            && !self.animations.is_running(AnimatedValue::ContainerOpacity)
        {
            let fade = TimingAnimation::new(self.store.container_opacity(), 1.0, TimingConfig::default());
            self.animations
                .start(AnimatedValue::ContainerOpacity, fade, Completion::None);
        }
        self.settle();
    }

    pub fn on_tabbar_layout(&mut self, height: f64) {
        if self.config.overflow_height > height {
            tracing::warn!(
                overflow_height = self.config.overflow_height,
                tabbar_height = height,
                "overflow height is larger than the tab bar"
            );
        }
        if (height - self.store.tabbar_height()).abs() < TABBAR_LAYOUT_TOLERANCE {
            return;
        }
        self.store.set_tabbar_height(height);
        self.settle();
    }

    pub fn on_container_layout(&mut self, height: f64) {
        self.store.set_tabview_height(height);
        self.settle();
    }

    // =========================================================================
    // Scene contract (through HeaderTabContext)
    // =========================================================================

    pub(crate) fn register_scene(&mut self, index: i32, surface: SurfaceHandle) {
        self.registry.register(&mut self.store, index, surface);
        self.settle();
    }

    pub(crate) fn unregister_scene(&mut self, index: i32) {
        self.end_scene_gestures(Some(index));
        self.animations.cancel(AnimatedValue::SceneOpacity(index));
        self.registry.unregister(&mut self.store, index);
        if self.composer.unregister_native_gesture(index) {
            self.arbiter.set_specs(self.composer.recognizer_specs());
        }
        self.settle();
    }

    pub(crate) fn register_native_gesture(&mut self, index: i32) {
        if self.composer.register_native_gesture(index) {
            self.arbiter.set_specs(self.composer.recognizer_specs());
        }
    }

    pub(crate) fn report_scroll(&mut self, index: i32, offset: f64) {
        if self.registry.record_scroll(&mut self.store, index, offset) {
            self.settle();
        }
    }

    pub(crate) fn report_content_size(&mut self, index: i32) -> bool {
        let changed = self.registry.mark_ready(&mut self.store, index);
        if changed {
            tracing::debug!(index, "scene ready");
            self.settle();
        }
        self.registry.is_ready(&self.store, index)
    }

    /// Bring a newly laid out scene to the shared offset and fade it in
    pub(crate) fn sync_initial_position(&mut self, index: i32) {
        let target = self
            .store
            .shared_offset()
            .clamp(0.0, self.store.collapse_height());
        self.registry.scroll_to(&mut self.store, index, target);

        let fade = TimingAnimation::new(self.registry.opacity(index), 1.0, TimingConfig::default());
        self.animations
            .start(AnimatedValue::SceneOpacity(index), fade, Completion::None);
        self.settle();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn run_completion(&mut self, completion: Completion) {
        match completion {
            Completion::None => {}
            Completion::HeaderSlideEnded => {
                self.store.set_sliding_header(false);
                let reconciled = self
                    .store
                    .shared_offset()
                    .clamp(0.0, self.store.header_bound());
                self.store.set_header_collapse_offset(reconciled);
                tracing::debug!(offset = reconciled, "header slide ended");
            }
            Completion::HoldReleased => {
                self.store.set_dragging(false);
            }
            Completion::RefreshEntered | Completion::RefreshOvershot | Completion::RefreshSettled => {
                let mut cx = engine_cx!(self);
                self.refresh.complete(&mut cx, completion);
            }
        }
    }

    /// End a header slide or pull still driven by `scene` (any scene when
    /// `None`), so no gesture outlives the scene it was scrolling
    fn end_scene_gestures(&mut self, scene: Option<i32>) {
        let owned = |owner: i32| scene.map_or(true, |index| index == owner);
        if self.store.is_sliding_header() && owned(self.store.slide_scene_index()) {
            self.animations.cancel(AnimatedValue::HeaderCollapse);
            self.run_completion(Completion::HeaderSlideEnded);
        }
        if self.store.is_dragging() && owned(self.store.drag_origin_scene_index()) {
            let mut cx = engine_cx!(self);
            self.composer.abort_drag(&mut cx, &mut self.refresh);
        }
    }

    /// Apply reaction commands until none are produced
    fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_PASSES {
            let commands = self.reactions.drain();
            if commands.is_empty() {
                return;
            }
            for command in commands {
                self.apply(command);
            }
        }
        tracing::warn!(passes = MAX_SETTLE_PASSES, "reactions did not settle");
    }

    fn apply(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::ScrollScene { index, offset } => {
                self.registry.scroll_to(&mut self.store, index, offset);
            }
            EngineCommand::SetHeaderCollapse(offset) => {
                self.store.set_header_collapse_offset(offset);
            }
            EngineCommand::PublishHeaderPosition(position) => {
                self.store.set_header_position(position);
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn active_index(&self) -> i32 {
        self.store.active_scene_index()
    }

    pub fn shared_offset(&self) -> f64 {
        self.store.shared_offset()
    }

    pub fn header_collapse_offset(&self) -> f64 {
        self.store.header_collapse_offset()
    }

    pub fn header_translate(&self) -> f64 {
        self.store.header_translate()
    }

    pub fn is_refreshing(&self) -> bool {
        self.store.is_refreshing()
    }

    pub fn refresh_phase(&self) -> RefreshPhase {
        self.refresh.phase()
    }

    pub fn refresh_history(&self) -> &[(RefreshPhase, RefreshEvent, RefreshPhase)] {
        self.refresh.history()
    }

    pub fn scene_offset(&self, index: i32) -> Option<f64> {
        self.registry
            .state(&self.store, index)
            .map(|state| state.scroll_offset)
    }

    pub fn scene_opacity(&self, index: i32) -> f64 {
        self.registry.opacity(index)
    }

    pub fn scene_indices(&self) -> Vec<i32> {
        self.registry.indices()
    }

    pub fn refresh_control_state(&self) -> Option<RefreshControlState> {
        if !self.notifier.has_start_refresh_handler() {
            return None;
        }
        let height = self.config.refresh_height;
        let pull = self.store.refresh_pull();
        Some(RefreshControlState {
            phase: self.refresh.phase(),
            pull,
            progress: (pull / height).min(1.0),
            translate_y: self.store.refresh_translate() - height,
            top: self.config.refresh_control_top,
            height,
            color: self.config.refresh_control_color.clone(),
            is_refreshing: self.store.is_refreshing(),
        })
    }

    pub fn render_state(&self) -> ContainerRenderState {
        ContainerRenderState {
            header_translate_y: self.store.header_translate(),
            tabbar_translate_y: -self.config.overflow_height,
            content_translate_y: self.store.refresh_translate(),
            opacity: self.store.container_opacity(),
            refresh_control: self.refresh_control_state(),
        }
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Run application callbacks for queued notifications
    pub fn dispatch_notifications(&mut self) -> usize {
        self.notifier.dispatch()
    }

    /// Take queued notifications without running callbacks
    pub fn drain_notifications(&self) -> Vec<AppNotification> {
        self.notifier.drain()
    }

    pub fn notification_sender(&self) -> NotificationSender {
        self.sender.clone()
    }
}
