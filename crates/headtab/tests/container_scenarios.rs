//! End-to-end behavior of the gesture container, driven through raw touches

mod common;

use common::{approx, Rig, FRAME};
use headtab::prelude::*;
use headtab::GestureContainer;
use parking_lot::Mutex;
use std::sync::Arc;

/// Pulling down from the top past the threshold starts a refresh
#[test]
fn test_pull_to_refresh() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    rig.settle();

    rig.touch(TouchEvent::down(TouchTarget::Content));
    rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, 11.0));
    rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, 16.0));
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Pulling);

    rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, 56.0));
    assert_eq!(rig.container.store().refresh_drag_offset(), 40.0);
    assert_eq!(rig.container.store().refresh_pull(), 40.0);
    rig.dispatch();
    assert_eq!(rig.pull_enough_calls(), 0);

    rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, 116.0));
    assert_eq!(rig.container.store().refresh_drag_offset(), -20.0);
    rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, 130.0));
    rig.dispatch();
    assert_eq!(rig.pull_enough_calls(), 1);
    assert_eq!(rig.start_refresh_calls(), 0);

    rig.touch(TouchEvent::up(TouchTarget::Content, 0.0));
    rig.dispatch();
    assert_eq!(rig.start_refresh_calls(), 1);
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Refreshing);
    assert!(rig.container.is_refreshing());

    rig.settle();
    assert_eq!(rig.container.store().refresh_drag_offset(), 0.0);
    assert_eq!(rig.container.store().refresh_pull(), 80.0);
    assert!(rig.container.store().is_refreshing_with_animation());

    rig.container.set_refreshing(false);
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Settling);
    rig.settle();
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Idle);
    assert_eq!(rig.container.store().refresh_drag_offset(), 80.0);
    rig.dispatch();
    assert_eq!(rig.start_refresh_calls(), 1);
}

/// A pull released short of the threshold springs back without refreshing
#[test]
fn test_short_pull_aborts() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    rig.settle();

    rig.drag(TouchTarget::Content, &[5.0, 50.0], 0.0);
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Idle);
    rig.settle();
    rig.dispatch();

    assert_eq!(rig.container.store().refresh_drag_offset(), 80.0);
    assert_eq!(rig.start_refresh_calls(), 0);
    assert_eq!(rig.pull_enough_calls(), 0);
}

/// A cancelled touch never leaves a pull half done
#[test]
fn test_cancelled_pull_returns_to_idle() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    rig.settle();

    rig.touch(TouchEvent::down(TouchTarget::Content));
    rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, 11.0));
    rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, 16.0));
    rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, 150.0));
    rig.touch(TouchEvent::cancel(TouchTarget::Content));

    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Idle);
    assert!(!rig.container.store().is_dragging());
    rig.settle();
    rig.dispatch();
    assert_eq!(rig.container.store().refresh_drag_offset(), 80.0);
    assert_eq!(rig.start_refresh_calls(), 0);
}

#[test]
fn test_pull_needs_scene_at_top() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    rig.settle();
    rig.scroll(0, 30.0);

    rig.drag(TouchTarget::Content, &[5.0, 150.0], 0.0);
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Idle);
    assert_eq!(rig.container.store().refresh_drag_offset(), 80.0);
}

#[test]
fn test_pull_needs_refresh_handler() {
    let mut container = GestureContainer::new(Rig::default_config()).unwrap();
    container.on_container_layout(600.0);
    let surface = Arc::new(common::RecordingSurface::default());
    {
        let mut ctx = container.context();
        let mut scene = CollapsibleScene::mount(&mut ctx, SceneOptions::new(0), surface);
        scene.on_content_size_change(&mut ctx, 5000.0);
    }

    container.handle_touch(TouchEvent::down(TouchTarget::Content));
    for ty in [11.0, 16.0, 200.0] {
        container.handle_touch(TouchEvent::moved(TouchTarget::Content, 0.0, ty));
    }
    container.handle_touch(TouchEvent::up(TouchTarget::Content, 0.0));

    assert_eq!(container.refresh_phase(), RefreshPhase::Idle);
    assert_eq!(container.store().refresh_drag_offset(), 80.0);
    assert!(container.render_state().refresh_control.is_none());
}

/// Dragging the header scrolls the active scene along with it
#[test]
fn test_header_drag_follows_finger() {
    let mut rig = Rig::new(Rig::default_config());
    let surface = rig.mount(0, true);
    rig.settle();
    rig.scroll(0, 50.0);

    rig.touch(TouchEvent::down(TouchTarget::Header));
    rig.touch(TouchEvent::moved(TouchTarget::Header, 0.0, -11.0));
    assert!(rig.container.store().is_sliding_header());

    rig.touch(TouchEvent::moved(TouchTarget::Header, 0.0, -41.0));
    assert!(approx(rig.container.header_collapse_offset(), 80.0, 0.2));
    assert!(approx(rig.container.shared_offset(), 80.0, 0.2));
    assert!(approx(rig.container.header_translate(), -80.0, 0.2));
    assert!(approx(surface.commands().last().copied().unwrap_or(0.0), 80.0, 0.2));

    rig.touch(TouchEvent::moved(TouchTarget::Header, 0.0, -1.0));
    assert!(approx(rig.container.header_collapse_offset(), 40.0, 0.2));
    assert!(approx(rig.container.shared_offset(), 40.0, 0.2));

    rig.touch(TouchEvent::up(TouchTarget::Header, 0.0));
    rig.settle();
    assert!(!rig.container.store().is_sliding_header());
    assert_eq!(
        rig.container.header_collapse_offset(),
        rig.container.shared_offset()
    );
}

/// A header fling keeps collapsing after release and stops at the bound
#[test]
fn test_header_fling_stops_at_bound() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    rig.settle();

    rig.touch(TouchEvent::down(TouchTarget::Header));
    rig.touch(TouchEvent::moved(TouchTarget::Header, 0.0, -11.0));
    rig.touch(TouchEvent::moved(TouchTarget::Header, 0.0, -31.0));
    rig.touch(TouchEvent::up(TouchTarget::Header, -4000.0));
    assert!(rig.container.store().is_sliding_header());

    rig.settle();
    assert_eq!(rig.container.header_collapse_offset(), 100.0);
    assert_eq!(rig.container.shared_offset(), 100.0);
    assert_eq!(rig.container.header_translate(), -100.0);
    assert!(!rig.container.store().is_sliding_header());
}

/// Switching tabs brings the new scene to the shared offset
#[test]
fn test_tab_switch_resyncs_new_scene() {
    let mut rig = Rig::new(Rig::default_config());
    let first = rig.mount(0, true);
    let second = rig.mount(1, true);
    rig.settle();
    rig.scroll(0, 70.0);
    let first_commands = first.count();

    rig.container.set_current_index(1);
    assert_eq!(rig.container.active_index(), 1);
    assert_eq!(rig.container.scene_offset(1), Some(70.0));
    assert_eq!(second.commands(), vec![70.0]);
    assert_eq!(rig.container.shared_offset(), 70.0);
    assert_eq!(rig.container.header_translate(), -70.0);
    assert_eq!(first.count(), first_commands);

    rig.container.set_current_index(1);
    assert_eq!(second.count(), 1);
}

/// A touch on the tab view syncs every ready inactive scene and leaves
/// unready ones alone
#[test]
fn test_drag_begin_resyncs_inactive_scenes() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    let ready = rig.mount(1, true);
    let unready = rig.mount(2, false);
    rig.settle();
    rig.scroll(0, 250.0);

    rig.touch(TouchEvent::down(TouchTarget::Content));
    assert_eq!(rig.container.scene_offset(1), Some(100.0));
    assert_eq!(ready.commands(), vec![100.0]);
    assert!(unready.commands().is_empty());
    rig.touch(TouchEvent::up(TouchTarget::Content, 0.0));
}

/// Clearing the refreshing flag with the indicator already hidden overshoots
/// and then rests
#[test]
fn test_settle_overshoot() {
    let mut rig = Rig::new(Rig::default_config().with_refreshing(true));
    rig.mount(0, true);
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Refreshing);
    assert_eq!(rig.container.store().refresh_drag_offset(), 80.0);

    let drags = Arc::new(Mutex::new(Vec::new()));
    let log = drags.clone();
    let signal = rig.container.store().signals().refresh_drag_offset;
    rig.container
        .observe(move |g| log.lock().push(g.get(signal).unwrap_or(0.0)));

    rig.container.set_refreshing(false);
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Settling);
    rig.settle();

    let drags = drags.lock();
    let peak = drags.iter().copied().fold(f64::MIN, f64::max);
    assert_eq!(peak, 160.0);
    assert_eq!(drags.last(), Some(&80.0));
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Idle);
    assert!(!rig.container.store().is_refreshing_with_animation());

    rig.dispatch();
    assert_eq!(rig.start_refresh_calls(), 0);
}

/// While a refresh runs the indicator can be dragged, and the content stays
/// pinned to the top while the indicator is visible
#[test]
fn test_hold_drag_during_refresh() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    rig.container.set_refreshing(true);
    rig.settle();
    assert_eq!(rig.container.store().refresh_drag_offset(), 0.0);

    rig.touch(TouchEvent::down(TouchTarget::Content));
    rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, -11.0));
    rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, -41.0));
    assert!(rig.container.store().is_dragging());
    assert_eq!(rig.container.store().refresh_drag_offset(), 30.0);

    // Native scroll moves the content; it is pulled back to the top
    rig.scroll(0, 25.0);
    assert_eq!(rig.container.shared_offset(), 0.0);
    assert_eq!(rig.container.scene_offset(0), Some(0.0));

    rig.touch(TouchEvent::up(TouchTarget::Content, 0.0));
    rig.settle();
    assert!(!rig.container.store().is_dragging());
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Refreshing);
}

#[test]
fn test_disabled_scrolling_ignores_touches() {
    let mut rig = Rig::new(Rig::default_config().with_scroll_enabled(false));
    rig.mount(0, true);
    rig.settle();

    rig.drag(TouchTarget::Header, &[-50.0], 0.0);
    rig.drag(TouchTarget::Content, &[5.0, 150.0], 0.0);
    assert_eq!(rig.container.header_collapse_offset(), 0.0);
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Idle);
}

#[test]
fn test_unmounted_scene_is_forgotten() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    let surface = rig.mount(1, true);
    rig.settle();

    let scene = rig.scenes.remove(1);
    {
        let mut ctx = rig.container.context();
        scene.unmount(&mut ctx);
    }
    assert_eq!(rig.container.scene_indices(), vec![0]);

    rig.scroll(0, 60.0);
    rig.touch(TouchEvent::down(TouchTarget::Content));
    rig.touch(TouchEvent::up(TouchTarget::Content, 0.0));
    assert!(surface.commands().is_empty());
}

/// Unmounting the scene under a header drag ends the slide, so the header
/// follows the shared offset again
#[test]
fn test_header_slide_ends_when_scene_unmounts() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    rig.mount(1, true);
    rig.settle();
    rig.scroll(0, 50.0);

    rig.touch(TouchEvent::down(TouchTarget::Header));
    rig.touch(TouchEvent::moved(TouchTarget::Header, 0.0, -11.0));
    rig.touch(TouchEvent::moved(TouchTarget::Header, 0.0, -41.0));
    assert!(rig.container.store().is_sliding_header());

    rig.unmount(0);
    assert!(!rig.container.store().is_sliding_header());
    rig.touch(TouchEvent::up(TouchTarget::Header, -2000.0));
    rig.settle();
    assert!(!rig.container.store().is_sliding_header());

    rig.container.set_current_index(1);
    rig.scroll(1, 10.0);
    rig.settle();
    assert_eq!(rig.container.shared_offset(), 10.0);
    assert_eq!(rig.container.header_collapse_offset(), 10.0);
}

/// Unmounting the scene under a pull springs the indicator back
#[test]
fn test_pull_aborts_when_scene_unmounts() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    rig.settle();

    rig.touch(TouchEvent::down(TouchTarget::Content));
    for ty in [11.0, 16.0, 66.0] {
        rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, ty));
    }
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Pulling);

    rig.unmount(0);
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Idle);
    assert!(!rig.container.store().is_dragging());

    rig.touch(TouchEvent::up(TouchTarget::Content, 0.0));
    rig.settle();
    rig.dispatch();
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Idle);
    assert_eq!(rig.container.store().refresh_drag_offset(), 80.0);
    assert_eq!(rig.start_refresh_calls(), 0);
}

/// Switching tabs mid-pull aborts the pull instead of leaving it open
#[test]
fn test_tab_switch_aborts_pull() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    rig.mount(1, true);
    rig.settle();

    rig.touch(TouchEvent::down(TouchTarget::Content));
    for ty in [11.0, 16.0, 136.0] {
        rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, ty));
    }
    assert!(rig.container.store().refresh_drag_offset() < 0.0);

    rig.container.set_current_index(1);
    assert_eq!(rig.container.refresh_phase(), RefreshPhase::Idle);
    assert!(!rig.container.store().is_dragging());

    rig.touch(TouchEvent::up(TouchTarget::Content, 0.0));
    rig.settle();
    rig.dispatch();
    assert_eq!(rig.container.store().refresh_drag_offset(), 80.0);
    assert_eq!(rig.start_refresh_calls(), 0);
}

#[test]
fn test_render_state_while_pulling() {
    let mut rig = Rig::new(Rig::default_config());
    rig.mount(0, true);
    rig.settle();

    rig.touch(TouchEvent::down(TouchTarget::Content));
    for ty in [11.0, 16.0, 66.0] {
        rig.touch(TouchEvent::moved(TouchTarget::Content, 0.0, ty));
    }
    let state = rig.container.render_state();
    assert_eq!(state.content_translate_y, 50.0);
    let control = state.refresh_control.unwrap();
    assert_eq!(control.pull, 50.0);
    assert_eq!(control.progress, 0.625);
    assert_eq!(control.phase, RefreshPhase::Pulling);

    rig.touch(TouchEvent::up(TouchTarget::Content, 0.0));
    rig.container.frame(FRAME);
}
