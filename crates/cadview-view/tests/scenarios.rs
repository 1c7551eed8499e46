mod common;

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use cadview_math::{Trackball, Vec2, Vec3};
use cadview_scene::{Camera, Node, SceneCamera};
use cadview_view::viewer::{
    ButtonMask, InputEvent, KeyCode, ModeMessageId, PickRay, TraceRenderer, Viewer, ViewerConfig,
};
use cadview_view::{Result, ViewError};
use common::{CameraCall, Fixture, StubScene};

const LEFT: ButtonMask = ButtonMask::LEFT;
const NONE: ButtonMask = ButtonMask::NONE;

#[test]
fn drag_with_rotate_mask_rotates_camera_once() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.button_down(100, 100, LEFT, LEFT)?;
    f.viewer.mouse_moved(100, 100, LEFT)?;
    assert!(f.camera.borrow().calls.is_empty());
    f.viewer.mouse_moved(150, 100, LEFT)?;

    assert_eq!(f.messages(), vec![ModeMessageId::Rotating]);
    let rotations = f.camera.borrow().rotations();
    assert_eq!(rotations.len(), 1);
    let expected = Trackball::default().rotation_matrix(Vec2::ZERO, Vec2::new(0.5, 0.0));
    assert!(rotations[0].approx_eq(&expected, 1.0e-12));
    assert_eq!(f.renderer.borrow().calls, ["pre", "camera", "scene", "post"]);
    Ok(())
}

#[test]
fn fast_release_starts_spin_and_tick_replays_rotation() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.button_down(0, 0, LEFT, LEFT)?;
    f.viewer.mouse_moved(0, 0, LEFT)?;
    f.viewer.mouse_moved(10, 10, LEFT)?;
    f.viewer.button_up(10, 10, LEFT, NONE)?;

    assert!(f.viewer.is_spinning());
    assert_eq!(
        f.messages(),
        vec![
            ModeMessageId::Rotating,
            ModeMessageId::SpinStart,
            ModeMessageId::Viewing
        ]
    );

    let frames = f.renderer.borrow().frames();
    assert!(f.viewer.spin_tick()?);
    assert_eq!(f.renderer.borrow().frames(), frames + 1);
    let rotations = f.camera.borrow().rotations();
    assert_eq!(rotations.len(), 2);
    assert_eq!(rotations[0], rotations[1]);
    assert_eq!(f.viewer.spin_rotation(), rotations[0]);

    f.clear();
    f.viewer.button_down(40, 40, LEFT, LEFT)?;
    assert!(!f.viewer.is_spinning());
    assert_eq!(f.messages(), vec![ModeMessageId::SpinFinish]);
    assert!(!f.viewer.spin_tick()?);
    Ok(())
}

#[test]
fn slow_release_does_not_spin() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.mouse_moved(50, 50, LEFT)?;
    f.viewer.mouse_moved(52, 48, LEFT)?;
    f.viewer.button_up(52, 48, LEFT, NONE)?;
    assert!(!f.viewer.is_spinning());
    assert_eq!(
        f.messages(),
        vec![ModeMessageId::Rotating, ModeMessageId::Viewing]
    );
    Ok(())
}

#[test]
fn release_of_other_button_does_not_spin() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.mouse_moved(0, 0, ButtonMask::RIGHT)?;
    f.viewer.mouse_moved(30, 30, ButtonMask::RIGHT)?;
    f.viewer.button_up(30, 30, ButtonMask::RIGHT, NONE)?;
    assert!(!f.viewer.is_spinning());
    Ok(())
}

#[test]
fn seek_miss_reports_once_and_leaves_seeking() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.key_down(KeyCode::from('s'))?;
    assert!(f.viewer.is_seeking());
    assert_eq!(f.messages(), vec![ModeMessageId::Seeking]);

    f.clear();
    f.viewer.button_down(50, 50, LEFT, LEFT)?;
    assert_eq!(
        f.messages(),
        vec![ModeMessageId::SeekMiss, ModeMessageId::Viewing]
    );
    assert!(!f.viewer.is_seeking());
    assert_eq!(f.scene.borrow().queries.borrow().len(), 1);
    assert!(f.camera.borrow().calls.is_empty());
    Ok(())
}

#[test]
fn seek_hit_recenters_and_renders() -> Result<()> {
    let target = Vec3::new(1.0, 2.0, -8.0);
    let mut f = Fixture::with(
        ViewerConfig::default(),
        200,
        200,
        StubScene::hitting(target),
    );
    f.viewer.key_down(KeyCode::from('s'))?;
    f.viewer.button_down(120, 80, LEFT, LEFT)?;

    assert_eq!(
        f.camera.borrow().calls,
        vec![CameraCall::SetCenter(target, false)]
    );
    assert_eq!(
        f.messages(),
        vec![
            ModeMessageId::Seeking,
            ModeMessageId::SeekHit,
            ModeMessageId::Viewing
        ]
    );
    assert_eq!(f.renderer.borrow().frames(), 1);
    Ok(())
}

#[test]
fn seek_needs_the_exact_seek_mask() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.key_down(KeyCode::from('s'))?;
    f.viewer.button_down(50, 50, ButtonMask::RIGHT, ButtonMask::RIGHT)?;
    assert!(f.viewer.is_seeking());
    assert!(f.scene.borrow().queries.borrow().is_empty());
    Ok(())
}

#[test]
fn seek_ray_points_through_the_clicked_pixel() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.key_down(KeyCode::from('s'))?;
    f.viewer.button_down(100, 100, LEFT, LEFT)?;
    let queries = f.scene.borrow().queries.borrow().clone();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].direction.approx_eq(-Vec3::Z, 1.0e-12));
    assert_relative_eq!(queries[0].origin.z, -0.1);
    Ok(())
}

#[test]
fn degenerate_resize_is_ignored() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.resize(0, 0)?;
    f.viewer.resize(-5, 10)?;
    f.viewer.resize(10, 0)?;
    assert!(f.renderer.borrow().calls.is_empty());
    assert!(f.camera.borrow().calls.is_empty());

    f.viewer.resize(320, 240)?;
    assert_eq!(f.renderer.borrow().calls, ["viewport"]);
    assert_eq!(
        f.renderer.borrow().viewport,
        Some(cadview_math::Viewport::sized(320, 240))
    );
    assert_eq!(
        f.camera.borrow().calls,
        vec![CameraCall::AspectRatio(320, 240)]
    );
    Ok(())
}

#[test]
fn singular_projection_fails_the_seek() {
    let config = ViewerConfig {
        pick_ray: PickRay::Unproject,
        ..ViewerConfig::default()
    };
    let mut f = Fixture::with(config, 200, 200, StubScene::default());
    f.camera.borrow_mut().singular_projection = true;
    assert!(f.viewer.key_down(KeyCode::from('s')).is_ok());

    let result = f.viewer.button_down(10, 10, LEFT, LEFT);
    assert!(matches!(result, Err(ViewError::DegenerateRay { x: 10, y: 10 })));
    assert!(f.viewer.is_seeking());
    assert!(f.scene.borrow().queries.borrow().is_empty());
}

#[test]
fn unprojected_seek_ray_matches_window_ray_direction() -> Result<()> {
    let config = ViewerConfig {
        pick_ray: PickRay::Unproject,
        ..ViewerConfig::default()
    };
    let mut f = Fixture::with(config, 200, 200, StubScene::default());
    f.viewer.key_down(KeyCode::from('s'))?;
    f.viewer.button_down(100, 100, LEFT, LEFT)?;
    let queries = f.scene.borrow().queries.borrow().clone();
    assert!(queries[0].direction.approx_eq(-Vec3::Z, 1.0e-2));
    Ok(())
}

#[test]
fn scale_drag_uses_vertical_motion() -> Result<()> {
    let both = ButtonMask::LEFT | ButtonMask::RIGHT;
    let mut f = Fixture::new(200, 200);
    f.viewer.mouse_moved(0, 0, both)?;
    f.viewer.mouse_moved(5, 20, both)?;
    assert_eq!(f.messages(), vec![ModeMessageId::Scaling]);
    let calls = f.camera.borrow().calls.clone();
    assert_eq!(calls.len(), 1);
    let CameraCall::Scale(factor) = calls[0] else {
        panic!("expected a scale call, got {calls:?}");
    };
    assert_relative_eq!(factor, 1.1);
    Ok(())
}

#[test]
fn translate_drag_uses_perspective_factor() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.mouse_moved(100, 100, ButtonMask::RIGHT)?;
    f.viewer.mouse_moved(110, 90, ButtonMask::RIGHT)?;
    assert_eq!(f.messages(), vec![ModeMessageId::Translating]);

    let fov_x = f.camera.borrow().fov_x().unwrap_or_default();
    let factor = (fov_x.cos() / 200.0).abs();
    let calls = f.camera.borrow().calls.clone();
    let CameraCall::Translate(offset) = calls[0] else {
        panic!("expected a translate call, got {calls:?}");
    };
    assert!(offset.approx_eq(Vec3::new(10.0 * factor, 10.0 * factor, 0.0), 1.0e-12));
    Ok(())
}

#[test]
fn translate_drag_uses_fixed_factor_without_fov() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.camera.borrow_mut().projection = cadview_scene::Projection::Orthographic { height: 4.0 };
    f.viewer.mouse_moved(100, 100, ButtonMask::RIGHT)?;
    f.viewer.mouse_moved(120, 100, ButtonMask::RIGHT)?;
    let calls = f.camera.borrow().calls.clone();
    assert_eq!(calls.len(), 1);
    let CameraCall::Translate(offset) = calls[0] else {
        panic!("expected a translate call, got {calls:?}");
    };
    assert!(offset.approx_eq(Vec3::new(0.2, 0.0, 0.0), 1.0e-12));
    Ok(())
}

#[test]
fn extreme_coordinates_do_not_overflow() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.mouse_moved(i32::MIN + 1, 0, LEFT)?;
    f.viewer.mouse_moved(i32::MAX, 0, LEFT)?;
    f.viewer.button_up(0, 0, LEFT, NONE)?;
    assert!(f.viewer.is_spinning());
    f.viewer.stop_motion()?;

    f.clear();
    f.viewer.reset_pointer();
    f.viewer.mouse_moved(i32::MAX, i32::MIN, ButtonMask::RIGHT)?;
    f.viewer.mouse_moved(i32::MIN, i32::MAX, ButtonMask::RIGHT)?;
    let both = ButtonMask::LEFT | ButtonMask::RIGHT;
    f.viewer.mouse_moved(0, i32::MIN, both)?;
    f.viewer.mouse_moved(0, i32::MAX, both)?;

    let calls = f.camera.borrow().calls.clone();
    assert_eq!(calls.len(), 3);
    let CameraCall::Translate(offset) = calls[0] else {
        panic!("expected a translate call, got {calls:?}");
    };
    assert!(offset.is_finite());
    assert!(offset.x < 0.0 && offset.y < 0.0);
    let (&CameraCall::Scale(shrink), &CameraCall::Scale(grow)) = (&calls[1], &calls[2]) else {
        panic!("expected two scale calls, got {calls:?}");
    };
    assert!(shrink.is_finite() && shrink < 1.0);
    assert!(grow.is_finite() && grow > 1.0);
    Ok(())
}

#[test]
fn unmatched_mask_is_ignored() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    let shifted = ButtonMask::LEFT | ButtonMask::SHIFT;
    f.viewer.mouse_moved(0, 0, shifted)?;
    f.viewer.mouse_moved(40, 40, shifted)?;
    assert!(f.messages().is_empty());
    assert!(f.camera.borrow().calls.is_empty());
    assert!(f.renderer.borrow().calls.is_empty());
    Ok(())
}

#[test]
fn rejected_message_aborts_the_drag() {
    let mut f = Fixture::new(200, 200);
    f.reject(ModeMessageId::Rotating);
    assert!(f.viewer.mouse_moved(0, 0, LEFT).is_ok());
    let result = f.viewer.mouse_moved(30, 0, LEFT);
    assert!(matches!(
        result,
        Err(ViewError::Rejected(ModeMessageId::Rotating))
    ));
    assert!(f.camera.borrow().calls.is_empty());
    assert_eq!(f.renderer.borrow().frames(), 0);
}

#[test]
fn rejected_spin_finish_keeps_spinning() -> Result<()> {
    let mut f = Fixture::new(200, 200);
    f.viewer.mouse_moved(0, 0, LEFT)?;
    f.viewer.mouse_moved(20, 0, LEFT)?;
    f.viewer.button_up(20, 0, LEFT, NONE)?;
    assert!(f.viewer.is_spinning());

    f.reject(ModeMessageId::SpinFinish);
    assert!(f.viewer.button_down(0, 0, LEFT, LEFT).is_err());
    assert!(f.viewer.is_spinning());
    Ok(())
}

#[test]
fn render_stage_failure_surfaces() {
    let mut f = Fixture::new(200, 200);
    f.renderer.borrow_mut().fail_stage = Some("scene");
    assert!(f.viewer.mouse_moved(0, 0, LEFT).is_ok());
    let result = f.viewer.mouse_moved(10, 0, LEFT);
    assert!(matches!(result, Err(ViewError::RenderFailed("scene"))));
}

#[test]
fn event_script_replays_through_the_viewer() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let script = r#"[
        { "event": "resize", "width": 200, "height": 200 },
        { "event": "button_down", "x": 100, "y": 100, "button": ["left"], "buttons": ["left"] },
        { "event": "mouse_moved", "x": 100, "y": 100, "buttons": ["left"] },
        { "event": "mouse_moved", "x": 150, "y": 100, "buttons": ["left"] },
        { "event": "button_up", "x": 150, "y": 100, "button": ["left"] },
        { "event": "spin_tick" },
        { "event": "stop_motion" },
        { "event": "key_down", "key": "v" },
        { "event": "key_up", "key": 118 }
    ]"#;
    let events: Vec<InputEvent> = serde_json::from_str(script)?;
    let mut f = Fixture::new(100, 100);
    for event in &events {
        f.viewer.handle_event(event)?;
    }
    assert_eq!(
        f.messages(),
        vec![
            ModeMessageId::Rotating,
            ModeMessageId::SpinStart,
            ModeMessageId::Viewing,
            ModeMessageId::SpinFinish,
            ModeMessageId::Picking
        ]
    );
    assert_eq!(f.camera.borrow().rotations().len(), 2);
    assert!(!f.viewer.is_spinning());
    assert!(f.viewer.is_picking());
    Ok(())
}

#[test]
fn seek_with_scene_camera_centers_the_hit() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let camera = Rc::new(RefCell::new(SceneCamera::default()));
    let renderer = Rc::new(RefCell::new(TraceRenderer::default()));
    let scene = Node::group(vec![Node::sphere(Vec3::new(0.5, 0.0, 0.0), 1.0)?]);

    let mut viewer = Viewer::new(ViewerConfig::default())?;
    viewer.set_camera(camera.clone());
    viewer.set_renderer(renderer.clone());
    viewer.set_scene(Rc::new(RefCell::new(scene)));
    viewer.resize(200, 200)?;

    viewer.key_down(KeyCode::from('s'))?;
    viewer.button_down(100, 100, LEFT, LEFT)?;
    assert!(!viewer.is_seeking());
    let center = camera.borrow().center();
    assert_relative_eq!(center.x, 0.0, epsilon = 1.0e-9);
    assert!(center.z > 0.0);
    assert_eq!(renderer.borrow().frames(), 1);

    let hit = viewer.pick(100, 100);
    assert!(hit.is_some());
    Ok(())
}
