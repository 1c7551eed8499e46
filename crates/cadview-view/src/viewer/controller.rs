use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use cadview_base::InstanceId;
use cadview_math::{
    Matrix4, Ray, Trackball, Vec3, Viewport, orthographic_ray, perspective_ray, unprojected_ray,
};
use cadview_scene::{Camera, Intersection, Projection, Scene};
use tracing::{debug, trace, warn};

use super::config::{PickRay, ViewerConfig};
use super::input::{
    ButtonMask, DragPhase, Dragger, InputEvent, KeyCode, KeyState, KeyTable, WindowPoint,
};
use super::message::{MessageCallback, ModeMessage, ModeMessageId};
use super::renderer::Renderer;
use crate::error::{Result, ViewError};

pub type SharedCamera = Rc<RefCell<dyn Camera>>;
pub type SharedRenderer = Rc<RefCell<dyn Renderer>>;
pub type SharedScene = Rc<RefCell<dyn Scene>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionMode {
    /// Drags move the camera.
    Viewing,
    /// Drags go to the dragger.
    Picking,
}

#[derive(Clone, Copy, Debug)]
struct PointerHistory {
    current: WindowPoint,
    previous: WindowPoint,
    first_move: bool,
}

impl Default for PointerHistory {
    fn default() -> Self {
        Self {
            current: WindowPoint::default(),
            previous: WindowPoint::default(),
            first_move: true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct SpinState {
    active: bool,
    rotation: Matrix4,
}

impl Default for SpinState {
    fn default() -> Self {
        Self {
            active: false,
            rotation: Matrix4::IDENTITY,
        }
    }
}

/// Interactive viewport controller: turns pointer and key input into camera
/// motion, seeking and spinning, and reports mode changes to the host.
pub struct Viewer {
    id: InstanceId,
    config: ViewerConfig,
    trackball: Trackball,
    camera: Option<SharedCamera>,
    renderer: Option<SharedRenderer>,
    scene: Option<SharedScene>,
    callback: Option<MessageCallback>,
    dragger: Option<Box<dyn Dragger>>,
    mode: InteractionMode,
    seeking: bool,
    show_modelview: bool,
    pointer: PointerHistory,
    spin: SpinState,
    keys: KeyTable,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::with_valid_config(ViewerConfig::default())
    }
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: ViewerConfig) -> Self {
        let mode = if config.start_viewing {
            InteractionMode::Viewing
        } else {
            InteractionMode::Picking
        };
        Self {
            id: InstanceId::new(),
            trackball: Trackball::new(config.trackball_radius),
            config,
            camera: None,
            renderer: None,
            scene: None,
            callback: None,
            dragger: None,
            mode,
            seeking: false,
            show_modelview: false,
            pointer: PointerHistory::default(),
            spin: SpinState::default(),
            keys: KeyTable::default(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn set_camera(&mut self, camera: SharedCamera) {
        self.camera = Some(camera);
    }

    pub fn detach_camera(&mut self) -> Option<SharedCamera> {
        self.camera.take()
    }

    pub fn camera(&self) -> Option<&SharedCamera> {
        self.camera.as_ref()
    }

    pub fn set_renderer(&mut self, renderer: SharedRenderer) {
        self.renderer = Some(renderer);
    }

    pub fn detach_renderer(&mut self) -> Option<SharedRenderer> {
        self.renderer.take()
    }

    pub fn renderer(&self) -> Option<&SharedRenderer> {
        self.renderer.as_ref()
    }

    pub fn set_scene(&mut self, scene: SharedScene) {
        self.scene = Some(scene);
    }

    pub fn detach_scene(&mut self) -> Option<SharedScene> {
        self.scene.take()
    }

    pub fn scene(&self) -> Option<&SharedScene> {
        self.scene.as_ref()
    }

    pub fn set_callback(&mut self, callback: impl FnMut(&ModeMessage) -> bool + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    pub fn set_dragger(&mut self, dragger: Box<dyn Dragger>) {
        self.dragger = Some(dragger);
    }

    pub fn clear_dragger(&mut self) {
        self.dragger = None;
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        if self.mode != mode {
            debug!(?mode, "interaction mode changed");
        }
        self.mode = mode;
    }

    pub fn is_viewing(&self) -> bool {
        self.mode == InteractionMode::Viewing
    }

    pub fn is_picking(&self) -> bool {
        self.mode == InteractionMode::Picking
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn set_seeking(&mut self, seeking: bool) {
        self.seeking = seeking;
    }

    pub fn is_spinning(&self) -> bool {
        self.spin.active
    }

    pub fn shows_modelview(&self) -> bool {
        self.show_modelview
    }

    pub fn set_show_modelview(&mut self, show: bool) {
        self.show_modelview = show;
    }

    /// Incremental rotation replayed on every spin tick.
    pub fn spin_rotation(&self) -> Matrix4 {
        self.spin.rotation
    }

    pub fn spin_interval(&self) -> Duration {
        self.config.spin_interval()
    }

    /// `(current, previous)` pointer positions.
    pub fn pointer(&self) -> (WindowPoint, WindowPoint) {
        (self.pointer.current, self.pointer.previous)
    }

    /// Treats the next move as a fresh entry into the window.
    pub fn reset_pointer(&mut self) {
        self.pointer.first_move = true;
    }

    pub fn key_state(&self, key: KeyCode) -> KeyState {
        self.keys.state(key)
    }

    /// Message id describing the current mode; seeking takes precedence.
    pub fn current_mode_message(&self) -> ModeMessageId {
        if self.seeking {
            ModeMessageId::Seeking
        } else if self.is_viewing() {
            ModeMessageId::Viewing
        } else {
            ModeMessageId::Picking
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> Result<()> {
        match *event {
            InputEvent::MouseMoved { x, y, buttons } => self.mouse_moved(x, y, buttons),
            InputEvent::ButtonDown {
                x,
                y,
                button,
                buttons,
            } => self.button_down(x, y, button, buttons),
            InputEvent::ButtonUp {
                x,
                y,
                button,
                buttons,
            } => self.button_up(x, y, button, buttons),
            InputEvent::KeyDown { key } => self.key_down(key),
            InputEvent::KeyUp { key } => {
                self.key_up(key);
                Ok(())
            }
            InputEvent::Resize { width, height } => self.resize(width, height),
            InputEvent::SpinTick => self.spin_tick().map(|_| ()),
            InputEvent::ViewAll => {
                if !self.view_all() {
                    debug!("view all skipped");
                }
                Ok(())
            }
            InputEvent::StopMotion => self.stop_motion(),
            InputEvent::PointerReset => {
                self.reset_pointer();
                Ok(())
            }
        }
    }

    pub fn mouse_moved(&mut self, x: i32, y: i32, buttons: ButtonMask) -> Result<()> {
        let point = WindowPoint::new(x, y);
        if self.pointer.first_move {
            self.pointer.current = point;
            self.pointer.first_move = false;
        }
        self.pointer.previous = self.pointer.current;
        self.pointer.current = point;
        if self.pointer.previous == self.pointer.current {
            return Ok(());
        }
        if self.renderer.is_none() || self.scene.is_none() {
            return Ok(());
        }
        if self.is_viewing() {
            if self.camera.is_some() {
                return self.process_viewing(buttons);
            }
        } else if let Some(dragger) = self.dragger.as_mut() {
            dragger.drag(DragPhase::Move, point, buttons);
        }
        Ok(())
    }

    pub fn button_down(
        &mut self,
        x: i32,
        y: i32,
        button: ButtonMask,
        buttons: ButtonMask,
    ) -> Result<()> {
        trace!(x, y, %button, %buttons, "button down");
        if self.spin.active {
            self.send(ModeMessageId::SpinFinish)?;
            self.spin.active = false;
        }
        let collaborators = self.renderer.is_some() && self.camera.is_some() && self.scene.is_some();
        if self.seeking && buttons == self.config.seek_buttons && collaborators {
            self.process_seek(x, y)?;
            self.seeking = false;
            return self.send(self.current_mode_message());
        }
        if self.is_picking() {
            if let Some(dragger) = self.dragger.as_mut() {
                dragger.drag(DragPhase::Start, WindowPoint::new(x, y), buttons);
            }
        }
        Ok(())
    }

    pub fn button_up(
        &mut self,
        x: i32,
        y: i32,
        button: ButtonMask,
        buttons: ButtonMask,
    ) -> Result<()> {
        trace!(x, y, %button, %buttons, "button up");
        if self.is_viewing() && button == self.config.rotate_buttons {
            let (current, previous) = (self.pointer.current, self.pointer.previous);
            let dx = current.x.abs_diff(previous.x);
            let dy = current.y.abs_diff(previous.y);
            let tolerance = self.config.spin_tolerance.unsigned_abs();
            if dx > tolerance || dy > tolerance {
                self.spin.active = true;
                self.send(ModeMessageId::SpinStart)?;
            }
        }
        if self.is_picking() {
            if let Some(dragger) = self.dragger.as_mut() {
                dragger.drag(DragPhase::Finish, WindowPoint::new(x, y), buttons);
            }
        }
        if buttons.is_empty() {
            self.send(self.current_mode_message())?;
        }
        Ok(())
    }

    pub fn key_down(&mut self, key: KeyCode) -> Result<()> {
        self.keys.press(key);
        if key == self.config.viewing_key {
            self.seeking = false;
            let mode = if self.is_viewing() {
                InteractionMode::Picking
            } else {
                InteractionMode::Viewing
            };
            self.set_mode(mode);
            self.send(self.current_mode_message())?;
        } else if key == self.config.seeking_key {
            self.seeking = !self.seeking;
            debug!(seeking = self.seeking, "seeking toggled");
            self.send(self.current_mode_message())?;
        } else if key == self.config.modelview_key {
            self.show_modelview = !self.show_modelview;
            self.send(self.current_mode_message())?;
            self.render()?;
        }
        Ok(())
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.keys.release(key);
    }

    /// Non-positive sizes are ignored.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<()> {
        if width <= 0 || height <= 0 {
            debug!(width, height, "ignoring degenerate resize");
            return Ok(());
        }
        if let Some(renderer) = &self.renderer {
            if !renderer.borrow_mut().set_viewport(Viewport::sized(width, height)) {
                return Err(ViewError::ViewportRejected);
            }
        }
        if let Some(camera) = &self.camera {
            camera.borrow_mut().set_aspect_ratio(width, height);
        }
        Ok(())
    }

    /// Draws one frame. `Ok(false)` when there is no renderer or scene.
    pub fn render(&mut self) -> Result<bool> {
        let (Some(renderer), Some(scene)) = (&self.renderer, &self.scene) else {
            return Ok(false);
        };
        let mut renderer = renderer.borrow_mut();
        let scene = scene.borrow();
        stage(renderer.pre_render(&*scene), "pre-render")?;
        if let Some(camera) = &self.camera {
            stage(renderer.render_camera(&*camera.borrow()), "camera")?;
        }
        stage(renderer.render_scene(&*scene), "scene")?;
        if self.show_modelview {
            if let Some(camera) = &self.camera {
                let text = camera.borrow().modelview_matrix().to_string();
                stage(renderer.render_overlay(&text), "overlay")?;
            }
        }
        stage(renderer.post_render(&*scene), "post-render")?;
        Ok(true)
    }

    pub fn view_all(&mut self) -> bool {
        let (Some(camera), Some(scene)) = (&self.camera, &self.scene) else {
            return false;
        };
        camera.borrow_mut().view_all(&*scene.borrow())
    }

    /// Replays the last drag rotation while spinning and redraws the frame, so hosts
    /// must not render again on a tick. Returns whether the camera moved.
    pub fn spin_tick(&mut self) -> Result<bool> {
        if !self.spin.active {
            return Ok(false);
        }
        let Some(camera) = &self.camera else {
            return Ok(false);
        };
        camera.borrow_mut().rotate(&self.spin.rotation);
        trace!("spin tick");
        self.render()?;
        Ok(true)
    }

    pub fn stop_motion(&mut self) -> Result<()> {
        if self.spin.active {
            self.send(ModeMessageId::SpinFinish)?;
            self.spin.active = false;
        }
        Ok(())
    }

    /// Eye-space ray through a window point.
    pub fn ray(&self, x: i32, y: i32) -> Option<Ray> {
        let viewport = self.viewport()?;
        let camera = self.camera.as_ref()?.borrow();
        match self.config.pick_ray {
            PickRay::Window => match camera.projection() {
                Projection::Perspective { fov_y } => {
                    perspective_ray(x, y, &viewport, fov_y, camera.z_near())
                }
                Projection::Orthographic { height } => {
                    orthographic_ray(x, y, &viewport, height, camera.z_near())
                }
            },
            PickRay::Unproject => unprojected_ray(
                x,
                y,
                &Matrix4::IDENTITY,
                &camera.projection_matrix(),
                &viewport,
            ),
        }
    }

    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let modelview = self.camera.as_ref()?.borrow().modelview_matrix();
        self.scene.as_ref()?.borrow().intersect(ray, &modelview)
    }

    pub fn pick(&self, x: i32, y: i32) -> Option<Intersection> {
        self.ray(x, y).and_then(|ray| self.intersect(&ray))
    }

    fn viewport(&self) -> Option<Viewport> {
        self.renderer.as_ref()?.borrow().viewport()
    }

    fn send(&mut self, id: ModeMessageId) -> Result<()> {
        let message = ModeMessage::new(id, self.id);
        debug!(id = ?id, sender = %self.id, "mode message");
        let Some(callback) = self.callback.as_mut() else {
            return Ok(());
        };
        if callback(&message) {
            Ok(())
        } else {
            debug!(id = ?id, "mode message rejected");
            Err(ViewError::Rejected(id))
        }
    }

    fn process_seek(&mut self, x: i32, y: i32) -> Result<()> {
        let Some(ray) = self.ray(x, y) else {
            warn!(x, y, "cannot form seek ray");
            return Err(ViewError::DegenerateRay { x, y });
        };
        let Some(hit) = self.intersect(&ray) else {
            return self.send(ModeMessageId::SeekMiss);
        };
        debug!(path = %hit.path, point = %hit.global, "seek hit");
        if let Some(camera) = &self.camera {
            if !camera.borrow_mut().set_center(hit.global, false) {
                return Err(ViewError::CenterRejected);
            }
        }
        self.send(ModeMessageId::SeekHit)?;
        self.render()?;
        Ok(())
    }

    fn process_viewing(&mut self, buttons: ButtonMask) -> Result<()> {
        let (Some(camera), Some(viewport)) = (self.camera.clone(), self.viewport()) else {
            return Ok(());
        };
        if viewport.is_empty() {
            return Ok(());
        }
        let previous = self.pointer.previous;
        let current = self.pointer.current;
        if buttons == self.config.scale_buttons {
            self.send(ModeMessageId::Scaling)?;
            let dy = f64::from(current.y) - f64::from(previous.y);
            let factor = 1.0 + dy / f64::from(viewport.height);
            trace!(factor, "scale");
            camera.borrow_mut().scale(factor);
        } else if buttons == self.config.rotate_buttons {
            self.send(ModeMessageId::Rotating)?;
            let (Some(from), Some(to)) = (
                viewport.normalized_point(previous.x, previous.y),
                viewport.normalized_point(current.x, current.y),
            ) else {
                return Ok(());
            };
            let rotation = self.trackball.rotation_matrix(from, to);
            trace!(?from, ?to, "rotate");
            self.spin.rotation = rotation;
            camera.borrow_mut().rotate(&rotation);
        } else if buttons == self.config.translate_buttons {
            self.send(ModeMessageId::Translating)?;
            let factor = self.translate_factor(&*camera.borrow(), &viewport);
            let offset = Vec3::new(
                factor * (f64::from(current.x) - f64::from(previous.x)),
                factor * (f64::from(previous.y) - f64::from(current.y)),
                0.0,
            );
            trace!(%offset, "translate");
            camera.borrow_mut().translate(offset);
        } else {
            return Ok(());
        }
        self.render()?;
        Ok(())
    }

    fn translate_factor(&self, camera: &dyn Camera, viewport: &Viewport) -> f64 {
        let Some(fov_x) = camera.fov_x() else {
            return self.config.translate_factor;
        };
        let factor = (fov_x.cos() * camera.aspect_ratio()
            / (f64::from(viewport.width) * camera.scale_factor()))
        .abs();
        if factor.is_finite() {
            factor
        } else {
            self.config.translate_factor
        }
    }
}

fn stage(ok: bool, name: &'static str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        warn!(stage = name, "render stage failed");
        Err(ViewError::RenderFailed(name))
    }
}
