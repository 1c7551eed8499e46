use cadview_math::Viewport;
use cadview_scene::{Camera, Scene};
use tracing::{debug, trace};

/// Drawing backend driven by the viewer. Each stage reports success.
pub trait Renderer {
    fn viewport(&self) -> Option<Viewport>;
    fn set_viewport(&mut self, viewport: Viewport) -> bool;
    fn pre_render(&mut self, scene: &dyn Scene) -> bool;
    fn render_camera(&mut self, camera: &dyn Camera) -> bool;
    fn render_scene(&mut self, scene: &dyn Scene) -> bool;
    fn render_overlay(&mut self, _text: &str) -> bool {
        true
    }
    fn post_render(&mut self, scene: &dyn Scene) -> bool;
}

/// Renderer without a device: records frame statistics and logs each stage.
#[derive(Clone, Debug, Default)]
pub struct TraceRenderer {
    viewport: Option<Viewport>,
    frames: u64,
    last_overlay: Option<String>,
}

impl TraceRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Some(viewport),
            ..Self::default()
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_overlay(&self) -> Option<&str> {
        self.last_overlay.as_deref()
    }
}

impl Renderer for TraceRenderer {
    fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) -> bool {
        debug!(width = viewport.width, height = viewport.height, "viewport set");
        self.viewport = Some(viewport);
        true
    }

    fn pre_render(&mut self, _scene: &dyn Scene) -> bool {
        self.last_overlay = None;
        true
    }

    fn render_camera(&mut self, camera: &dyn Camera) -> bool {
        let eye = camera.modelview_matrix().translation_part();
        trace!(frame = self.frames, %eye, "camera");
        true
    }

    fn render_scene(&mut self, scene: &dyn Scene) -> bool {
        trace!(frame = self.frames, bounds = ?scene.bounding_box(), "scene");
        true
    }

    fn render_overlay(&mut self, text: &str) -> bool {
        self.last_overlay = Some(text.to_string());
        true
    }

    fn post_render(&mut self, _scene: &dyn Scene) -> bool {
        self.frames += 1;
        true
    }
}
