#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use cadview_math::{BoundingBox, Matrix4, Ray, Vec3, Viewport};
use cadview_scene::{Camera, Intersection, NodePath, Projection, Scene};
use cadview_view::viewer::{ModeMessageId, Renderer, Viewer, ViewerConfig};

#[derive(Clone, Debug, PartialEq)]
pub enum CameraCall {
    Scale(f64),
    Rotate(Matrix4),
    Translate(Vec3),
    AspectRatio(i32, i32),
    SetCenter(Vec3, bool),
    ViewAll,
}

pub struct RecordingCamera {
    pub calls: Vec<CameraCall>,
    pub projection: Projection,
    pub singular_projection: bool,
    pub scale: f64,
}

impl Default for RecordingCamera {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            projection: Projection::Perspective {
                fov_y: 45f64.to_radians(),
            },
            singular_projection: false,
            scale: 1.0,
        }
    }
}

impl RecordingCamera {
    pub fn rotations(&self) -> Vec<Matrix4> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                CameraCall::Rotate(m) => Some(*m),
                _ => None,
            })
            .collect()
    }
}

impl Camera for RecordingCamera {
    fn projection(&self) -> Projection {
        self.projection
    }

    fn z_near(&self) -> f64 {
        0.1
    }

    fn z_far(&self) -> f64 {
        100.0
    }

    fn aspect_ratio(&self) -> f64 {
        1.0
    }

    fn set_aspect_ratio(&mut self, width: i32, height: i32) {
        self.calls.push(CameraCall::AspectRatio(width, height));
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }

    fn scale(&mut self, factor: f64) {
        self.calls.push(CameraCall::Scale(factor));
    }

    fn rotate(&mut self, rotation: &Matrix4) {
        self.calls.push(CameraCall::Rotate(*rotation));
    }

    fn translate(&mut self, offset: Vec3) {
        self.calls.push(CameraCall::Translate(offset));
    }

    fn set_center(&mut self, point: Vec3, preserve_view: bool) -> bool {
        self.calls.push(CameraCall::SetCenter(point, preserve_view));
        true
    }

    fn view_all(&mut self, _scene: &dyn Scene) -> bool {
        self.calls.push(CameraCall::ViewAll);
        true
    }

    fn modelview_matrix(&self) -> Matrix4 {
        Matrix4::translation(Vec3::new(0.0, 0.0, -10.0))
    }

    fn projection_matrix(&self) -> Matrix4 {
        if self.singular_projection {
            Matrix4::ZERO
        } else {
            Matrix4::perspective(45f64.to_radians(), 1.0, 0.1, 100.0)
        }
    }
}

pub struct RecordingRenderer {
    pub viewport: Option<Viewport>,
    pub calls: Vec<String>,
    pub fail_stage: Option<&'static str>,
}

impl RecordingRenderer {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            viewport: Some(Viewport::sized(width, height)),
            calls: Vec::new(),
            fail_stage: None,
        }
    }

    fn record(&mut self, stage: &'static str) -> bool {
        self.calls.push(stage.to_string());
        self.fail_stage != Some(stage)
    }

    pub fn frames(&self) -> usize {
        self.calls.iter().filter(|c| c.as_str() == "post").count()
    }
}

impl Renderer for RecordingRenderer {
    fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) -> bool {
        self.viewport = Some(viewport);
        self.record("viewport")
    }

    fn pre_render(&mut self, _scene: &dyn Scene) -> bool {
        self.record("pre")
    }

    fn render_camera(&mut self, _camera: &dyn Camera) -> bool {
        self.record("camera")
    }

    fn render_scene(&mut self, _scene: &dyn Scene) -> bool {
        self.record("scene")
    }

    fn render_overlay(&mut self, text: &str) -> bool {
        self.calls.push(format!("overlay:{text}"));
        true
    }

    fn post_render(&mut self, _scene: &dyn Scene) -> bool {
        self.record("post")
    }
}

#[derive(Default)]
pub struct StubScene {
    pub hit: Option<Intersection>,
    pub queries: RefCell<Vec<Ray>>,
}

impl StubScene {
    pub fn hitting(global: Vec3) -> Self {
        Self {
            hit: Some(Intersection {
                path: NodePath::new(vec![0]),
                global,
                local: Vec3::ZERO,
            }),
            queries: RefCell::new(Vec::new()),
        }
    }
}

impl Scene for StubScene {
    fn intersect(&self, ray: &Ray, _modelview: &Matrix4) -> Option<Intersection> {
        self.queries.borrow_mut().push(*ray);
        self.hit.clone()
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        Some(BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0)))
    }
}

pub struct Fixture {
    pub viewer: Viewer,
    pub camera: Rc<RefCell<RecordingCamera>>,
    pub renderer: Rc<RefCell<RecordingRenderer>>,
    pub scene: Rc<RefCell<StubScene>>,
    pub messages: Rc<RefCell<Vec<ModeMessageId>>>,
}

impl Fixture {
    pub fn new(width: i32, height: i32) -> Self {
        Self::with(ViewerConfig::default(), width, height, StubScene::default())
    }

    pub fn with(config: ViewerConfig, width: i32, height: i32, scene: StubScene) -> Self {
        let camera = Rc::new(RefCell::new(RecordingCamera::default()));
        let renderer = Rc::new(RefCell::new(RecordingRenderer::new(width, height)));
        let scene = Rc::new(RefCell::new(scene));
        let messages = Rc::new(RefCell::new(Vec::new()));

        let mut viewer = Viewer::new(config).expect("valid config");
        viewer.set_camera(camera.clone());
        viewer.set_renderer(renderer.clone());
        viewer.set_scene(scene.clone());
        let log = messages.clone();
        viewer.set_callback(move |message| {
            log.borrow_mut().push(message.id);
            true
        });
        Self {
            viewer,
            camera,
            renderer,
            scene,
            messages,
        }
    }

    /// Replaces the callback with one that rejects `rejected`.
    pub fn reject(&mut self, rejected: ModeMessageId) {
        let log = self.messages.clone();
        self.viewer.set_callback(move |message| {
            log.borrow_mut().push(message.id);
            message.id != rejected
        });
    }

    pub fn messages(&self) -> Vec<ModeMessageId> {
        self.messages.borrow().clone()
    }

    pub fn clear(&self) {
        self.messages.borrow_mut().clear();
        self.camera.borrow_mut().calls.clear();
        self.renderer.borrow_mut().calls.clear();
    }
}
