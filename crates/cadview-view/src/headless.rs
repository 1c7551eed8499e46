use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use cadview_math::Vec3;
use cadview_scene::{Camera, Material, Node, SceneCamera};
use cadview_view::viewer::{InputEvent, ModeMessageId, TraceRenderer, Viewer, ViewerConfig};
use tracing::info;

use crate::cli::{HeadlessCommand, SessionArgs};

pub fn run_headless(command: HeadlessCommand) -> Result<()> {
    match command {
        HeadlessCommand::Replay(args) => {
            let text = std::fs::read_to_string(&args.script)
                .with_context(|| format!("failed to read {}", args.script.display()))?;
            let events: Vec<InputEvent> =
                serde_json::from_str(&text).context("invalid event script")?;
            let mut session = Session::open(&args.session)?;
            for (index, event) in events.iter().enumerate() {
                session
                    .viewer
                    .handle_event(event)
                    .with_context(|| format!("event {index} ({event:?}) failed"))?;
            }
            info!(path = %args.script.display(), events = events.len(), "replay complete");
            session.report();
            Ok(())
        }
        HeadlessCommand::Pick(args) => {
            let session = Session::open(&args.session)?;
            match session.viewer.pick(args.x, args.y) {
                Some(hit) => println!(
                    "hit {} at {} (local {})",
                    hit.path, hit.global, hit.local
                ),
                None => println!("miss"),
            }
            Ok(())
        }
        HeadlessCommand::Config(args) => {
            ViewerConfig::default()
                .save(&args.out)
                .context("failed to write config")?;
            info!(path = %args.out.display(), "config written");
            Ok(())
        }
    }
}

struct Session {
    viewer: Viewer,
    camera: Rc<RefCell<SceneCamera>>,
    renderer: Rc<RefCell<TraceRenderer>>,
    messages: Rc<RefCell<Vec<ModeMessageId>>>,
}

impl Session {
    fn open(args: &SessionArgs) -> Result<Self> {
        if args.width <= 0 || args.height <= 0 {
            bail!("--width and --height must be > 0");
        }
        let config = match &args.config {
            Some(path) => ViewerConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ViewerConfig::default(),
        };
        let scene = match &args.scene {
            Some(path) => load_scene(path)?,
            None => demo_scene()?,
        };

        let camera = Rc::new(RefCell::new(SceneCamera::default()));
        let renderer = Rc::new(RefCell::new(TraceRenderer::default()));
        let messages = Rc::new(RefCell::new(Vec::new()));

        let mut viewer = Viewer::new(config)?;
        viewer.set_camera(camera.clone());
        viewer.set_renderer(renderer.clone());
        viewer.set_scene(Rc::new(RefCell::new(scene)));
        let log = messages.clone();
        viewer.set_callback(move |message| {
            info!(id = ?message.id, text = message.text, "mode message");
            log.borrow_mut().push(message.id);
            true
        });
        viewer.resize(args.width, args.height)?;
        if !viewer.view_all() {
            bail!("scene has no bounds to frame");
        }
        Ok(Self {
            viewer,
            camera,
            renderer,
            messages,
        })
    }

    fn report(&self) {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for id in self.messages.borrow().iter() {
            *counts.entry(format!("{id:?}")).or_default() += 1;
        }
        println!("frames rendered: {}", self.renderer.borrow().frames());
        println!("mode: {:?}", self.viewer.current_mode_message());
        println!("spinning: {}", self.viewer.is_spinning());
        for (id, count) in counts {
            println!("message {id}: {count}");
        }
        println!("modelview:");
        print!("{}", self.camera.borrow().modelview_matrix());
    }
}

fn load_scene(path: &Path) -> Result<Node> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let scene: Node = serde_json::from_str(&text).context("invalid scene file")?;
    scene.validate().context("invalid scene geometry")?;
    Ok(scene)
}

fn demo_scene() -> Result<Node> {
    Ok(Node::group(vec![
        Node::material(Material::default()),
        Node::sphere(Vec3::ZERO, 1.0)?,
        Node::translation(Vec3::new(3.0, 0.0, 0.0)),
        Node::material(Material {
            diffuse: [0.2, 0.4, 0.9],
            transparency: 0.0,
        }),
        Node::cube(Vec3::ZERO, 1.5)?,
    ]))
}
