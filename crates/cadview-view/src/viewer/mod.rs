mod config;
mod controller;
mod input;
mod message;
mod renderer;

pub use config::{PickRay, ViewerConfig};
pub use controller::{InteractionMode, SharedCamera, SharedRenderer, SharedScene, Viewer};
pub use input::{
    ButtonMask, DragPhase, Dragger, InputEvent, KeyCode, KeyState, KeyTable, MaskFlag,
    WindowPoint,
};
pub use message::{MessageCallback, ModeMessage, ModeMessageId};
pub use renderer::{Renderer, TraceRenderer};
