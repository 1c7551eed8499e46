mod error;
pub mod viewer;

pub use error::{Result, ViewError};
pub use viewer::{
    ButtonMask, InputEvent, InteractionMode, KeyCode, ModeMessage, ModeMessageId, Renderer,
    Viewer, ViewerConfig,
};
