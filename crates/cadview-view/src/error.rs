use thiserror::Error;

use crate::viewer::ModeMessageId;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("message rejected by host: {0:?}")]
    Rejected(ModeMessageId),
    #[error("renderer failed during {0}")]
    RenderFailed(&'static str),
    #[error("renderer rejected the viewport")]
    ViewportRejected,
    #[error("camera rejected the new center")]
    CenterRejected,
    #[error("no pick ray for window point ({x}, {y})")]
    DegenerateRay { x: i32, y: i32 },
    #[error(transparent)]
    Config(#[from] cadview_base::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ViewError>;
