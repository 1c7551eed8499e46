use cadview_base::InstanceId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeMessageId {
    Viewing,
    Picking,
    Seeking,
    SeekHit,
    SeekMiss,
    SpinStart,
    SpinFinish,
    Scaling,
    Rotating,
    Translating,
}

impl ModeMessageId {
    pub fn text(self) -> &'static str {
        match self {
            Self::Viewing => "viewing mode",
            Self::Picking => "picking mode",
            Self::Seeking => "seeking mode",
            Self::SeekHit => "seek hit",
            Self::SeekMiss => "seek missed",
            Self::SpinStart => "spin started",
            Self::SpinFinish => "spin finished",
            Self::Scaling => "scaling",
            Self::Rotating => "rotating",
            Self::Translating => "translating",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeMessage {
    pub id: ModeMessageId,
    pub text: &'static str,
    pub sender: InstanceId,
}

impl ModeMessage {
    pub fn new(id: ModeMessageId, sender: InstanceId) -> Self {
        Self {
            id,
            text: id.text(),
            sender,
        }
    }
}

/// Host hook for mode messages. Returning false rejects the message and
/// aborts the operation that sent it.
pub type MessageCallback = Box<dyn FnMut(&ModeMessage) -> bool>;
