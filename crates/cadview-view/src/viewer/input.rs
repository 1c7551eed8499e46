use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Mouse buttons plus modifier keys, compared by exact equality when
/// dispatching drags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<MaskFlag>", into = "Vec<MaskFlag>")]
pub struct ButtonMask(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskFlag {
    Left,
    Middle,
    Right,
    Wheel,
    Control,
    Shift,
}

const FLAGS: [(MaskFlag, ButtonMask); 6] = [
    (MaskFlag::Left, ButtonMask::LEFT),
    (MaskFlag::Middle, ButtonMask::MIDDLE),
    (MaskFlag::Right, ButtonMask::RIGHT),
    (MaskFlag::Wheel, ButtonMask::WHEEL),
    (MaskFlag::Control, ButtonMask::CONTROL),
    (MaskFlag::Shift, ButtonMask::SHIFT),
];

// Win32 mouse-message key state bits.
const MK_LBUTTON: u32 = 0x0001;
const MK_RBUTTON: u32 = 0x0002;
const MK_SHIFT: u32 = 0x0004;
const MK_CONTROL: u32 = 0x0008;
const MK_MBUTTON: u32 = 0x0010;

impl ButtonMask {
    pub const NONE: Self = Self(0);
    pub const LEFT: Self = Self(1 << 0);
    pub const MIDDLE: Self = Self(1 << 1);
    pub const RIGHT: Self = Self(1 << 2);
    pub const CONTROL: Self = Self(1 << 3);
    pub const SHIFT: Self = Self(1 << 4);
    /// Set by hosts that report wheel presses; there is no Win32 key-state bit for it.
    pub const WHEEL: Self = Self(1 << 5);

    const ALL: u32 = 0b11_1111;

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Unknown bits are dropped.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL)
    }

    /// Translates the key-state word of a Win32 mouse message.
    pub fn from_platform_bits(bits: u32) -> Self {
        let mut mask = Self::NONE;
        for (platform, flag) in [
            (MK_LBUTTON, Self::LEFT),
            (MK_MBUTTON, Self::MIDDLE),
            (MK_RBUTTON, Self::RIGHT),
            (MK_CONTROL, Self::CONTROL),
            (MK_SHIFT, Self::SHIFT),
        ] {
            if bits & platform != 0 {
                mask |= flag;
            }
        }
        mask
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn flags(self) -> Vec<MaskFlag> {
        FLAGS
            .iter()
            .filter(|(_, mask)| self.contains(*mask))
            .map(|(flag, _)| *flag)
            .collect()
    }
}

impl From<MaskFlag> for ButtonMask {
    fn from(flag: MaskFlag) -> Self {
        FLAGS
            .iter()
            .find(|(f, _)| *f == flag)
            .map_or(Self::NONE, |(_, mask)| *mask)
    }
}

impl From<Vec<MaskFlag>> for ButtonMask {
    fn from(flags: Vec<MaskFlag>) -> Self {
        flags.into_iter().fold(Self::NONE, |mask, flag| mask | flag.into())
    }
}

impl From<ButtonMask> for Vec<MaskFlag> {
    fn from(mask: ButtonMask) -> Self {
        mask.flags()
    }
}

impl std::ops::BitOr for ButtonMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ButtonMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for ButtonMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl std::fmt::Display for ButtonMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = self
            .flags()
            .into_iter()
            .map(|flag| match flag {
                MaskFlag::Left => "left",
                MaskFlag::Middle => "middle",
                MaskFlag::Right => "right",
                MaskFlag::Wheel => "wheel",
                MaskFlag::Control => "control",
                MaskFlag::Shift => "shift",
            })
            .collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Host key code. Printable ASCII keys serialize as one-character strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "KeyRepr", into = "KeyRepr")]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const fn from_char(c: char) -> Self {
        Self(c as u32)
    }
}

impl From<char> for KeyCode {
    fn from(c: char) -> Self {
        Self::from_char(c)
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match char::from_u32(self.0).filter(char::is_ascii_graphic) {
            Some(c) => write!(f, "'{c}'"),
            None => write!(f, "#{}", self.0),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum KeyRepr {
    Code(u32),
    Char(char),
}

impl From<KeyRepr> for KeyCode {
    fn from(repr: KeyRepr) -> Self {
        match repr {
            KeyRepr::Code(code) => Self(code),
            KeyRepr::Char(c) => Self::from_char(c),
        }
    }
}

impl From<KeyCode> for KeyRepr {
    fn from(key: KeyCode) -> Self {
        match char::from_u32(key.0).filter(char::is_ascii_graphic) {
            Some(c) => Self::Char(c),
            None => Self::Code(key.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyState {
    #[default]
    Up,
    Down,
}

/// Last known state of every key the viewer has seen.
#[derive(Clone, Debug, Default)]
pub struct KeyTable {
    states: HashMap<KeyCode, KeyState>,
}

impl KeyTable {
    pub fn press(&mut self, key: KeyCode) {
        self.states.insert(key, KeyState::Down);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.states.insert(key, KeyState::Up);
    }

    pub fn state(&self, key: KeyCode) -> KeyState {
        self.states.get(&key).copied().unwrap_or_default()
    }

    pub fn is_down(&self, key: KeyCode) -> bool {
        self.state(key) == KeyState::Down
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPoint {
    pub x: i32,
    pub y: i32,
}

impl WindowPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    Start,
    Move,
    Finish,
}

/// Receives pointer drags while the viewer is picking rather than viewing.
pub trait Dragger {
    fn drag(&mut self, phase: DragPhase, point: WindowPoint, buttons: ButtonMask);
}

/// Serializable form of every input the viewer accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    MouseMoved {
        x: i32,
        y: i32,
        #[serde(default)]
        buttons: ButtonMask,
    },
    ButtonDown {
        x: i32,
        y: i32,
        button: ButtonMask,
        buttons: ButtonMask,
    },
    ButtonUp {
        x: i32,
        y: i32,
        button: ButtonMask,
        #[serde(default)]
        buttons: ButtonMask,
    },
    KeyDown {
        key: KeyCode,
    },
    KeyUp {
        key: KeyCode,
    },
    Resize {
        width: i32,
        height: i32,
    },
    SpinTick,
    ViewAll,
    StopMotion,
    PointerReset,
}
