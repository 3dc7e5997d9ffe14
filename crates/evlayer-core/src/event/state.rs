// evlayer Key Events
// Press/release/repeat states and the pre-remap key event value

use std::fmt;

use crate::Key;

/// State carried by a key event.
///
/// From `evtest` output, the "magic numbers" for assignment to enums:
///   0 == 'released'
///   1 == 'pressed'
///   2 == 'repeated'
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum KeyState {
    Release = 0,
    Press = 1,
    Repeat = 2,
}

impl KeyState {
    /// Create a KeyState from an evdev event value
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Release),
            1 => Some(KeyState::Press),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }

    /// Convert to the evdev event value
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyState::Release => write!(f, "release"),
            KeyState::Press => write!(f, "press"),
            KeyState::Repeat => write!(f, "repeat"),
        }
    }
}

/// A single key event as read from the input device, before remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: Key,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn new(code: impl Into<Key>, state: KeyState) -> Self {
        Self {
            code: code.into(),
            state,
        }
    }

    pub fn press(code: impl Into<Key>) -> Self {
        Self::new(code, KeyState::Press)
    }

    pub fn release(code: impl Into<Key>) -> Self {
        Self::new(code, KeyState::Release)
    }

    pub fn repeat(code: impl Into<Key>) -> Self {
        Self::new(code, KeyState::Repeat)
    }

    /// Build from raw evdev fields. Returns `None` for values that are not
    /// key states (anything outside 0..=2).
    pub fn from_raw(code: u16, value: i32) -> Option<Self> {
        KeyState::from_i32(value).map(|state| Self::new(code, state))
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.state)
    }
}
