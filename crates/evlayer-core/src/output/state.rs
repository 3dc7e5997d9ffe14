// evlayer Pressed Key State
// Output keys currently held down on a sink

use crate::event::KeyState;
use crate::Key;
use std::collections::HashSet;

/// Tracks which output keys a sink has committed as pressed
#[derive(Debug, Clone, Default)]
pub struct PressedKeyState {
    pressed: HashSet<Key>,
}

impl PressedKeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a committed event. Repeats do not change the pressed set.
    pub fn apply(&mut self, key: Key, state: KeyState) {
        match state {
            KeyState::Press => {
                self.pressed.insert(key);
            }
            KeyState::Release => {
                self.pressed.remove(&key);
            }
            KeyState::Repeat => {}
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// All pressed keys, ordered by code
    pub fn get_all(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.pressed.iter().copied().collect();
        keys.sort();
        keys
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }

    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }
}
