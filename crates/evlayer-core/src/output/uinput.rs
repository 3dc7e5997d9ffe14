// evlayer uinput Output Layer
// Virtual keyboard device receiving remapped key events

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent};

use super::{KeySink, PressedKeyState, SinkError};
use crate::event::KeyState;
use crate::key::KEY_MAX;
use crate::Key;

/// Name of the virtual device. Keep it recognizable so it is never picked
/// up as an input device by another remapper instance.
pub const VIRTUAL_DEVICE_NAME: &str = "evlayer (virtual) keyboard";

/// Virtual uinput keyboard used as the output sink
pub struct VirtualSink {
    device: Option<VirtualDevice>,
    staged: Vec<InputEvent>,
    staged_keys: Vec<(Key, KeyState)>,
    pressed: PressedKeyState,
}

impl VirtualSink {
    /// Create a virtual keyboard able to emit every key code up to KEY_MAX
    pub fn new() -> Result<Self, SinkError> {
        let mut keys = AttributeSet::new();
        for code in 0..=KEY_MAX {
            keys.insert(evdev::Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e| SinkError::DeviceCreation(e.to_string()))?
            .name(VIRTUAL_DEVICE_NAME)
            .with_keys(&keys)
            .map_err(|e| SinkError::DeviceCreation(e.to_string()))?
            .build()
            .map_err(|e| SinkError::DeviceCreation(e.to_string()))?;

        log::info!("Created virtual device '{}'", VIRTUAL_DEVICE_NAME);

        Ok(Self {
            device: Some(device),
            staged: Vec::new(),
            staged_keys: Vec::new(),
            pressed: PressedKeyState::new(),
        })
    }

    /// Output keys currently held down on the virtual device
    pub fn pressed(&self) -> &PressedKeyState {
        &self.pressed
    }
}

impl KeySink for VirtualSink {
    fn emit(&mut self, key: Key, state: KeyState) -> Result<(), SinkError> {
        if self.device.is_none() {
            return Err(SinkError::Closed);
        }
        self.staged
            .push(InputEvent::new(EventType::KEY, key.code(), state.to_i32()));
        self.staged_keys.push((key, state));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        let device = self.device.as_mut().ok_or(SinkError::Closed)?;
        if self.staged.is_empty() {
            return Ok(());
        }

        // evdev terminates the batch with SYN_REPORT, so the whole frame
        // becomes visible to readers at once.
        device
            .emit(&self.staged)
            .map_err(|e| SinkError::Write(e.to_string()))?;

        self.staged.clear();
        for (key, state) in self.staged_keys.drain(..) {
            self.pressed.apply(key, state);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.device.is_none() {
            return Ok(());
        }
        self.staged.clear();
        self.staged_keys.clear();

        let held = self.pressed.get_all();
        if !held.is_empty() {
            log::debug!("Releasing {} held output key(s) before close", held.len());
        }
        for key in held {
            self.emit(key, KeyState::Release)?;
        }
        self.flush()?;

        // Dropping the handle destroys the uinput device.
        self.device = None;
        log::info!("Closed virtual device '{}'", VIRTUAL_DEVICE_NAME);
        Ok(())
    }
}
