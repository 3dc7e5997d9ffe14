// evlayer Output Layer
// Sinks that receive remapped key events

mod memory;
mod state;

#[cfg(feature = "device")]
mod uinput;

pub use memory::MemorySink;
pub use state::PressedKeyState;

#[cfg(feature = "device")]
pub use uinput::VirtualSink;

use crate::event::KeyState;
use crate::Key;

/// Errors raised by an output sink. These are fatal for the event runner.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(String),

    #[error("Failed to write event: {0}")]
    Write(String),

    #[error("Output sink is closed")]
    Closed,
}

/// Destination for remapped key events.
///
/// `emit` only stages an event. Nothing is visible downstream until `flush`
/// commits everything staged since the last flush as one unit.
pub trait KeySink {
    fn emit(&mut self, key: Key, state: KeyState) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError>;

    /// Release every output key still held, then close the sink.
    fn close(&mut self) -> Result<(), SinkError>;
}

impl<S: KeySink + ?Sized> KeySink for Box<S> {
    fn emit(&mut self, key: Key, state: KeyState) -> Result<(), SinkError> {
        (**self).emit(key, state)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), SinkError> {
        (**self).close()
    }
}
