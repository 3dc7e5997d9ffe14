// evlayer Input Layer
// Sequential key event sources feeding the remap engine

mod event;

#[cfg(feature = "device")]
mod device;

pub use event::{is_key_event, key_event_from_raw, EV_KEY};

#[cfg(feature = "device")]
pub use device::DeviceSource;

use crate::event::KeyEvent;

/// Errors raised by an input source. These are fatal for the event runner.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input device error: {0}")]
    Device(String),
}

/// Result of waiting on an input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Key events read in order. Empty when the wait timed out.
    Events(Vec<KeyEvent>),
    /// The source is exhausted and will not produce further events.
    Closed,
}

/// A sequential source of key events.
///
/// Implementations only hand out key events; other event types and
/// unknown key values are filtered before they reach the engine.
pub trait KeySource {
    /// Wait up to `timeout_ms` for events (-1 waits forever).
    fn poll(&mut self, timeout_ms: i32) -> Result<PollOutcome, SourceError>;

    /// Give the underlying device back to the system. Called once on shutdown.
    fn release(&mut self);
}

impl<S: KeySource + ?Sized> KeySource for Box<S> {
    fn poll(&mut self, timeout_ms: i32) -> Result<PollOutcome, SourceError> {
        (**self).poll(timeout_ms)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
