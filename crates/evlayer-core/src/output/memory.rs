// evlayer In-Memory Sink
// Records committed frames instead of writing to a device

use super::{KeySink, PressedKeyState, SinkError};
use crate::event::KeyState;
use crate::Key;

/// Sink that keeps every flushed frame in memory.
///
/// Each call to `flush` with staged events
/// produces one frame; a flush with nothing staged records nothing.
#[derive(Debug, Default)]
pub struct MemorySink {
    staged: Vec<(Key, KeyState)>,
    frames: Vec<Vec<(Key, KeyState)>>,
    pressed: PressedKeyState,
    flushes: usize,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed frames in flush order
    pub fn frames(&self) -> &[Vec<(Key, KeyState)>] {
        &self.frames
    }

    /// All committed events, flattened
    pub fn events(&self) -> Vec<(Key, KeyState)> {
        self.frames.iter().flatten().copied().collect()
    }

    /// Events staged but not yet flushed
    pub fn staged(&self) -> &[(Key, KeyState)] {
        &self.staged
    }

    /// Number of `flush` calls, including empty ones
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn pressed(&self) -> &PressedKeyState {
        &self.pressed
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Forget recorded frames, keeping pressed state
    pub fn clear_frames(&mut self) {
        self.frames.clear();
    }
}

impl KeySink for MemorySink {
    fn emit(&mut self, key: Key, state: KeyState) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.staged.push((key, state));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        self.flushes += 1;
        if self.staged.is_empty() {
            return Ok(());
        }
        let frame = std::mem::take(&mut self.staged);
        for (key, state) in &frame {
            self.pressed.apply(*key, *state);
        }
        self.frames.push(frame);
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.closed {
            return Ok(());
        }
        self.staged.clear();
        for key in self.pressed.get_all() {
            self.emit(key, KeyState::Release)?;
            self.flush()?;
        }
        self.closed = true;
        Ok(())
    }
}
