// Shared fixtures for evlayer integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use evlayer_core::{Key, KeyEvent, KeySink, KeySource, KeyState, PollOutcome, SinkError, SourceError};

/// One scripted poll result
#[derive(Debug, Clone)]
pub enum Step {
    Batch(Vec<KeyEvent>),
    Timeout,
    Fail(String),
}

/// Key source replaying a fixed script, then reporting `Closed`
#[derive(Debug, Default)]
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    polls: usize,
    released: Arc<AtomicBool>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            ..Default::default()
        }
    }

    /// One batch per event
    pub fn events(events: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self::new(events.into_iter().map(|e| Step::Batch(vec![e])))
    }

    /// Flag set once the runner releases the source
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        self.released.clone()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl KeySource for ScriptedSource {
    fn poll(&mut self, _timeout_ms: i32) -> Result<PollOutcome, SourceError> {
        self.polls += 1;
        match self.steps.pop_front() {
            Some(Step::Batch(events)) => Ok(PollOutcome::Events(events)),
            Some(Step::Timeout) => Ok(PollOutcome::Events(Vec::new())),
            Some(Step::Fail(msg)) => Err(SourceError::Device(msg)),
            None => Ok(PollOutcome::Closed),
        }
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Sink that accepts `budget` emits and then fails every write
#[derive(Debug, Default)]
pub struct FailingSink {
    budget: usize,
    emitted: Vec<(Key, KeyState)>,
    closed: bool,
    fail_close: bool,
    close_attempts: usize,
}

impl FailingSink {
    pub fn after(budget: usize) -> Self {
        Self {
            budget,
            ..Default::default()
        }
    }

    /// Also fail on `close`
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn close_attempts(&self) -> usize {
        self.close_attempts
    }

    pub fn emitted(&self) -> &[(Key, KeyState)] {
        &self.emitted
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl KeySink for FailingSink {
    fn emit(&mut self, key: Key, state: KeyState) -> Result<(), SinkError> {
        if self.budget == 0 {
            return Err(SinkError::Write("device gone".to_string()));
        }
        self.budget -= 1;
        self.emitted.push((key, state));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.close_attempts += 1;
        if self.fail_close {
            return Err(SinkError::Write("close failed".to_string()));
        }
        self.closed = true;
        Ok(())
    }
}

pub fn press(code: u16) -> KeyEvent {
    KeyEvent::press(code)
}

pub fn release(code: u16) -> KeyEvent {
    KeyEvent::release(code)
}

pub fn repeat(code: u16) -> KeyEvent {
    KeyEvent::repeat(code)
}
