// evlayer Remap Actions
// Bindings that run behavior instead of emitting a single key

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use strum_macros::{Display, EnumString, VariantNames};

use crate::event::{KeyEvent, KeyState};
use crate::output::{KeySink, SinkError};
use crate::Key;

/// Behavior bound to a raw key in place of an output key.
///
/// The engine hands every press, repeat and release of the bound key to
/// `invoke` with the original (pre-remap) event. Emission, if any, is up to
/// the action: it gets the sink and must flush what it emits. A returned
/// sink error is fatal for the runner, same as a failed engine emission.
pub trait KeyAction: Send + Sync {
    fn invoke(&self, event: &KeyEvent, sink: &mut dyn KeySink) -> Result<(), SinkError>;

    /// Short label used in logs and table dumps
    fn describe(&self) -> String {
        "callback".to_string()
    }
}

impl<F> KeyAction for F
where
    F: Fn(&KeyEvent, &mut dyn KeySink) -> Result<(), SinkError> + Send + Sync,
{
    fn invoke(&self, event: &KeyEvent, sink: &mut dyn KeySink) -> Result<(), SinkError> {
        self(event, sink)
    }
}

impl fmt::Debug for dyn KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyAction({})", self.describe())
    }
}

/// Actions that can be named in the configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BuiltinAction {
    Log,
    Macro,
    Shutdown,
}

/// Logs every event of the bound key
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAction;

impl KeyAction for LogAction {
    fn invoke(&self, event: &KeyEvent, _sink: &mut dyn KeySink) -> Result<(), SinkError> {
        log::info!("Key event: {}", event);
        Ok(())
    }

    fn describe(&self) -> String {
        BuiltinAction::Log.to_string()
    }
}

/// Taps a fixed key sequence when the bound key is pressed.
///
/// Each key is pressed and released in its own frame. Repeat and release
/// of the bound key do nothing.
#[derive(Debug, Clone)]
pub struct MacroAction {
    keys: Vec<Key>,
}

impl MacroAction {
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl KeyAction for MacroAction {
    fn invoke(&self, event: &KeyEvent, sink: &mut dyn KeySink) -> Result<(), SinkError> {
        if event.state != KeyState::Press {
            return Ok(());
        }
        for key in &self.keys {
            sink.emit(*key, KeyState::Press)?;
            sink.flush()?;
            sink.emit(*key, KeyState::Release)?;
            sink.flush()?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.keys.iter().map(|k| k.name().to_string()).collect();
        format!("{} [{}]", BuiltinAction::Macro, names.join(", "))
    }
}

/// Stops the event runner when the bound key is pressed.
///
/// Clears the shared running flag; the runner notices it before the next
/// event and shuts down cleanly.
#[derive(Debug, Clone)]
pub struct ShutdownAction {
    running: Arc<AtomicBool>,
}

impl ShutdownAction {
    pub fn new(running: Arc<AtomicBool>) -> Self {
        Self { running }
    }
}

impl KeyAction for ShutdownAction {
    fn invoke(&self, event: &KeyEvent, _sink: &mut dyn KeySink) -> Result<(), SinkError> {
        if event.state == KeyState::Press {
            log::info!("Shutdown key {} pressed, stopping", event.code);
            self.running.store(false, Ordering::SeqCst);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        BuiltinAction::Shutdown.to_string()
    }
}
