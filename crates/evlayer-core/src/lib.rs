// evlayer Core Library
// Layered key remapping: tables, engine, event sources and sinks

pub mod config;
pub mod event;
pub mod input;
pub mod key;
pub mod output;
pub mod remap;

pub use config::{Config, ConfigError};
pub use event::{EventRunner, KeyEvent, KeyState, RunError, RunStats};
pub use input::{KeySource, PollOutcome, SourceError};
pub use key::Key;
pub use output::{KeySink, MemorySink, PressedKeyState, SinkError};
pub use remap::{Binding, KeyAction, Outcome, RemapEngine, RemapTable, RemapWarning};

#[cfg(feature = "device")]
pub use input::DeviceSource;
#[cfg(feature = "device")]
pub use output::VirtualSink;
