// evlayer Remap Engine
// Layer-stack state machine turning raw key events into remapped output
//
// Live state:
// - layer stack: active tables, root at the bottom, one more per held layer key
// - modifier chain: held layer keys in press order (stack minus root)
// - down map: press-time binding of every held key or action key
//
// Release and repeat replay the press-time decision from the down map,
// never a fresh lookup.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use super::table::{Binding, RemapTable};
use crate::event::{KeyEvent, KeyState};
use crate::output::{KeySink, SinkError};
use crate::Key;

/// Conditions that drop an event without stopping the engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemapWarning {
    #[error("no binding for pressed key {0}")]
    UnrecognizedPress(Key),

    #[error("release of key {0} that is not held")]
    UnmatchedRelease(Key),

    #[error("repeat of key {0} that is not held")]
    UnmatchedRepeat(Key),

    #[error("layer replay failed at key {code}: {dropped} held layer key(s) dropped")]
    ReplayInconsistency { code: Key, dropped: usize },
}

/// What the engine did with one input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// One remapped event was emitted and flushed
    Emitted(Key, KeyState),
    /// A layer key was pressed; `depth` is the new stack size
    LayerPushed { depth: usize },
    /// A layer key was released and the stack rebuilt to `depth`
    LayerReleased { depth: usize },
    /// Repeat of a held layer key, nothing to do
    LayerHeld,
    /// The bound action ran for an event in this state
    ActionInvoked(KeyState),
    /// The event was dropped
    Ignored(RemapWarning),
}

type LayerStack = SmallVec<[Arc<RemapTable>; 4]>;

/// Search the stack from the most recently pushed table down to the root
fn stacklook(stack: &[Arc<RemapTable>], code: Key) -> Option<&Binding> {
    stack.iter().rev().find_map(|table| table.get(code))
}

/// Key remapping state machine for one input device
#[derive(Debug)]
pub struct RemapEngine {
    root: Arc<RemapTable>,
    stack: LayerStack,
    chain: SmallVec<[Key; 4]>,
    down: HashMap<Key, Binding>,
    // Layer keys still physically held whose layer was dropped by a failed
    // replay. Their repeats and release are absorbed quietly.
    detached: SmallVec<[Key; 4]>,
}

impl RemapEngine {
    pub fn new(root: impl Into<Arc<RemapTable>>) -> Self {
        let root = root.into();
        let mut stack = LayerStack::new();
        stack.push(root.clone());
        Self {
            root,
            stack,
            chain: SmallVec::new(),
            down: HashMap::new(),
            detached: SmallVec::new(),
        }
    }

    /// Process one input event, emitting through `sink` as needed.
    ///
    /// Only sink failures are errors; every other problem is reported as
    /// `Outcome::Ignored` and logged.
    pub fn process(
        &mut self,
        event: KeyEvent,
        sink: &mut dyn KeySink,
    ) -> Result<Outcome, SinkError> {
        let outcome = match event.state {
            KeyState::Press => self.on_press(event, sink)?,
            KeyState::Release => self.on_release(event, sink)?,
            KeyState::Repeat => self.on_repeat(event, sink)?,
        };

        if let Outcome::Ignored(warning) = &outcome {
            log::warn!("{}", warning);
        }
        Ok(outcome)
    }

    fn on_press(&mut self, event: KeyEvent, sink: &mut dyn KeySink) -> Result<Outcome, SinkError> {
        let code = event.code;
        // A detached key pressed again lost its release; drop the stale entry.
        if let Some(pos) = self.detached.iter().position(|c| *c == code) {
            self.detached.remove(pos);
        }
        let Some(binding) = self.lookup(code).cloned() else {
            return Ok(Outcome::Ignored(RemapWarning::UnrecognizedPress(code)));
        };

        match binding {
            Binding::Key(key) => {
                self.down.insert(code, Binding::Key(key));
                sink.emit(key, KeyState::Press)?;
                sink.flush()?;
                Ok(Outcome::Emitted(key, KeyState::Press))
            }
            Binding::Layer(table) => {
                self.chain.push(code);
                self.stack.push(table);
                Ok(Outcome::LayerPushed {
                    depth: self.stack.len(),
                })
            }
            Binding::Action(action) => {
                self.down.insert(code, Binding::Action(action.clone()));
                action.invoke(&event, sink)?;
                Ok(Outcome::ActionInvoked(KeyState::Press))
            }
        }
    }

    fn on_release(
        &mut self,
        event: KeyEvent,
        sink: &mut dyn KeySink,
    ) -> Result<Outcome, SinkError> {
        let code = event.code;

        match self.down.remove(&code) {
            Some(Binding::Key(key)) => {
                sink.emit(key, KeyState::Release)?;
                sink.flush()?;
                Ok(Outcome::Emitted(key, KeyState::Release))
            }
            Some(Binding::Action(action)) => {
                action.invoke(&event, sink)?;
                Ok(Outcome::ActionInvoked(KeyState::Release))
            }
            // Layers are never recorded in the down map
            Some(Binding::Layer(_)) | None => {
                if let Some(pos) = self.chain.iter().position(|c| *c == code) {
                    self.chain.remove(pos);
                    if let Some(warning) = self.rebuild_stack() {
                        return Ok(Outcome::Ignored(warning));
                    }
                    Ok(Outcome::LayerReleased {
                        depth: self.stack.len(),
                    })
                } else if let Some(pos) = self.detached.iter().position(|c| *c == code) {
                    self.detached.remove(pos);
                    log::debug!("Detached layer key {} released", code);
                    Ok(Outcome::LayerReleased {
                        depth: self.stack.len(),
                    })
                } else {
                    Ok(Outcome::Ignored(RemapWarning::UnmatchedRelease(code)))
                }
            }
        }
    }

    fn on_repeat(
        &mut self,
        event: KeyEvent,
        sink: &mut dyn KeySink,
    ) -> Result<Outcome, SinkError> {
        let code = event.code;

        match self.down.get(&code) {
            Some(Binding::Key(key)) => {
                let key = *key;
                sink.emit(key, KeyState::Repeat)?;
                sink.flush()?;
                Ok(Outcome::Emitted(key, KeyState::Repeat))
            }
            Some(Binding::Action(action)) => {
                action.invoke(&event, sink)?;
                Ok(Outcome::ActionInvoked(KeyState::Repeat))
            }
            Some(Binding::Layer(_)) | None => {
                if self.chain.contains(&code) || self.detached.contains(&code) {
                    Ok(Outcome::LayerHeld)
                } else {
                    Ok(Outcome::Ignored(RemapWarning::UnmatchedRepeat(code)))
                }
            }
        }
    }

    /// Rebuild the stack from the root by replaying the modifier chain.
    ///
    /// Each chain key is resolved against the partially rebuilt stack and
    /// must yield a layer. On the first key that does not, the stack falls
    /// back to the root alone and every remaining chain key is detached.
    fn rebuild_stack(&mut self) -> Option<RemapWarning> {
        self.stack.truncate(1);

        for idx in 0..self.chain.len() {
            let code = self.chain[idx];
            match stacklook(&self.stack, code) {
                Some(Binding::Layer(table)) => {
                    let table = table.clone();
                    self.stack.push(table);
                }
                _ => {
                    let dropped = self.chain.len();
                    self.stack.truncate(1);
                    self.detached.extend(self.chain.drain(..));
                    return Some(RemapWarning::ReplayInconsistency { code, dropped });
                }
            }
        }
        None
    }

    /// Resolve `code` against the active layers, most recent first
    pub fn lookup(&self, code: Key) -> Option<&Binding> {
        stacklook(&self.stack, code)
    }

    /// The table at the bottom of the stack
    pub fn root(&self) -> &Arc<RemapTable> {
        &self.root
    }

    /// Number of active tables, root included
    pub fn layer_depth(&self) -> usize {
        self.stack.len()
    }

    /// Held layer keys in press order
    pub fn modifier_chain(&self) -> &[Key] {
        &self.chain
    }

    /// Binding recorded at press time for a held key or action key
    pub fn held_binding(&self, code: Key) -> Option<&Binding> {
        self.down.get(&code)
    }

    /// Whether the engine tracks `code` as physically held
    pub fn is_held(&self, code: Key) -> bool {
        self.down.contains_key(&code) || self.chain.contains(&code) || self.detached.contains(&code)
    }

    /// Number of held keys with a recorded key or action binding
    pub fn held_count(&self) -> usize {
        self.down.len()
    }

    /// Drop all live state and return to the root layer.
    ///
    /// Use after the input source has been reacquired; no events are
    /// emitted for keys that were held.
    pub fn reset(&mut self) {
        self.stack.truncate(1);
        self.chain.clear();
        self.down.clear();
        self.detached.clear();
    }
}
