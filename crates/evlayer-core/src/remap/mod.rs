// evlayer Remap Layer
// Remap tables, bound actions and the layer-stack engine

mod action;
mod engine;
mod table;

pub use action::{BuiltinAction, KeyAction, LogAction, MacroAction, ShutdownAction};
pub use engine::{Outcome, RemapEngine, RemapWarning};
pub use table::{Binding, RemapTable};
