// evlayer Remap Tables
// Recursive raw-code tables: key, layer or action per entry

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::action::{KeyAction, LogAction};
use crate::Key;

/// What a raw key code resolves to in a table
#[derive(Clone)]
pub enum Binding {
    /// Emit this output key instead of the raw one
    Key(Key),
    /// Activate this table as a new layer while the raw key is held
    Layer(Arc<RemapTable>),
    /// Run this action for every event of the raw key
    Action(Arc<dyn KeyAction>),
}

impl Binding {
    pub fn layer(table: RemapTable) -> Self {
        Binding::Layer(Arc::new(table))
    }

    pub fn action(action: impl KeyAction + 'static) -> Self {
        Binding::Action(Arc::new(action))
    }

    /// Output key for a plain key binding
    pub fn as_key(&self) -> Option<Key> {
        match self {
            Binding::Key(key) => Some(*key),
            _ => None,
        }
    }

    pub fn is_layer(&self) -> bool {
        matches!(self, Binding::Layer(_))
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Binding::Action(_))
    }
}

impl From<Key> for Binding {
    fn from(key: Key) -> Self {
        Binding::Key(key)
    }
}

impl From<RemapTable> for Binding {
    fn from(table: RemapTable) -> Self {
        Binding::layer(table)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Binding::Layer(table) => f.debug_tuple("Layer").field(table).finish(),
            Binding::Action(action) => f.debug_tuple("Action").field(&action.describe()).finish(),
        }
    }
}

/// Immutable mapping from raw key code to binding.
///
/// Entries keep declaration order for display; lookup is by code only.
#[derive(Debug, Clone, Default)]
pub struct RemapTable {
    entries: IndexMap<Key, Binding>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, code: u16, binding: impl Into<Binding>) -> Self {
        self.insert(Key(code), binding);
        self
    }

    /// Insert or replace the binding for `code`, returning the old one
    pub fn insert(&mut self, code: Key, binding: impl Into<Binding>) -> Option<Binding> {
        self.entries.insert(code, binding.into())
    }

    pub fn get(&self, code: Key) -> Option<&Binding> {
        self.entries.get(&code)
    }

    pub fn contains(&self, code: Key) -> bool {
        self.entries.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &Binding)> + '_ {
        self.entries.iter().map(|(code, binding)| (*code, binding))
    }

    /// Number of nested layers below this table, counting the deepest path
    pub fn depth(&self) -> usize {
        self.entries
            .values()
            .filter_map(|binding| match binding {
                Binding::Layer(table) => Some(1 + table.depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Layout used when no configuration file is present.
    ///
    /// Built for a small macro pad; raw codes on the left are the pad's
    /// hardware codes.
    ///
    /// ```text
    ///  1:15  2:16  3:17  4:18  5:19
    ///  6:58  7:30  8:31  9:32 10:33
    /// 11:42 12:44 13:45 14:46 15:47
    ///
    /// little:56 big:57 u:103 l:105 r:106 d:108
    /// ```
    pub fn builtin() -> Self {
        let navigation = RemapTable::new()
            .with(57, Key(28)) // ENTER
            .with(103, Key(104)) // PAGE_UP
            .with(105, Key(102)) // HOME
            .with(106, Key(107)) // END
            .with(108, Key(109)); // PAGE_DOWN

        RemapTable::new()
            .with(15, Key(1)) // ESC
            .with(17, Key(110)) // INSERT
            .with(19, Binding::action(LogAction))
            .with(58, Key(29)) // LEFT_CTRL
            .with(31, Key(15)) // TAB
            .with(42, Key(42)) // LEFT_SHIFT
            .with(44, Key(125)) // LEFT_META
            .with(45, navigation)
            .with(56, Key(1)) // ESC
            .with(57, Key(57)) // SPACE
            .with(103, Key(103)) // UP
            .with(105, Key(105)) // LEFT
            .with(106, Key(106)) // RIGHT
            .with(108, Key(108)) // DOWN
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        for (code, binding) in self.iter() {
            write!(f, "{:width$}{} -> ", "", code, width = indent)?;
            match binding {
                Binding::Key(key) => writeln!(f, "{}", key)?,
                Binding::Action(action) => writeln!(f, "action {}", action.describe())?,
                Binding::Layer(table) => {
                    writeln!(f, "layer ({} entries)", table.len())?;
                    table.write_tree(f, indent + 2)?;
                }
            }
        }
        Ok(())
    }
}

/// Indented tree, one entry per line
impl fmt::Display for RemapTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}
