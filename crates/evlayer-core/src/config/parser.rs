// evlayer Config Parser - TOML with Serde
// Loads general options and the remap table tree from TOML files

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use strum::VariantNames;

use crate::remap::{
    Binding, BuiltinAction, LogAction, MacroAction, RemapTable, ShutdownAction,
};
use crate::key::KEY_MAX;
use crate::Key;

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid key at {path}: {reason}")]
    InvalidKey { path: String, reason: String },

    #[error("Duplicate key code {code} at {path}")]
    DuplicateKey { path: String, code: Key },

    #[error("Invalid action at {path}: {reason}")]
    InvalidAction { path: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Root remap table; nested tables are layers
    #[serde(default)]
    pub remap: Option<IndexMap<String, RemapEntryToml>>,
}

/// General settings
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Input device path
    pub device: Option<PathBuf>,
    /// How long one poll may block (milliseconds, at least 1)
    pub poll_timeout_ms: Option<i32>,
}

/// One value in a remap table
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RemapEntryToml {
    /// Raw output code
    Code(i64),
    /// Output key name (or code as a string)
    Name(String),
    /// `{ action = "...", keys = [...] }`
    Action(ActionToml),
    /// Nested table, activated as a layer
    Layer(IndexMap<String, RemapEntryToml>),
}

/// Action table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionToml {
    pub action: String,
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Validated remap table, independent of runtime handles
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableDef {
    pub entries: Vec<(Key, EntryDef)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryDef {
    Key(Key),
    Layer(TableDef),
    Action { kind: BuiltinAction, keys: Vec<Key> },
}

impl TableDef {
    /// Build the runtime table. `running` is the flag shutdown actions clear.
    pub fn build(&self, running: &Arc<AtomicBool>) -> RemapTable {
        let mut table = RemapTable::new();
        for (code, entry) in &self.entries {
            let binding = match entry {
                EntryDef::Key(key) => Binding::Key(*key),
                EntryDef::Layer(def) => Binding::layer(def.build(running)),
                EntryDef::Action { kind, keys } => match kind {
                    BuiltinAction::Log => Binding::action(LogAction),
                    BuiltinAction::Macro => Binding::action(MacroAction::new(keys.clone())),
                    BuiltinAction::Shutdown => {
                        Binding::action(ShutdownAction::new(running.clone()))
                    }
                },
            };
            table.insert(*code, binding);
        }
        table
    }
}

/// Loaded and validated configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Input device path from `[general]`
    pub device: Option<PathBuf>,
    /// Poll timeout from `[general]`
    pub poll_timeout_ms: Option<i32>,
    /// Remap table tree, `None` when the file has no `[remap]` section
    pub table: Option<TableDef>,
    /// File this configuration was read from
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.source_path = Some(path.as_ref().to_path_buf());
        log::debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;

        if let Some(timeout) = raw.general.poll_timeout_ms {
            // A bounded wait lets the runner see a cleared running flag.
            if timeout < 1 {
                return Err(ConfigError::InvalidValue {
                    field: "general.poll_timeout_ms".to_string(),
                    reason: format!("{} must be a positive number of milliseconds", timeout),
                });
            }
        }

        let table = raw
            .remap
            .as_ref()
            .map(|entries| parse_table(entries, "remap"))
            .transpose()?;

        Ok(Self {
            device: raw.general.device,
            poll_timeout_ms: raw.general.poll_timeout_ms,
            table,
            source_path: None,
        })
    }

    /// Default config location (`~/.config/evlayer/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("evlayer").join("config.toml"))
    }

    /// Load from the default location, or an empty config if there is no file
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_toml_path(path);
            }
        }
        Ok(Self::default())
    }

    /// Runtime remap table: the configured one, or the built-in layout
    pub fn remap_table(&self, running: &Arc<AtomicBool>) -> RemapTable {
        match &self.table {
            Some(def) => def.build(running),
            None => {
                log::info!("No [remap] table configured, using built-in layout");
                RemapTable::builtin()
            }
        }
    }
}

fn parse_table(
    entries: &IndexMap<String, RemapEntryToml>,
    path: &str,
) -> Result<TableDef, ConfigError> {
    let mut def = TableDef::default();

    for (raw_code, entry) in entries {
        let entry_path = format!("{}.{}", path, raw_code);
        let code = Key::from_str(raw_code).map_err(|reason| ConfigError::InvalidKey {
            path: entry_path.clone(),
            reason,
        })?;

        if def.entries.iter().any(|(existing, _)| *existing == code) {
            return Err(ConfigError::DuplicateKey {
                path: entry_path,
                code,
            });
        }

        let entry = parse_entry(entry, &entry_path)?;
        log::trace!("{} -> {:?}", entry_path, entry);
        def.entries.push((code, entry));
    }

    Ok(def)
}

fn parse_entry(entry: &RemapEntryToml, path: &str) -> Result<EntryDef, ConfigError> {
    match entry {
        RemapEntryToml::Code(code) => {
            let key = u16::try_from(*code)
                .ok()
                .filter(|c| *c <= KEY_MAX)
                .map(Key)
                .ok_or_else(|| ConfigError::InvalidKey {
                    path: path.to_string(),
                    reason: format!("Key code out of range: {}", code),
                })?;
            Ok(EntryDef::Key(key))
        }
        RemapEntryToml::Name(name) => parse_key(name, path).map(EntryDef::Key),
        RemapEntryToml::Layer(entries) => parse_table(entries, path).map(EntryDef::Layer),
        RemapEntryToml::Action(action) => parse_action(action, path),
    }
}

fn parse_key(name: &str, path: &str) -> Result<Key, ConfigError> {
    Key::from_str(name).map_err(|reason| ConfigError::InvalidKey {
        path: path.to_string(),
        reason,
    })
}

fn parse_action(action: &ActionToml, path: &str) -> Result<EntryDef, ConfigError> {
    let kind = BuiltinAction::from_str(&action.action).map_err(|_| ConfigError::InvalidAction {
        path: path.to_string(),
        reason: format!(
            "unknown action '{}', expected one of: {}",
            action.action,
            BuiltinAction::VARIANTS.join(", ")
        ),
    })?;

    let keys = action
        .keys
        .iter()
        .map(|name| parse_key(name, path))
        .collect::<Result<Vec<_>, _>>()?;

    match kind {
        BuiltinAction::Macro if keys.is_empty() => Err(ConfigError::InvalidAction {
            path: path.to_string(),
            reason: "macro needs at least one key".to_string(),
        }),
        BuiltinAction::Log | BuiltinAction::Shutdown if !keys.is_empty() => {
            Err(ConfigError::InvalidAction {
                path: path.to_string(),
                reason: format!("'{}' does not take keys", kind),
            })
        }
        _ => Ok(EntryDef::Action { kind, keys }),
    }
}
