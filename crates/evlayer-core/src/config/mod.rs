// evlayer Config API
// TOML configuration: general options and the remap table tree

mod parser;

pub use parser::{
    ActionToml, Config, ConfigError, ConfigToml, EntryDef, GeneralConfig, RemapEntryToml,
    TableDef,
};
