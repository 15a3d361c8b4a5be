//! Configuration file discovery and loading
//!
//! Settings types live with the crates that own them; this module only knows
//! where CozyCampus configuration files are looked up and how they are parsed.

mod loader;

pub use loader::{find_config_file, load_toml, ConfigFile, CONFIG_CANDIDATES};
