//! Configuration file loading

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Standard locations searched when no explicit path is given
pub const CONFIG_CANDIDATES: &[&str] = &[
    ".cozycampus.toml",
    "cozycampus.toml",
    ".config/cozycampus.toml",
];

/// A parsed configuration file together with where it came from
#[derive(Debug, Clone)]
pub struct ConfigFile<T> {
    /// Parsed settings
    pub settings: T,
    /// Path the settings were read from, if any
    pub path: Option<PathBuf>,
}

impl<T: DeserializeOwned + Default> ConfigFile<T> {
    /// Load from an explicit path, a standard location, or fall back to defaults
    ///
    /// An explicit path that does not exist is an error; a missing file in
    /// the standard locations is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => {
                return Err(Error::NotFound {
                    path: p.to_path_buf(),
                });
            }
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(Path::new(".")),
        };

        let settings = match config_path {
            Some(ref p) => load_toml(p)?,
            None => T::default(),
        };

        Ok(Self {
            settings,
            path: config_path,
        })
    }
}

/// Find a configuration file in the standard locations under `root`
pub fn find_config_file(root: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|path| path.exists())
}

/// Load and parse a TOML configuration file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "Loading configuration file");

    let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        name: String,
        #[serde(default)]
        retries: u32,
    }

    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cozycampus.toml");
        std::fs::write(&path, "name = \"campus\"\nretries = 3\n").unwrap();

        let loaded: ConfigFile<Sample> = ConfigFile::load(Some(&path)).unwrap();
        assert_eq!(loaded.settings.name, "campus");
        assert_eq!(loaded.settings.retries, 3);
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = ConfigFile::<Sample>::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_parse_error_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "retries = \"many\"").unwrap();

        let err = load_toml::<Sample>(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_find_config_file_prefers_first_candidate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cozycampus.toml"), "").unwrap();
        std::fs::write(dir.path().join(".cozycampus.toml"), "").unwrap();

        let found = find_config_file(dir.path()).unwrap();
        assert!(found.ends_with(".cozycampus.toml"));
    }
}
