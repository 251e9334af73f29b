// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (graph acyclicity, etc.). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - unknown or self-referential `deps` entries,
///   - task graph cycles,
///   - conflicting task bodies (`cmd` vs `transform`),
///   - watch rules naming unknown tasks or carrying invalid globs,
///   - a missing `[transform]` section when a task needs one.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Helper to resolve a default config path.
///
/// Currently this just returns `Buildrig.toml` in the current working
/// directory, but this function exists so you can later:
///
/// - Respect an env var (e.g. `BUILDRIG_CONFIG`).
/// - Look for multiple default locations.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Buildrig.toml")
}
