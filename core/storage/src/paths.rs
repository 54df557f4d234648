//! Locations of the config and token cache files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use idealista_common::{Error, Result};

/// Directory name used under both the config and cache homes.
pub const APP_DIR: &str = "idealista-cli";
/// Credentials file name.
pub const CONFIG_FILENAME: &str = "config.json";
/// Token cache file name.
pub const TOKEN_FILENAME: &str = "token.json";

/// Overrides the platform config directory.
pub const CONFIG_HOME_VAR: &str = "XDG_CONFIG_HOME";
/// Overrides the platform cache directory.
pub const CACHE_HOME_VAR: &str = "XDG_CACHE_HOME";

/// Config and cache base directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDirs {
    config_home: PathBuf,
    cache_home: PathBuf,
}

impl StateDirs {
    /// Use explicit base directories.
    pub fn new(config_home: impl Into<PathBuf>, cache_home: impl Into<PathBuf>) -> Self {
        Self {
            config_home: config_home.into(),
            cache_home: cache_home.into(),
        }
    }

    /// Resolve from the process environment and platform conventions.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Resolve using `lookup` for environment variables.
    ///
    /// Empty variables are ignored. Falls back to the platform config and
    /// cache directories.
    ///
    /// # Errors
    /// - `InvalidInput` if no directory can be determined
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let from_var = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };

        let config_home = from_var(CONFIG_HOME_VAR)
            .or_else(dirs::config_dir)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Cannot determine config directory; set {}",
                    CONFIG_HOME_VAR
                ))
            })?;
        let cache_home = from_var(CACHE_HOME_VAR)
            .or_else(dirs::cache_dir)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Cannot determine cache directory; set {}",
                    CACHE_HOME_VAR
                ))
            })?;

        Ok(Self::new(config_home, cache_home))
    }

    pub fn config_home(&self) -> &Path {
        &self.config_home
    }

    pub fn cache_home(&self) -> &Path {
        &self.cache_home
    }

    /// `<config home>/idealista-cli/config.json`
    pub fn config_file(&self) -> PathBuf {
        self.config_home.join(APP_DIR).join(CONFIG_FILENAME)
    }

    /// `<cache home>/idealista-cli/token.json`
    pub fn token_file(&self) -> PathBuf {
        self.cache_home.join(APP_DIR).join(TOKEN_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let vars: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let dirs = StateDirs::from_lookup(lookup(&[
            ("XDG_CONFIG_HOME", "/tmp/cfg"),
            ("XDG_CACHE_HOME", "/tmp/cache"),
        ]))
        .unwrap();

        assert_eq!(
            dirs.config_file(),
            PathBuf::from("/tmp/cfg/idealista-cli/config.json")
        );
        assert_eq!(
            dirs.token_file(),
            PathBuf::from("/tmp/cache/idealista-cli/token.json")
        );
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let dirs = StateDirs::from_lookup(lookup(&[
            ("XDG_CONFIG_HOME", ""),
            ("XDG_CACHE_HOME", "/tmp/cache"),
        ]));

        // Falls back to the platform directory, which may not exist in
        // minimal environments.
        if let Ok(dirs) = dirs {
            assert_ne!(dirs.config_home(), Path::new(""));
            assert_eq!(dirs.cache_home(), Path::new("/tmp/cache"));
        }
    }

    #[test]
    fn test_explicit_dirs() {
        let dirs = StateDirs::new("/a", "/b");
        assert_eq!(dirs.config_file(), PathBuf::from("/a/idealista-cli/config.json"));
        assert_eq!(dirs.token_file(), PathBuf::from("/b/idealista-cli/token.json"));
    }
}
