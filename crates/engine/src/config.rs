// Local configuration for the engine.
//
// Config file: `<project>/.sitewright/engine.toml`, all fields optional.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::DEFAULT_SOURCE_EXTENSIONS;

/// Path to the engine config inside a project: `<root>/.sitewright/engine.toml`.
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(".sitewright").join("engine.toml")
}

/// User-level fallback config: `<config_dir>/sitewright/engine.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sitewright").join("engine.toml"))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
}

/// Engine configuration, merged over defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Address the sync WebSocket listens on.
    pub listen_addr: SocketAddr,
    /// Project root the file store is rooted at.
    pub project_root: PathBuf,
    /// Extensions eligible for patching.
    pub source_extensions: Vec<String>,
    /// Directory completed uploads are written under (project-relative).
    pub upload_dir: String,
    /// Incomplete uploads older than this many seconds are evicted.
    pub upload_stale_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:4173".parse().expect("default listen address is valid"),
            project_root: PathBuf::from("."),
            source_extensions: DEFAULT_SOURCE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            upload_dir: "public/images".to_string(),
            upload_stale_secs: 300,
        }
    }
}

impl EngineConfig {
    /// Load from the project's config file, then the user-level file, then
    /// defaults. `project_root` always comes from the caller, not the file.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let project_file = config_path(project_root);
        let mut config = if project_file.exists() {
            Self::load_from(&project_file)?
        } else if let Some(user_file) = user_config_path().filter(|path| path.exists()) {
            Self::load_from(&user_file)?
        } else {
            Self::default()
        };
        config.project_root = project_root.to_path_buf();
        Ok(config)
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = EngineConfig::default();
        assert_eq!(config.listen_addr.port(), 4173);
        assert_eq!(config.upload_dir, "public/images");
        assert!(config.source_extensions.iter().any(|ext| ext == "tsx"));
    }

    #[test]
    fn partial_file_merges_over_defaults() {
        let config: EngineConfig =
            toml::from_str("upload_dir = \"static/assets\"").expect("partial config should parse");
        assert_eq!(config.upload_dir, "static/assets");
        assert_eq!(config.listen_addr.port(), 4173);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(dir.path()).unwrap();
        assert_eq!(config.project_root, dir.path());
        assert_eq!(config.upload_stale_secs, 300);
    }

    #[test]
    fn load_from_reads_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(
            &path,
            "listen_addr = \"0.0.0.0:9000\"\nupload_stale_secs = 60\n",
        )
        .unwrap();
        let config = EngineConfig::load_from(&path).unwrap();
        assert_eq!(config.listen_addr.to_string(), "0.0.0.0:9000");
        assert_eq!(config.upload_stale_secs, 60);
    }
}
