use crate::extraction::MarkerConvention;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// User settings read from `~/.config/agri-assistant/config.json`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Delimiter markers accepted around card blocks
    pub markers: MarkerConvention,
    /// Replay recordings without their recorded timing
    pub fast_playback: bool,
    /// Overrides the directory chat sessions are stored in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_dir: Option<PathBuf>,
}

/// Get the path to the configuration file
pub fn get_config_path() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let config_dir = home.join(".config").join("agri-assistant");
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("config.json"))
}

/// Load the configuration, falling back to defaults when no file exists
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&temp_dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.markers, MarkerConvention::Both);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"markers": "triple"}"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.markers, MarkerConvention::Triple);
        assert!(!config.fast_playback);
        assert!(config.sessions_dir.is_none());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"markers": "quadruple"}"#).unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }
}
