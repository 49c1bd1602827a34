//! Exporter configuration: an optional TOML file plus command-line
//! overrides.

use graphio_core::solver::PruneLevel;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Looked for in the working directory when no config file is given.
pub const DEFAULT_CONFIG_FILE: &str = "graphio-export.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {file}: {source}")]
    Read {
        file: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config file {file}: {detail}")]
    Parse { file: PathBuf, detail: String },
    #[error("prune level must be 0, 1, or 2, got {0}")]
    InvalidPruneLevel(u8),
}

/// The TOML shape of the config file. All fields optional; command-line
/// flags win over file values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub data_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub prune_level: Option<u8>,
    pub log_entries: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            file: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

/// Fully resolved exporter settings.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub data_dir: PathBuf,
    pub output: PathBuf,
    pub prune_level: PruneLevel,
    /// Log every emitted entry.
    pub log_entries: bool,
}

impl ExportConfig {
    /// Merge a config file with command-line overrides. `file` may be the
    /// default-constructed empty config when no file exists.
    pub fn resolve(
        file: ConfigFile,
        data_dir: Option<PathBuf>,
        output: Option<PathBuf>,
        prune_level: Option<u8>,
        log_entries: bool,
    ) -> Result<Self, ConfigError> {
        let level_index = prune_level.or(file.prune_level).unwrap_or(1);
        let prune_level = PruneLevel::from_index(level_index)
            .ok_or(ConfigError::InvalidPruneLevel(level_index))?;
        Ok(Self {
            data_dir: data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from("data")),
            output: output
                .or(file.output)
                .unwrap_or_else(|| PathBuf::from("game_data.bin")),
            prune_level,
            log_entries: log_entries || file.log_entries.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_or_flags() {
        let config =
            ExportConfig::resolve(ConfigFile::default(), None, None, None, false).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.output, PathBuf::from("game_data.bin"));
        assert_eq!(config.prune_level, PruneLevel::Researched);
        assert!(!config.log_entries);
    }

    #[test]
    fn flags_override_file_values() {
        let file: ConfigFile = toml::from_str(
            "data_dir = \"world\"\noutput = \"out.bin\"\nprune_level = 0\nlog_entries = true\n",
        )
        .unwrap();
        let config = ExportConfig::resolve(
            file,
            Some(PathBuf::from("other")),
            None,
            Some(2),
            false,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("other"));
        assert_eq!(config.output, PathBuf::from("out.bin"));
        assert_eq!(config.prune_level, PruneLevel::Reachable);
        assert!(config.log_entries);
    }

    #[test]
    fn invalid_prune_level_rejected() {
        let result = ExportConfig::resolve(ConfigFile::default(), None, None, Some(3), false);
        assert!(matches!(result, Err(ConfigError::InvalidPruneLevel(3))));
    }

    #[test]
    fn unknown_file_keys_rejected() {
        let result: Result<ConfigFile, _> = toml::from_str("prune_lvl = 1\n");
        assert!(result.is_err());
    }
}
