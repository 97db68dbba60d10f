// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line settings stored as `rigforge.ron`.

use rigforge_graph::{ConnectionPolicy, Format};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file looked up in the working directory
pub const SETTINGS_FILE_NAME: &str = "rigforge.ron";

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Command line settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Settings format version
    pub version: u32,
    /// Name given to a rig whose document has none
    pub default_rig_name: String,
    /// Format used when an output path has no extension
    pub default_format: Format,
    /// How repeated connections to one input are treated
    pub connection_policy: ConnectionPolicy,
    /// Default tracing filter, applied on top of `RUST_LOG`
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            default_rig_name: rigforge_graph::rig::DEFAULT_RIG_NAME.to_string(),
            default_format: Format::Json,
            connection_policy: ConnectionPolicy::Permissive,
            log_filter: "rigforge=info,rigforge_graph=info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = ron::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        // Version check
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }

        Ok(settings)
    }

    /// Explicit path, then `rigforge.ron` in `dir`, then defaults
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> std::io::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = dir.join(SETTINGS_FILE_NAME);
        if local.is_file() {
            return Self::load(&local);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.default_rig_name, "rig");
        assert_eq!(settings.connection_policy, ConnectionPolicy::Permissive);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            "(connection_policy: strict, default_format: ron)",
        )
        .unwrap();

        let settings = Settings::resolve(None, dir.path()).unwrap();
        assert_eq!(settings.connection_policy, ConnectionPolicy::Strict);
        assert_eq!(settings.default_format, Format::Ron);
        assert_eq!(settings.default_rig_name, "rig");
    }

    #[test]
    fn test_explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE_NAME), "(default_rig_name: \"local\")").unwrap();
        let explicit = dir.path().join("other.ron");
        let settings = Settings {
            default_rig_name: "explicit".to_string(),
            ..Settings::default()
        };
        let text = ron::ser::to_string_pretty(&settings, ron::ser::PrettyConfig::default()).unwrap();
        std::fs::write(&explicit, text).unwrap();

        let loaded = Settings::resolve(Some(&explicit), dir.path()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::resolve(None, dir.path()).unwrap(), Settings::default());

        let missing = dir.path().join("missing.ron");
        assert!(Settings::resolve(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn test_newer_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "(version: 99)").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
