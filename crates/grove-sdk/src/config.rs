use std::fs;
use std::path::Path;

use grove_merge::{MergeLabels, MergeOptions, DEFAULT_MARKER_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{GroveError, GroveResult};

/// The only repository format this version reads and writes.
pub const FORMAT_VERSION: u32 = 0;

/// Name of the config file inside the repository directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Repository configuration, stored as TOML.
///
/// Missing sections and keys fall back to their defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroveConfig {
    pub core: CoreConfig,
    pub merge: MergeConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub format_version: u32,
    /// zstd level for loose objects.
    pub compression_level: i32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            compression_level: 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub marker_size: usize,
    pub ours_label: String,
    pub base_label: String,
    pub theirs_label: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        let labels = MergeLabels::default();
        Self {
            marker_size: DEFAULT_MARKER_SIZE,
            ours_label: labels.ours,
            base_label: labels.base,
            theirs_label: labels.theirs,
        }
    }
}

impl GroveConfig {
    pub fn load(path: &Path) -> GroveResult<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> GroveResult<()> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Reject settings this version cannot honor.
    pub fn validate(&self) -> GroveResult<()> {
        if self.core.format_version != FORMAT_VERSION {
            return Err(GroveError::UnsupportedFormat(self.core.format_version));
        }
        if !(1..=22).contains(&self.core.compression_level) {
            return Err(GroveError::InvalidConfig(format!(
                "core.compression_level must be between 1 and 22, got {}",
                self.core.compression_level
            )));
        }
        if self.merge.marker_size == 0 {
            return Err(GroveError::InvalidConfig(
                "merge.marker_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            labels: MergeLabels {
                ours: self.merge.ours_label.clone(),
                base: self.merge.base_label.clone(),
                theirs: self.merge.theirs_label.clone(),
            },
            marker_size: self.merge.marker_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = GroveConfig::default();
        assert_eq!(c.core.format_version, 0);
        assert_eq!(c.core.compression_level, 3);
        assert_eq!(c.merge.marker_size, 7);
        assert_eq!(c.merge.ours_label, "ours");
        assert_eq!(c.merge_options(), MergeOptions::default());
        c.validate().unwrap();
    }

    #[test]
    fn partial_file_uses_defaults() {
        let c: GroveConfig = toml::from_str("[merge]\nmarker_size = 9\n").unwrap();
        assert_eq!(c.merge.marker_size, 9);
        assert_eq!(c.merge.theirs_label, "theirs");
        assert_eq!(c.core, CoreConfig::default());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut c = GroveConfig::default();
        c.merge.ours_label = "HEAD".into();
        c.save(&path).unwrap();
        assert_eq!(GroveConfig::load(&path).unwrap(), c);
    }

    #[test]
    fn rejects_unknown_format_and_bad_values() {
        let mut c = GroveConfig::default();
        c.core.format_version = 1;
        assert!(matches!(c.validate(), Err(GroveError::UnsupportedFormat(1))));

        let mut c = GroveConfig::default();
        c.merge.marker_size = 0;
        assert!(matches!(c.validate(), Err(GroveError::InvalidConfig(_))));

        let mut c = GroveConfig::default();
        c.core.compression_level = 40;
        assert!(matches!(c.validate(), Err(GroveError::InvalidConfig(_))));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "core = [").unwrap();
        assert!(matches!(
            GroveConfig::load(&path),
            Err(GroveError::ConfigParse(_))
        ));
    }
}
