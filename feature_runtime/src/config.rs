//! Build profiles — which flags each build configuration asks for.
//!
//! ```toml
//! rules = "rules.json"      # optional, reference table when absent
//! deny_warnings = false     # promote diagnostics to failures
//! max_rounds = 64           # optional round budget override
//!
//! [profiles.gpu]
//! features = ["LB_BOUNDARIES_GPU", "ELECTROSTATICS", "FFTW"]
//! deny_warnings = true      # per-profile override
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use feature_resolver::reference::reference_table;
use feature_resolver::{ResolverConfig, RuleTable};

use crate::rule_file::{import_rules_from_file, RuleFileError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config I/O: {0}")]
    Io(#[from] io::Error),

    #[error("rules: {0}")]
    Rules(#[from] RuleFileError),

    #[error("config defines no profiles")]
    NoProfiles,

    #[error("max_rounds must be at least 1, got {0}")]
    InvalidMaxRounds(usize),
}

/// One named build configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    #[serde(default)]
    pub features: Vec<String>,
    /// Overrides the top-level `deny_warnings` when set.
    #[serde(default)]
    pub deny_warnings: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    #[serde(default)]
    pub rules: Option<PathBuf>,
    #[serde(default)]
    pub deny_warnings: bool,
    #[serde(default)]
    pub max_rounds: Option<usize>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl BuildConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: BuildConfig = toml::from_str(s)?;
        if config.profiles.is_empty() {
            return Err(ConfigError::NoProfiles);
        }
        if let Some(n @ 0) = config.max_rounds {
            return Err(ConfigError::InvalidMaxRounds(n));
        }
        Ok(config)
    }

    /// Load from disk. A relative `rules` path is taken relative to the
    /// config file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        if let (Some(rules), Some(dir)) = (config.rules.as_mut(), path.parent()) {
            if rules.is_relative() {
                *rules = dir.join(&*rules);
            }
        }
        debug!(
            path = %path.display(),
            profiles = config.profiles.len(),
            "build config loaded"
        );
        Ok(config)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            max_rounds: self.max_rounds,
        }
    }

    /// The configured rule table, or the reference table.
    pub fn load_rules(&self) -> Result<RuleTable, ConfigError> {
        match &self.rules {
            Some(path) => Ok(import_rules_from_file(path)?),
            None => Ok(reference_table()),
        }
    }

    pub fn denies_warnings(&self, profile: &str) -> bool {
        self.profiles
            .get(profile)
            .and_then(|p| p.deny_warnings)
            .unwrap_or(self.deny_warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
deny_warnings = true
max_rounds = 64

[profiles.cpu]
features = ["ELECTROSTATICS", "FFTW"]

[profiles.legacy]
features = ["P3M"]
deny_warnings = false
"#;

    #[test]
    fn missing_rules_file_is_a_rules_error() {
        let config = BuildConfig::from_toml_str(
            "rules = \"/nonexistent/feature_rules.json\"\n[profiles.a]\nfeatures = []\n",
        )
        .unwrap();
        let err = config.load_rules().unwrap_err();
        assert!(matches!(err, ConfigError::Rules(RuleFileError::Io(_))));
    }

    #[test]
    fn zero_round_budget_is_a_config_error() {
        let err = BuildConfig::from_toml_str(
            "max_rounds = 0\n[profiles.empty]\nfeatures = []\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMaxRounds(0)));
    }

    #[test]
    fn parses_profiles_and_overrides() {
        let config = BuildConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.profiles["cpu"].features, vec!["ELECTROSTATICS", "FFTW"]);
        assert!(config.denies_warnings("cpu"));
        assert!(!config.denies_warnings("legacy"));
        assert_eq!(config.resolver_config().max_rounds, Some(64));
        assert!(config.rules.is_none());
    }

    #[test]
    fn absent_rules_means_reference_table() {
        let config = BuildConfig::from_toml_str(SAMPLE).unwrap();
        let table = config.load_rules().unwrap();
        assert!(table.is_derived("P3M"));
    }

    #[test]
    fn no_profiles_is_an_error() {
        assert!(matches!(
            BuildConfig::from_toml_str("deny_warnings = true"),
            Err(ConfigError::NoProfiles)
        ));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let toml = "[profiles.a]\nfeatures = []\nfeaturez = []\n";
        assert!(matches!(
            BuildConfig::from_toml_str(toml),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn relative_rules_path_follows_config_file() {
        let dir = std::env::temp_dir()
            .join("feature_config_tests")
            .join("relative_rules");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("build.toml");
        fs::write(&path, "rules = \"rules.json\"\n[profiles.a]\nfeatures = []\n").unwrap();

        let config = BuildConfig::load(&path).unwrap();
        assert_eq!(config.rules, Some(dir.join("rules.json")));
    }
}
