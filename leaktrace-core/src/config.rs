use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level leaktrace configuration, matching `leaktrace.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaktraceConfig {
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub translator: TranslatorSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSection {
    /// Link-count cap for single-shortest-path searches.
    #[serde(default = "default_max_depth")]
    pub default_max_depth: usize,
    /// Chain cap for multi-path searches.
    #[serde(default = "default_chain_limit")]
    pub default_chain_limit: usize,
}

fn default_max_depth() -> usize {
    5
}

fn default_chain_limit() -> usize {
    3
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            default_max_depth: default_max_depth(),
            default_chain_limit: default_chain_limit(),
        }
    }
}

/// External raw-capture translator invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorSection {
    /// Executable invoked as `<command> <raw-path> <json-path>`.
    pub command: Option<String>,
}

impl LeaktraceConfig {
    /// Load configuration from `path`, failing if the file is missing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        let config: Self =
            toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist. A present-but-malformed file is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.default_max_depth == 0 {
            return Err(ConfigError::Invalid(
                "analysis.default_max_depth must be at least 1".to_string(),
            ));
        }
        if self.analysis.default_chain_limit == 0 {
            return Err(ConfigError::Invalid(
                "analysis.default_chain_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
