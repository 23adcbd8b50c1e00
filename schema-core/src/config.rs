#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::diagnostics::Collector;
use crate::error::ConfigError;

/// Completion settings, usually read from the `[complete]` table of a
/// project file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CompleteConfig {
    /// Prefix forbidden on declared property and relation names.
    #[serde(default = "default_reserved_prefix")]
    pub reserved_prefix: String,

    /// Stored diagnostics per collector; extra ones are only counted.
    #[serde(default)]
    pub max_diagnostics: Option<usize>,

    /// Run the local pass of a batch on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_reserved_prefix() -> String {
    "_".to_string()
}

fn default_parallel() -> bool {
    true
}

impl Default for CompleteConfig {
    fn default() -> Self {
        CompleteConfig {
            reserved_prefix: default_reserved_prefix(),
            max_diagnostics: None,
            parallel: default_parallel(),
        }
    }
}

impl CompleteConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError {
            message: format!("invalid completion config: {e}"),
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError {
            message: format!("failed to serialize completion config: {e}"),
        })
    }

    /// A collector honouring `max-diagnostics`.
    pub fn collector(&self) -> Collector {
        Collector::with_limit(self.max_diagnostics)
    }
}
