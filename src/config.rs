//! Configuration management for dwarf-line.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (`DWARF_LINE_CHECK_OPCODE_LENGTHS`, `DWARF_LINE_MAX_FILE_ENTRIES`)
//! 2. Project-local config file (`./dwarf-line.toml`)
//! 3. User config file (`~/.config/dwarf-line/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # dwarf-line.toml
//!
//! # Reject headers whose standard opcode argument counts disagree with DWARF
//! check_opcode_lengths = true
//!
//! # Cap on header files plus DW_LNE_define_file entries (unlimited if unset)
//! max_file_entries = 65536
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

const ENV_CHECK_OPCODE_LENGTHS: &str = "DWARF_LINE_CHECK_OPCODE_LENGTHS";
const ENV_MAX_FILE_ENTRIES: &str = "DWARF_LINE_MAX_FILE_ENTRIES";

/// dwarf-line configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Cross-check declared standard opcode argument counts against the
    /// DWARF-defined ones. Defaults to true.
    pub check_opcode_lengths: Option<bool>,

    /// Maximum number of file table entries per line program.
    /// Unlimited when unset.
    pub max_file_entries: Option<usize>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `dwarf-line.toml`
    /// 3. User config `~/.config/dwarf-line/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(user_config) = Self::load_user_config() {
            config.merge(user_config);
        }

        if let Some(local_config) = Self::load_local_config() {
            config.merge(local_config);
        }

        // Environment variables override everything
        config.apply_env_overrides();

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Whether to cross-check standard opcode argument counts.
    pub fn check_opcode_lengths(&self) -> bool {
        self.check_opcode_lengths.unwrap_or(true)
    }

    /// File table limit, if any.
    pub fn max_file_entries(&self) -> Option<usize> {
        self.max_file_entries
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid dwarf-line configuration")
    }

    /// Render the configuration as TOML, e.g. to record the effective settings.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize dwarf-line configuration")
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load user configuration from ~/.config/dwarf-line/config.toml
    fn load_user_config() -> Option<Self> {
        let config_path = Self::user_config_path()?;
        Self::load_from_file(&config_path)
    }

    /// Load project-local configuration from ./dwarf-line.toml
    fn load_local_config() -> Option<Self> {
        Self::load_from_file(Path::new("dwarf-line.toml"))
    }

    /// Load a configuration file, logging and skipping it if unusable.
    fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match Self::from_file(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                log::warn!("{:#}", e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are Some in the other config.
    fn merge(&mut self, other: Self) {
        if other.check_opcode_lengths.is_some() {
            self.check_opcode_lengths = other.check_opcode_lengths;
        }
        if other.max_file_entries.is_some() {
            self.max_file_entries = other.max_file_entries;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var(ENV_CHECK_OPCODE_LENGTHS) {
            match parse_bool(&value) {
                Some(check) => {
                    log::info!("Using {} from environment: {}", ENV_CHECK_OPCODE_LENGTHS, check);
                    self.check_opcode_lengths = Some(check);
                }
                None => log::warn!("Ignoring {}={:?}", ENV_CHECK_OPCODE_LENGTHS, value),
            }
        }
        if let Some(value) = var(ENV_MAX_FILE_ENTRIES) {
            match value.trim().parse::<usize>() {
                Ok(limit) => {
                    log::info!("Using {} from environment: {}", ENV_MAX_FILE_ENTRIES, limit);
                    self.max_file_entries = Some(limit);
                }
                Err(_) => log::warn!("Ignoring {}={:?}", ENV_MAX_FILE_ENTRIES, value),
            }
        }
    }

    /// Get the path to the user config file (for display/creation).
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("dwarf-line").join("config.toml"))
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# dwarf-line configuration
# Place this file at ~/.config/dwarf-line/config.toml or ./dwarf-line.toml

# Reject line program headers whose standard opcode argument counts disagree
# with the DWARF definitions (default: true)
check_opcode_lengths = true

# Maximum file table entries per line program (default: unlimited)
# max_file_entries = 65536
"#
        .to_string()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
