//! Site configuration management for `lingon.toml`.
//!
//! # Sections
//!
//! | Section       | Purpose                                         |
//! |---------------|-------------------------------------------------|
//! | `[site]`      | Content tree location                           |
//! | `[serve]`     | Content server (port, interface)                |
//! | `[backup]`    | Timestamped backups before destructive writes   |
//! | `[templates]` | Fragment inclusion via `{[...]}` markers        |
//! | `[i18n]`      | Languages and translation backends              |
//!
//! # Example
//!
//! ```toml
//! [site]
//! root = "site"
//!
//! [serve]
//! port = 5980
//!
//! [i18n]
//! languages = ["en", "zh_cn", "zh_hk"]
//! variant = "zh_hk"
//!
//! [i18n.backends]
//! machine = ["http://localhost:1188/translate"]
//! convert = "https://api.zhconvert.org/convert"
//! ```

mod defaults;
mod error;
mod i18n;
mod serve;
mod site;

pub use error::ConfigError;
pub use i18n::{BackendsConfig, I18nConfig};

use serve::ServeConfig;
use site::SiteSection;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing lingon.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Content tree location
    #[serde(default)]
    pub site: SiteSection,

    /// Content server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Backup settings
    #[serde(default)]
    pub backup: BackupConfig,

    /// Template expansion settings
    #[serde(default)]
    pub templates: TemplatesConfig,

    /// Language set and translation backends
    #[serde(default)]
    pub i18n: I18nConfig,
}

/// `[backup]` section - timestamped backups before destructive writes.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BackupConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,
}

/// `[templates]` section - `{[...]}` fragment inclusion.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct TemplatesConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| PathBuf::from("./"));
        let root = Self::normalize_path(&root);

        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.site.root = Self::normalize_path(&root.join(&self.site.root));

        if let Commands::Serve { interface, port } = &cli.command {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        if !self.config_path.exists() {
            bail!("Config file not found");
        }

        if !self.site.root.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[site.root] `{}` is not a directory",
                self.site.root.display()
            )));
        }

        let i18n = &self.i18n;
        if i18n.enable {
            if !i18n.languages.contains(&i18n.source) {
                bail!(ConfigError::Validation(format!(
                    "[i18n.source] `{}` missing from [i18n.languages]",
                    i18n.source
                )));
            }
            if !i18n.languages.contains(&i18n.primary) {
                bail!(ConfigError::Validation(format!(
                    "[i18n.primary] `{}` missing from [i18n.languages]",
                    i18n.primary
                )));
            }
            if let Some(variant) = &i18n.variant {
                if !i18n.languages.contains(variant) {
                    bail!(ConfigError::Validation(format!(
                        "[i18n.variant] `{variant}` missing from [i18n.languages]"
                    )));
                }
                if i18n.backends.machine.is_empty() && i18n.backends.convert.is_none() {
                    bail!(ConfigError::Validation(
                        "[i18n.variant] needs a machine backend or a convert endpoint".into()
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SiteConfig::from_str("").unwrap();
        assert!(config.backup.enable);
        assert!(config.templates.enable);
        assert!(config.i18n.enable);
    }

    #[test]
    fn test_backup_and_templates_toggles() {
        let config = SiteConfig::from_str(
            r#"
            [backup]
            enable = false

            [templates]
            enable = false
        "#,
        )
        .unwrap();
        assert!(!config.backup.enable);
        assert!(!config.templates.enable);
    }

    #[test]
    fn test_unknown_top_level_section_rejected() {
        let result = SiteConfig::from_str(
            r#"
            [no_such_section]
            x = 1
        "#,
        );
        assert!(result.is_err());
    }
}
