//! Configuration management.
//!
//! Configuration is read from `~/.config/lectern/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is
//! created. Missing fields fall back to defaults.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::app::{LecternError, Result};
use crate::normalizer::SiteInfo;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Override for the database location.
    pub db_path: Option<PathBuf>,
    /// Provider domains the reader will import from.
    pub sites: Vec<SiteInfo>,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "lectern/0.1.0".into(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            sites: vec![
                SiteInfo {
                    domain: "syosetu.com".into(),
                    example: "https://ncode.syosetu.com/n0000a/1/".into(),
                },
                SiteInfo {
                    domain: "kakuyomu.jp".into(),
                    example: "https://kakuyomu.jp/works/1/episodes/1".into(),
                },
                SiteInfo {
                    domain: "cbeta.org".into(),
                    example: "https://cbeta.org/T/T0001".into(),
                },
            ],
            fetch: FetchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating a commented
    /// default file on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            LecternError::Config(format!("{}: {e}", config_path.display()))
        })?;

        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| LecternError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("lectern").join("config.toml"))
    }

    fn create_default_config(path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(Self::default_config_content().as_bytes())?;
        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Lectern Configuration
#
# db_path overrides the chapter database location
# (default: the platform data dir, e.g. ~/.local/share/lectern/lectern.db).
#
# Each [[sites]] entry is a provider domain chapters can be imported from;
# subdomains are matched automatically.

# db_path = "/path/to/lectern.db"

[fetch]
timeout_secs = 10
user_agent = "lectern/0.1.0"

[[sites]]
domain = "syosetu.com"
example = "https://ncode.syosetu.com/n0000a/1/"

[[sites]]
domain = "kakuyomu.jp"
example = "https://kakuyomu.jp/works/1/episodes/1"

[[sites]]
domain = "cbeta.org"
example = "https://cbeta.org/T/T0001"
"##
        .to_string()
    }
}
