//! zdd.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "zdd.toml";

/// Environment variable overriding the platform CLI executable.
pub const CF_BINARY_ENV: &str = "CF_ZDD_CF_BINARY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZddConfig {
    #[serde(default)]
    pub cf: CfConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CfConfig {
    /// Platform CLI executable, `cf` when unset.
    pub binary: Option<String>,
    /// Directory holding `.cf/config.json`, `$CF_HOME` or `$HOME` when unset.
    pub home: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Scale-over duration for `deploy-zdd` when `--duration` is absent.
    pub zdd_duration: String,
    /// Blue-green readiness poll interval.
    pub poll_interval: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            zdd_duration: "480s".to_string(),
            poll_interval: "20s".to_string(),
        }
    }
}

impl ZddConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ZddConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else `zdd.toml` in the working directory if it
    /// exists, else defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        parse_duration(&self.defaults.zdd_duration)
            .map_err(|e| anyhow::anyhow!("defaults.zdd_duration: {e}"))?;
        parse_duration(&self.defaults.poll_interval)
            .map_err(|e| anyhow::anyhow!("defaults.poll_interval: {e}"))?;
        Ok(())
    }

    /// Platform CLI executable: env override, then config, then `cf`.
    pub fn cf_binary(&self) -> String {
        std::env::var(CF_BINARY_ENV)
            .ok()
            .filter(|b| !b.is_empty())
            .or_else(|| self.cf.binary.clone())
            .unwrap_or_else(|| "cf".to_string())
    }

    pub fn poll_interval(&self) -> Duration {
        parse_duration(&self.defaults.poll_interval).unwrap_or(Duration::from_secs(20))
    }
}
