use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf, time::Duration};

use anyhow::Context as _;

use crate::util;

pub const APP_NAME: &str = "sjudge";

/// User-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    #[serde(default = "GlobalConfig::default_timeout_millis")]
    pub timeout_millis: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            timeout_millis: Self::default_timeout_millis(),
        }
    }
}

impl GlobalConfig {
    pub const FILENAME: &str = "settings.toml";

    pub fn filepath() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(Self::FILENAME))
    }

    fn default_timeout_millis() -> u64 {
        10_000
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_file_or_default() -> anyhow::Result<Self> {
        let Some(path) = Self::filepath() else {
            return Ok(Self::default())
        };
        let toml = match std::fs::read_to_string(&path) {
            Ok(toml) => toml,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Cannot read {:?}", util::replace_homedir_to_tilde(path.clone()))
                })
            }
        };
        Self::from_toml(&toml).with_context(|| {
            format!("Invalid settings {:?}", util::replace_homedir_to_tilde(path.clone()))
        })
    }
}
