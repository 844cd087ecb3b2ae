//! Command-line settings from `stagehand.toml`.
//!
//! ```toml
//! [output]
//! dir = "deploy"
//!
//! [operator]
//! initials = "jdo"
//! ```
//!
//! The working directory is searched first, then `<config dir>/stagehand/`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DeployError, DeployResult};

pub const SETTINGS_FILE: &str = "stagehand.toml";

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub operator: OperatorSettings,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct OutputSettings {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct OperatorSettings {
    pub initials: Option<String>,
}

impl Settings {
    /// Load the first settings file found, or the defaults if there is none.
    pub fn load() -> DeployResult<Self> {
        match Self::locate() {
            Some(path) => Self::from_file(&path),
            None => {
                log::debug!("no {} found, using defaults", SETTINGS_FILE);
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> DeployResult<Self> {
        let content = fs::read_to_string(path)?;
        let settings = Self::parse(&content)
            .map_err(|e| DeployError::Settings(format!("{}: {}", path.display(), e)))?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(SETTINGS_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("stagehand").join(SETTINGS_FILE))
            .filter(|path| path.exists())
    }

    /// Output directory: the flag, else the settings, else the working
    /// directory.
    pub fn output_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.output.dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Operator initials: the flag, else the settings.
    pub fn initials(&self, flag: Option<String>) -> Option<String> {
        flag.or_else(|| self.operator.initials.clone())
            .filter(|s| !s.trim().is_empty())
    }
}
