use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::SmoothingSet;
use crate::pipeline::FixOptions;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub extension: String,
    /// 1 processes files one at a time, 0 lets rayon pick.
    pub thread_count: usize,
    pub preserve_extra_attributes: bool,
    pub smoothing: SmoothingSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("in"),
            output_dir: PathBuf::from("out"),
            extension: "dmi".to_string(),
            thread_count: 1,
            preserve_extra_attributes: false,
            smoothing: SmoothingSet::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("dmi-dirfix").join("config.toml"))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse config")
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("In {}", path.display()))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("Failed to write config {}", path.display()))
    }

    /// An explicit path must exist; otherwise the user config file is used
    /// when present, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn fix_options(&self) -> FixOptions {
        FixOptions::new()
            .with_smoothing(self.smoothing.clone())
            .with_extra_attributes(self.preserve_extra_attributes)
    }
}
