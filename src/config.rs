//! Build configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BuildConfig {
    /// Stars kept per node before it subdivides.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Deepest node level; a face with more coincident stars than fit fails the build.
    #[serde(default = "default_max_depth")]
    pub max_depth: u8,
    /// Stars at or below this magnitude are dropped (the sun).
    #[serde(default = "default_min_magnitude")]
    pub min_magnitude: f64,
    /// Directory tile files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl BuildConfig {
    /// Loads `path` if it exists, otherwise falls back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config = Self::from_toml(&contents)?;
            info!(path = %path.display(), "loaded config");
            Ok(config)
        } else {
            info!(path = %path.display(), "no config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            max_depth: default_max_depth(),
            min_magnitude: default_min_magnitude(),
            output_dir: default_output_dir(),
        }
    }
}

// 3k stars per node gives about 21 nodes per face on the full HYG catalog.
fn default_capacity() -> usize {
    3000
}

fn default_max_depth() -> u8 {
    24
}

fn default_min_magnitude() -> f64 {
    -25.0
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
