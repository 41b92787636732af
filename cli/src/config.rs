//! `adasm.toml`: where the fixed assembly assets live and how output files
//! are named.
//!
//! ```toml
//! [assets]
//! prologue = "assets/print.s"
//! epilogue = "assets/its.s"
//!
//! [output]
//! suffix = "s"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use compiler::AssetPaths;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_CONFIG: &str = "adasm.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub assets: AssetPaths,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Extension given to the assembly file when no output path is passed.
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { suffix: "s".into() }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    /// Reads `explicit` if given, otherwise `./adasm.toml` when it exists,
    /// otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG);
                if !fallback.exists() {
                    debug!("no {DEFAULT_CONFIG}, using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        debug!(path = %path.display(), "config loaded");
        Self::from_toml(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Output path for `input` when none was given explicitly.
    pub fn output_for(&self, input: &Path) -> PathBuf {
        input.with_extension(&self.output.suffix)
    }
}
