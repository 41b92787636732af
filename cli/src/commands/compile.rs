use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use compiler::{replay, Assets, CompilationUnit};
use tracing::info;

use crate::config::Config;

/// Asset paths given on the command line; they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct AssetOverrides {
    pub prologue: Option<String>,
    pub epilogue: Option<String>,
}

/// Replays the unit at `path` and writes the assembly. Returns where it went.
pub fn compile_file(
    path: &str,
    output: Option<&str>,
    overrides: &AssetOverrides,
    config: &Config,
) -> Result<PathBuf> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let unit = CompilationUnit::from_json(&content)
        .with_context(|| format!("{path} is not a compilation unit"))?;

    let mut paths = config.assets.clone();
    if let Some(prologue) = &overrides.prologue {
        paths.prologue = PathBuf::from(prologue);
    }
    if let Some(epilogue) = &overrides.epilogue {
        paths.epilogue = PathBuf::from(epilogue);
    }
    let assets = Assets::load(&paths).context("Failed to load assembly assets")?;

    let compiler = replay(&unit).context("Code generation failed")?;
    let target = match output {
        Some(out) => PathBuf::from(out),
        None => config.output_for(Path::new(path)),
    };
    compiler
        .write_output(&target, &assets)
        .context("Failed to write assembly")?;

    info!(
        blocks = compiler.completed_blocks().len(),
        target = %target.display(),
        "compiled"
    );
    println!(
        "Generated {} scope block(s) into {}",
        compiler.completed_blocks().len(),
        target.display()
    );
    Ok(target)
}
