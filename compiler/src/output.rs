use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codegen::Compiler;
use crate::error::CompilerError;
use crate::runtime;

/// Where the two fixed assembly texts live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// Printing routines (`println_int`, `println_char`); goes first.
    pub prologue: PathBuf,
    /// Program entry glue; goes last.
    pub epilogue: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            prologue: PathBuf::from("assets/print.s"),
            epilogue: PathBuf::from("assets/its.s"),
        }
    }
}

/// Verbatim text of the prologue and epilogue. Never parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assets {
    pub prologue: String,
    pub epilogue: String,
}

impl Assets {
    pub fn new(prologue: impl Into<String>, epilogue: impl Into<String>) -> Self {
        Self {
            prologue: prologue.into(),
            epilogue: epilogue.into(),
        }
    }

    pub fn load(paths: &AssetPaths) -> Result<Self, CompilerError> {
        Ok(Self {
            prologue: read_asset(&paths.prologue)?,
            epilogue: read_asset(&paths.epilogue)?,
        })
    }
}

fn read_asset(path: &Path) -> Result<String, CompilerError> {
    fs::read_to_string(path).map_err(|source| CompilerError::Asset {
        path: path.to_path_buf(),
        source,
    })
}

fn push_section(out: &mut String, text: &str) {
    out.push_str(text);
    if !text.is_empty() && !text.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
}

impl Compiler<'_> {
    /// Concatenates the whole program: prologue, scope blocks (latest
    /// completed first), `mul`, `div`, epilogue.
    pub fn finish(&self, assets: &Assets) -> Result<String, CompilerError> {
        if !self.frames.is_empty() {
            return Err(CompilerError::UnclosedScopes(self.frames.len()));
        }
        if !self.calls.is_empty() {
            return Err(CompilerError::DanglingCalls(self.calls.len()));
        }

        let mut out = String::new();
        push_section(&mut out, &assets.prologue);
        for block in self.completed.iter().rev() {
            push_section(&mut out, block);
        }
        push_section(&mut out, runtime::MUL);
        push_section(&mut out, runtime::DIV);
        push_section(&mut out, &assets.epilogue);
        Ok(out)
    }

    pub fn write_output(&self, path: &Path, assets: &Assets) -> Result<(), CompilerError> {
        let text = self.finish(assets)?;
        fs::write(path, &text)?;
        debug!(path = %path.display(), bytes = text.len(), "assembly written");
        Ok(())
    }
}
