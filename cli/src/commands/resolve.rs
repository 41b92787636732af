use std::fs;

use anyhow::{anyhow, Context, Result};
use compiler::CompilationUnit;
use resolve::{Anchor, Shape};

/// Describes where `access` (a dotted path) lives as seen from `region`.
pub fn resolve_path(path: &str, access: &str, region: Option<u32>) -> Result<String> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let unit = CompilationUnit::from_json(&content)
        .with_context(|| format!("{path} is not a compilation unit"))?;
    let symbols = &unit.symbols;

    let from = match region {
        Some(region) => region,
        None => symbols
            .root()
            .ok_or_else(|| anyhow!("symbol table has no outermost region"))?,
    };
    let segments: Vec<&str> = access.split('.').collect();
    let resolved = symbols
        .resolve_access(from, &segments)
        .with_context(|| format!("Cannot resolve `{access}` from region {from}"))?;

    let anchor = match resolved.anchor {
        Anchor::Local => "local",
        Anchor::Parameter => "parameter",
    };
    let shape = match &resolved.shape {
        Shape::Word => "word".to_string(),
        Shape::Record(layout) => format!("record {} ({} bytes)", layout.name, layout.size),
    };
    let report = format!(
        "{access}: region {}, {} hop(s), {anchor} displacement {}, {shape}",
        resolved.declared_in, resolved.hops, resolved.displacement
    );
    println!("{report}");
    Ok(report)
}
