use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;

use args::{Cli, Commands};
use cli::commands::compile::{self, AssetOverrides};
use cli::commands::resolve;
use cli::config::Config;

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Compile {
            path,
            output,
            prologue,
            epilogue,
            config,
        } => {
            let config = Config::load(config.as_deref().map(Path::new))?;
            let overrides = AssetOverrides {
                prologue: prologue.clone(),
                epilogue: epilogue.clone(),
            };
            compile::compile_file(path, output.as_deref(), &overrides, &config).map(|_| ())
        }
        Commands::Resolve {
            path,
            access,
            region,
        } => resolve::resolve_path(path, access, *region).map(|_| ()),
    }
}
