use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "adasm")]
#[command(about = "Ada subset to ARM assembly backend", long_about = None)]
pub struct Cli {
    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate assembly from a recorded compilation unit (.json)
    Compile {
        /// Compilation unit: AST, symbol table and event stream
        path: String,
        /// Output assembly file (defaults to the input with the configured suffix)
        #[arg(short, long)]
        output: Option<String>,
        /// Printing routines placed before the generated code
        #[arg(long)]
        prologue: Option<String>,
        /// Entry glue placed after the runtime routines
        #[arg(long)]
        epilogue: Option<String>,
        /// Configuration file (defaults to ./adasm.toml when present)
        #[arg(long)]
        config: Option<String>,
    },
    /// Show where a dotted access path lives, as seen from one region
    Resolve {
        /// Compilation unit whose symbol table is queried
        path: String,
        /// Access path, e.g. `seg.to.y`
        access: String,
        /// Region to resolve from (defaults to the outermost one)
        #[arg(long)]
        region: Option<u32>,
    },
}
