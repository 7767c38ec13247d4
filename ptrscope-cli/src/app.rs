use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ptrscope - points-to analysis and indirect-call resolution for SSA IR
#[derive(Debug, Parser)]
#[command(name = "ptrscope", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the possible callees of every call site.
    Resolve {
        /// Path to the textual IR file.
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Compute per-block live values.
    Liveness {
        /// Path to the textual IR file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Analyze only the named function.
        #[arg(short, long, value_name = "NAME")]
        function: Option<String>,
    },

    /// Print the parsed module back as text.
    Dump {
        /// Path to the textual IR file.
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Display a module overview: functions, blocks, and instruction counts.
    Info {
        /// Path to the textual IR file.
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}
