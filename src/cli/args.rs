//! CLI argument definitions using clap
//!
//! Commands:
//! - groundcast validate --schema <id> [--version v] [--type T] [--input file]
//! - groundcast serialize --schema <id> [--version v] [--type T] [--input file]
//! - groundcast schemas
//! - groundcast serve [--port p]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// groundcast - schema-driven validation for ground.news payloads
#[derive(Parser, Debug)]
#[command(name = "groundcast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Lowest log severity written to stderr (trace, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Which payload to read and how to walk it
#[derive(Args, Debug, Clone)]
pub struct TransformArgs {
    /// Schema identifier
    #[arg(long)]
    pub schema: String,

    /// Schema version; may be left out when only one is registered
    #[arg(long)]
    pub version: Option<String>,

    /// Type to walk from; defaults to the schema root
    #[arg(long = "type")]
    pub type_name: Option<String>,

    /// Read the payload from this file instead of stdin
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a wire payload and print it with internal field names
    Validate(TransformArgs),

    /// Map an internal value back to wire field names
    Serialize(TransformArgs),

    /// List registered schemas
    Schemas,

    /// Serve validate/serialize over HTTP
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
