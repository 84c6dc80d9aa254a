//! CLI module for groundcast
//!
//! Provides command-line interface for:
//! - validate: Decode a wire payload against a registered schema
//! - serialize: Encode an internal value back to wire names
//! - schemas: List the registry
//! - serve: Expose the same operations over HTTP

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, TransformArgs};
pub use commands::{run, run_command, schema_listing, transform, Config};
pub use errors::{CliError, CliResult};
pub use io::{error_envelope, parse_payload, read_payload, success_envelope, write_json};
