//! CLI command implementations
//!
//! Every command loads the configuration, builds the schema registry
//! (built-ins first, then the configured directory), and dispatches.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::catalog;
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::schema::{Direction, SchemaLoader, SchemaTransformer};

use super::args::{Cli, Command, TransformArgs};
use super::errors::{CliError, CliResult};
use super::io::{error_envelope, read_payload, success_envelope, write_json};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory of additional schema files (optional)
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,

    /// Register the embedded ground.news schemas (default: true)
    #[serde(default = "default_include_builtins")]
    pub include_builtins: bool,

    /// Pretty-print command output (default: false)
    #[serde(default)]
    pub pretty: bool,

    /// Lowest log severity written (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HTTP server settings
    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_include_builtins() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_dir: None,
            include_builtins: default_include_builtins(),
            pretty: false,
            log_level: default_log_level(),
            http: HttpServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::Config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if !self.include_builtins && self.schema_dir.is_none() {
            return Err(CliError::Config(
                "No schemas configured: set schema_dir or include_builtins".into(),
            ));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(CliError::Config(format!(
                "Invalid log_level: '{}'",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Builds the schema registry this configuration describes
    pub fn build_loader(&self) -> CliResult<SchemaLoader> {
        let mut loader = match &self.schema_dir {
            Some(dir) => SchemaLoader::with_dir(dir),
            None => SchemaLoader::new(),
        };

        if self.include_builtins {
            catalog::register_builtins(&mut loader)?;
        }
        loader.load_all()?;

        Ok(loader)
    }
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}

/// Run an already-parsed command line
pub fn run_command(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let severity = Severity::parse(level)
        .ok_or_else(|| CliError::Config(format!("Invalid log level: '{}'", level)))?;
    Logger::set_min_severity(severity);

    let config_source = cli
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<defaults>".to_string());
    log_event_with_fields(Event::ConfigLoaded, &[("source", config_source.as_str())]);

    let loader = config.build_loader()?;
    let count = loader.schema_count().to_string();
    log_event_with_fields(Event::SchemasLoaded, &[("count", count.as_str())]);

    match cli.command {
        Command::Validate(args) => transform(&loader, Direction::Decode, &args, config.pretty),
        Command::Serialize(args) => transform(&loader, Direction::Encode, &args, config.pretty),
        Command::Schemas => list_schemas(&loader, config.pretty),
        Command::Serve { port } => serve(config, loader, port),
    }
}

/// Runs one payload through the registry and prints the envelope
pub fn transform(
    loader: &SchemaLoader,
    direction: Direction,
    args: &TransformArgs,
    pretty: bool,
) -> CliResult<()> {
    let (done, rejected) = match direction {
        Direction::Decode => (Event::ValidationComplete, Event::ValidationRejected),
        Direction::Encode => (Event::SerializationComplete, Event::SerializationRejected),
    };

    match transform_payload(loader, direction, args) {
        Ok(data) => {
            log_event_with_fields(done, &[("schema", args.schema.as_str())]);
            write_json(&success_envelope(data), pretty)
        }
        Err(err) => {
            log_event_with_fields(
                rejected,
                &[("schema", args.schema.as_str()), ("code", err.code())],
            );
            write_json(&error_envelope(&err), pretty)?;
            Err(err)
        }
    }
}

fn transform_payload(
    loader: &SchemaLoader,
    direction: Direction,
    args: &TransformArgs,
) -> CliResult<Value> {
    let payload = read_payload(args.input.as_deref())?;
    let transformer = SchemaTransformer::new(loader);
    let version = args.version.as_deref();
    let type_name = args.type_name.as_deref();

    let out = match direction {
        Direction::Decode => transformer.validate_document(&args.schema, version, type_name, &payload)?,
        Direction::Encode => transformer.serialize_document(&args.schema, version, type_name, &payload)?,
    };
    Ok(out)
}

/// Summaries of every registered schema
pub fn schema_listing(loader: &SchemaLoader) -> Value {
    let schemas: Vec<Value> = loader
        .all_schemas()
        .into_iter()
        .map(|s| {
            json!({
                "schema_id": s.schema_id,
                "schema_version": s.schema_version,
                "root": s.root,
                "types": s.types.len(),
            })
        })
        .collect();

    json!({ "schemas": schemas, "total": loader.schema_count() })
}

fn list_schemas(loader: &SchemaLoader, pretty: bool) -> CliResult<()> {
    write_json(&success_envelope(schema_listing(loader)), pretty)
}

fn serve(config: Config, loader: SchemaLoader, port: Option<u16>) -> CliResult<()> {
    let mut http = config.http;
    if let Some(port) = port {
        http.port = port;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(HttpServer::new(http, loader).start())?;
    Ok(())
}
