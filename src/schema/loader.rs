//! Schema loader and in-memory registry
//!
//! - Schemas are stored as `<schema_dir>/<id>_<version>.json`, one file per version
//! - Every `*.json` file in the directory is loaded; a malformed file fails the load
//! - A registered (id, version) can never be replaced

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// Schema loader that reads schema files from disk and maintains an in-memory registry.
#[derive(Debug, Default)]
pub struct SchemaLoader {
    /// Directory containing schema files, if any
    schema_dir: Option<PathBuf>,
    /// Loaded schemas indexed by (schema_id, schema_version)
    schemas: HashMap<(String, String), Schema>,
}

impl SchemaLoader {
    /// Creates an empty registry with no backing directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry backed by `schema_dir`.
    pub fn with_dir(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: Some(schema_dir.into()),
            schemas: HashMap::new(),
        }
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> Option<&Path> {
        self.schema_dir.as_deref()
    }

    /// Loads all schema files from the schema directory.
    ///
    /// Returns the number of schemas loaded. A loader without a directory loads nothing.
    pub fn load_all(&mut self) -> SchemaResult<usize> {
        let Some(dir) = self.schema_dir.clone() else {
            return Ok(0);
        };

        let entries = fs::read_dir(&dir)
            .map_err(|e| SchemaError::io_failed(dir.display().to_string(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SchemaError::io_failed(dir.display().to_string(), e))?;
            let path = entry.path();

            // Skip non-JSON files
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        for path in &paths {
            self.load_schema_file(path)?;
        }

        Ok(paths.len())
    }

    /// Loads a single schema file.
    fn load_schema_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path)
            .map_err(|e| SchemaError::io_failed(path.display().to_string(), e))?;

        let schema = parse_schema(&content, &path.display().to_string())?;
        self.register(schema)
    }

    /// Registers a schema directly.
    pub fn register(&mut self, schema: Schema) -> SchemaResult<()> {
        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed_schema(&schema.schema_id, e))?;

        let key = (schema.schema_id.clone(), schema.schema_version.clone());

        if self.schemas.contains_key(&key) {
            return Err(SchemaError::schema_immutable(
                &schema.schema_id,
                &schema.schema_version,
            ));
        }

        self.schemas.insert(key, schema);
        Ok(())
    }

    /// Gets a schema by ID and version.
    pub fn get(&self, schema_id: &str, schema_version: &str) -> Option<&Schema> {
        self.schemas
            .get(&(schema_id.to_string(), schema_version.to_string()))
    }

    /// Looks up a schema, picking the only registered version when none is given.
    pub fn resolve(&self, schema_id: &str, schema_version: Option<&str>) -> SchemaResult<&Schema> {
        if !self.schema_id_exists(schema_id) {
            return Err(SchemaError::unknown_schema(schema_id));
        }

        match schema_version {
            Some(version) => self
                .get(schema_id, version)
                .ok_or_else(|| SchemaError::unknown_version(schema_id, version)),
            None => {
                let versions = self.versions(schema_id);
                match versions.as_slice() {
                    [only] => self
                        .get(schema_id, only)
                        .ok_or_else(|| SchemaError::unknown_version(schema_id, *only)),
                    _ => Err(SchemaError::ambiguous_version(schema_id, &versions)),
                }
            }
        }
    }

    /// Checks if a schema exists.
    pub fn exists(&self, schema_id: &str, schema_version: &str) -> bool {
        self.get(schema_id, schema_version).is_some()
    }

    /// Checks if any version of a schema ID exists.
    pub fn schema_id_exists(&self, schema_id: &str) -> bool {
        self.schemas.keys().any(|(id, _)| id == schema_id)
    }

    /// Registered versions of a schema ID, sorted.
    pub fn versions(&self, schema_id: &str) -> Vec<&str> {
        let mut versions: Vec<&str> = self
            .schemas
            .keys()
            .filter(|(id, _)| id == schema_id)
            .map(|(_, version)| version.as_str())
            .collect();
        versions.sort_unstable();
        versions
    }

    /// Returns all loaded schemas sorted by (id, version).
    pub fn all_schemas(&self) -> Vec<&Schema> {
        let mut schemas: Vec<&Schema> = self.schemas.values().collect();
        schemas.sort_by(|a, b| a.key().cmp(&b.key()));
        schemas
    }

    /// Returns the number of loaded schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Saves a schema to the schema directory.
    pub fn save_schema(&self, schema: &Schema) -> SchemaResult<PathBuf> {
        let Some(dir) = &self.schema_dir else {
            return Err(SchemaError::io_failed(
                &schema.schema_id,
                "registry has no schema directory",
            ));
        };

        let path = dir.join(format!(
            "{}_{}.json",
            schema.schema_id, schema.schema_version
        ));

        if path.exists() {
            return Err(SchemaError::schema_immutable(
                &schema.schema_id,
                &schema.schema_version,
            ));
        }

        fs::create_dir_all(dir).map_err(|e| SchemaError::io_failed(dir.display().to_string(), e))?;

        let content = serde_json::to_string_pretty(schema)
            .map_err(|e| SchemaError::malformed_schema(&schema.schema_id, e.to_string()))?;

        fs::write(&path, content)
            .map_err(|e| SchemaError::io_failed(path.display().to_string(), e))?;

        Ok(path)
    }
}

/// Parses schema JSON text, naming `origin` in errors.
pub fn parse_schema(content: &str, origin: &str) -> SchemaResult<Schema> {
    serde_json::from_str(content)
        .map_err(|e| SchemaError::malformed_schema(origin, format!("Invalid JSON: {}", e)))
}
