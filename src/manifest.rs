//! Loading of the host's route table.
//!
//! The host application describes its routes and data models in a YAML or JSON
//! document. Types are kept as raw type expressions here; they are parsed into
//! [`TypeShape`](crate::type_resolver::TypeShape)s during extraction.

use crate::extractor::DefaultValue;
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_client_name() -> String {
    "Client".to_string()
}

/// The complete route table exported by a host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteTable {
    /// Name of the generated client wrapper class
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Paths whose routes are never exported
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Every model type the host knows about
    #[serde(default)]
    pub models: Vec<ModelEntry>,
    /// Route entries in host table order
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

/// Schema description of one model type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Dotted path of the declaring module (e.g. `app.models`)
    #[serde(default)]
    pub module: String,
    /// Simple class name
    pub name: String,
    /// Type expression naming the parent model, absent for direct base-model subclasses
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
}

/// One declared model field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_expr: String,
    #[serde(default, skip_serializing_if = "DefaultValue::is_undefined")]
    pub default: DefaultValue,
}

/// Kind of a host route table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// A user-defined API endpoint
    #[default]
    Endpoint,
    /// Host utility routes (docs pages, static mounts, the discovery route itself)
    Internal,
}

/// One entry of the host route table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub name: String,
    pub path: String,
    pub methods: Vec<String>,
    #[serde(default)]
    pub kind: RouteKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub path_params: Vec<ParameterEntry>,
    #[serde(default)]
    pub query_params: Vec<ParameterEntry>,
    /// Type expression of the request body model
    #[serde(default)]
    pub body: Option<String>,
    /// Type expression of the response, absent when the route returns nothing
    #[serde(default)]
    pub response: Option<String>,
}

/// Dependency metadata of one path or query parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterEntry {
    pub alias: String,
    #[serde(rename = "type")]
    pub type_expr: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "DefaultValue::is_undefined")]
    pub default: DefaultValue,
}

fn default_required() -> bool {
    true
}

/// Reader for route table documents.
pub struct ManifestLoader;

impl ManifestLoader {
    /// Loads a route table from disk.
    ///
    /// Files ending in `.json` are read as JSON, everything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid route table.
    pub fn load(path: &Path) -> Result<RouteTable> {
        debug!("Loading route table: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read route table: {}", path.display()))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let table = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
        .with_context(|| format!("Failed to parse route table: {}", path.display()))?;

        if table.routes.is_empty() {
            warn!("Route table {} declares no routes", path.display());
        }

        debug!(
            "Loaded {} routes and {} models from {}",
            table.routes.len(),
            table.models.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_yaml_str(content: &str) -> Result<RouteTable> {
        serde_yaml::from_str(content).context("Invalid YAML route table")
    }

    pub fn from_json_str(content: &str) -> Result<RouteTable> {
        serde_json::from_str(content).context("Invalid JSON route table")
    }
}
