//! Client Assembler.
//!
//! Puts the generated pieces together into one Python module: the import
//! preamble, the API error type, the ordered model classes, the client
//! wrapper class and the handler methods nested inside it.
//!
//! # Example
//!
//! ```no_run
//! use fastroutes::client::ClientGenerator;
//! use fastroutes::manifest::ManifestLoader;
//! use std::path::Path;
//!
//! let table = ManifestLoader::load(Path::new("routes.yaml")).unwrap();
//! let generator = ClientGenerator::new(&table).unwrap();
//! println!("{}", generator.export_code());
//! ```

use crate::error::Result;
use crate::extractor::route_table::RouteTableExtractor;
use crate::extractor::Route;
use crate::handler::HandlerEmitter;
use crate::manifest::RouteTable;
use crate::model_graph;
use crate::python;
use crate::type_resolver::TypeResolver;
use log::{debug, info};

const IMPORTS: &str = "# flake8: noqa: F401, F403, F405\n\
from models import *\n\
from pydantic import BaseModel, StringConstraints, Field, EmailStr\n\
from typing import Annotated, Literal, Optional\n\
import httpx\n\
import typing\n\
from datetime import datetime\n\n\n";

const ERRORS: &str = "class ApiError(Exception):\n\
\x20   def __init__(self, status_code: int, detail: str, context: str | None = None):\n\
\x20       self.status_code = status_code\n\
\x20       self.detail = detail\n\
\x20       self.context = context\n\
\x20       message = f\"{status_code}: {detail}\"\n\
\x20       super().__init__(f\"{context}: {message}\" if context else message)\n\
\n\
\n\
async def handle_errors(call: typing.Awaitable[typing.Any], context: str | None = None) -> typing.Any:\n\
\x20   try:\n\
\x20       return await call\n\
\x20   except ApiError as error:\n\
\x20       if context is None:\n\
\x20           raise\n\
\x20       raise ApiError(error.status_code, error.detail, context) from error\n\n\n";

/// Generates the client module for one route table
pub struct ClientGenerator {
    /// Name of the wrapper class
    name: String,
    resolver: TypeResolver,
    routes: Vec<Route>,
}

impl ClientGenerator {
    /// Builds a generator using the table's own client name and exclusions
    pub fn new(table: &RouteTable) -> Result<Self> {
        Self::with_options(table, None, &[])
    }

    /// Builds a generator, optionally overriding the class name and excluding
    /// extra paths on top of the table's own exclusions.
    ///
    /// # Errors
    ///
    /// Fails when a model or route of the table cannot be resolved.
    pub fn with_options(table: &RouteTable, name: Option<&str>, extra_excludes: &[String]) -> Result<Self> {
        let name = name.unwrap_or(&table.client_name).to_string();
        debug!("Initializing ClientGenerator: {}", name);

        let resolver = TypeResolver::new(&table.models)?;

        let mut paths_to_exclude = table.exclude.clone();
        paths_to_exclude.extend(extra_excludes.iter().cloned());

        let routes = RouteTableExtractor::extract_routes(&table.routes, &resolver, &paths_to_exclude)?;
        info!("Prepared {} routes for client {}", routes.len(), name);

        Ok(Self { name, resolver, routes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Fixed import preamble of every generated module
    pub fn imports() -> &'static str {
        IMPORTS
    }

    /// Error type raised by generated methods, and the helper labelling it
    pub fn errors() -> &'static str {
        ERRORS
    }

    /// Model class definitions in dependency order
    pub fn models(&self) -> String {
        let models = model_graph::build_models(&self.resolver, &self.routes);
        debug!("Rendering {} models", models.len());

        models
            .iter()
            .map(|model| format!("{}\n\n", model.code))
            .collect()
    }

    /// The wrapper class owning the HTTP transport
    pub fn client_class(&self) -> String {
        format!(
            "class {}:\n\
             \x20   def __init__(self, base_url: str):\n\
             \x20       self._client = httpx.AsyncClient(base_url=base_url)\n\
             \n\
             \x20   async def __aenter__(self):\n\
             \x20       return self\n\
             \n\
             \x20   async def __aexit__(self, exc_type, exc, tb):\n\
             \x20       await self._client.aclose()\n\
             \n\
             \x20   def set_access_token(self, access_token: str | None):\n\
             \x20       if access_token:\n\
             \x20           self._client.headers.update({{\"Authorization\": f\"Bearer {{access_token}}\"}})\n\
             \x20       else:\n\
             \x20           self._client.headers.pop(\"Authorization\", None)\n\
             \n\
             \x20   @staticmethod\n\
             \x20   def _raise_for_status(api_response: httpx.Response):\n\
             \x20       try:\n\
             \x20           api_response.raise_for_status()\n\
             \x20       except httpx.HTTPStatusError as error:\n\
             \x20           raise ApiError(error.response.status_code, error.response.text) from error\n",
            self.name
        )
    }

    /// Handler methods, indented into the wrapper class
    pub fn handlers(&self) -> String {
        let emitter = HandlerEmitter::new(&self.resolver);
        self.routes
            .iter()
            .map(|route| format!("\n{}", python::indent(&emitter.render(route), "    ")))
            .collect()
    }

    /// The complete client module
    pub fn export_code(&self) -> String {
        let mut code = String::from(Self::imports());
        code.push_str(Self::errors());
        code.push_str(&self.models());
        code.push_str(&self.client_class());
        code.push_str(&self.handlers());
        code
    }

    /// The complete client module as UTF-8 bytes
    pub fn export_bytes(&self) -> Vec<u8> {
        self.export_code().into_bytes()
    }

    /// File name the module is delivered under
    pub fn file_name(&self) -> String {
        format!("{}.py", self.name.to_lowercase())
    }
}
