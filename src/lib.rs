//! fastroutes - Typed async Python clients from a web API's route table.
//!
//! The library reads a route table describing a web API (its endpoints and
//! the data models they exchange) and synthesizes one self-contained Python
//! module: pydantic model classes ordered so that every class is defined
//! before it is used, plus an `httpx` based client class with one async
//! method per endpoint.
//!
//! # Architecture
//!
//! 1. [`manifest`] - Loads the route table from YAML or JSON
//! 2. [`type_resolver`] - Parses type expressions and indexes declared models
//! 3. [`extractor`] - Turns route table entries into route descriptors
//! 4. [`naming`] - Derives globally unique model names
//! 5. [`model_graph`] - Discovers reachable models and orders their definitions
//! 6. [`handler`] - Renders one async client method per route
//! 7. [`client`] - Assembles the complete client module
//! 8. [`output`] and [`download`] - Deliver the module to disk
//!
//! # Example Usage
//!
//! ```no_run
//! use fastroutes::{client::ClientGenerator, manifest::ManifestLoader, output::write_to_file};
//! use std::path::Path;
//!
//! let table = ManifestLoader::load(Path::new("routes.yaml")).unwrap();
//! let generator = ClientGenerator::with_options(&table, Some("ShopClient"), &["/health".to_string()]).unwrap();
//! write_to_file(&generator.export_bytes(), Path::new(&generator.file_name())).unwrap();
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod cli;
pub mod manifest;
pub mod type_resolver;
pub mod extractor;
pub mod naming;
pub mod python;
pub mod model_graph;
pub mod handler;
pub mod client;
pub mod output;
pub mod download;
pub mod error;
