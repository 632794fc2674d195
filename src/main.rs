//! fastroutes - Command-line tool for generating typed async Python clients.
//!
//! The `generate` command reads a route table (the routes and data models a
//! web API exposes) and writes a single Python module containing the model
//! classes and a client class with one async method per route. The
//! `download` command fetches the module a running server already publishes.
//!
//! # Usage
//!
//! ```bash
//! fastroutes generate [OPTIONS] <MANIFEST>
//! fastroutes download <URL> <OUTPUT>
//! ```
//!
//! # Examples
//!
//! Generate a client next to the route table:
//! ```bash
//! fastroutes generate routes.yaml -o client/
//! ```
//!
//! Rename the client class and skip the health check route:
//! ```bash
//! fastroutes generate routes.yaml -n ShopClient -e /health -o shop.py
//! ```
//!
//! Fetch the client published by a running server:
//! ```bash
//! fastroutes download http://localhost:8000 client/api.py
//! ```

use anyhow::Result;
use clap::Parser;
use fastroutes::cli;
use log::info;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    // Initialize logger based on verbose flag
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("fastroutes starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    Ok(())
}
