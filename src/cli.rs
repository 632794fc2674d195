use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::path::PathBuf;

/// fastroutes - Generate a typed async Python client from a web API's route table
#[derive(Parser, Debug)]
#[command(name = "fastroutes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a client module from a route table file
    Generate {
        /// Route table file (YAML, or JSON with a .json extension)
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,

        /// Output file or directory (if not specified, outputs to stdout)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output_path: Option<PathBuf>,

        /// Name of the generated client class (overrides the route table)
        #[arg(short = 'n', long = "name")]
        name: Option<String>,

        /// Route path to leave out of the client; may be repeated
        #[arg(short = 'e', long = "exclude", value_name = "PATH")]
        exclude: Vec<String>,
    },
    /// Download the client module published by a running server
    Download {
        /// Base URL of the server
        #[arg(value_name = "URL")]
        url: String,

        /// Where to save the module
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    match &args.command {
        Command::Generate {
            manifest,
            output_path,
            name,
            exclude,
        } => {
            if !manifest.exists() {
                anyhow::bail!("Route table does not exist: {}", manifest.display());
            }
            if !manifest.is_file() {
                anyhow::bail!("Route table is not a file: {}", manifest.display());
            }
            if let Some(name) = name {
                if name.trim().is_empty() {
                    anyhow::bail!("Client name must not be empty");
                }
            }

            info!("Route table: {}", manifest.display());
            if let Some(output) = output_path {
                info!("Output: {}", output.display());
            } else {
                info!("Output: stdout");
            }
            if !exclude.is_empty() {
                info!("Excluded paths: {:?}", exclude);
            }
        }
        Command::Download { url, output } => {
            if url.trim().is_empty() {
                anyhow::bail!("Server URL must not be empty");
            }
            info!("Server: {}", url);
            info!("Output file: {}", output.display());
        }
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Generate {
            manifest,
            output_path,
            name,
            exclude,
        } => generate(manifest, output_path, name, exclude),
        Command::Download { url, output } => download(&url, output),
    }
}

fn generate(
    manifest: PathBuf,
    output_path: Option<PathBuf>,
    name: Option<String>,
    exclude: Vec<String>,
) -> Result<()> {
    use crate::client::ClientGenerator;
    use crate::manifest::ManifestLoader;
    use crate::output::{resolve_output_path, write_to_file};

    info!("Starting client generation...");

    // Step 1: Load the route table
    info!("Loading route table...");
    let table = ManifestLoader::load(&manifest)?;
    info!(
        "Found {} routes and {} models",
        table.routes.len(),
        table.models.len()
    );

    // Step 2: Resolve types and extract routes
    info!("Extracting routes...");
    let generator = ClientGenerator::with_options(&table, name.as_deref(), &exclude)
        .with_context(|| format!("Failed to generate client from {}", manifest.display()))?;

    if generator.routes().is_empty() {
        log::warn!("No routes left to generate");
    }

    // Step 3: Assemble the client module
    info!("Assembling client {}...", generator.name());
    let code = generator.export_bytes();

    // Step 4: Output to file or stdout
    if let Some(output) = &output_path {
        let path = resolve_output_path(output, &generator.file_name());
        info!("Writing output to: {}", path.display());
        write_to_file(&code, &path)?;
        info!("Successfully wrote client to {}", path.display());
    } else {
        print!("{}", String::from_utf8_lossy(&code));
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Client: {}", generator.name());
    info!("  - Routes: {}", generator.routes().len());

    Ok(())
}

fn download(url: &str, output: PathBuf) -> Result<()> {
    let bytes = crate::download::download(url, &output)?;
    println!("File saved to {}", output.display());
    debug!("Saved {} bytes", bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use tempfile::TempDir;

    const TABLE: &str = r#"
client_name: Shop
models:
  - name: Item
    fields:
      - name: id
        type: int
routes:
  - name: get_item
    path: /items/{id}
    methods: [GET]
    path_params:
      - alias: id
        type: int
    response: Item
"#;

    #[test]
    fn test_parse_generate_arguments() {
        let args = CliArgs::try_parse_from([
            "fastroutes", "generate", "routes.yaml", "-o", "out", "-n", "Api", "-e", "/a", "-e", "/b", "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Command::Generate {
                manifest,
                output_path,
                name,
                exclude,
            } => {
                assert_eq!(manifest, PathBuf::from("routes.yaml"));
                assert_eq!(output_path, Some(PathBuf::from("out")));
                assert_eq!(name.as_deref(), Some("Api"));
                assert_eq!(exclude, vec!["/a".to_string(), "/b".to_string()]);
            }
            other => panic!("Expected generate command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_download_arguments() {
        let args = CliArgs::try_parse_from(["fastroutes", "download", "http://localhost:8000", "client/api.py"]).unwrap();

        assert!(!args.verbose);
        assert!(matches!(args.command, Command::Download { ref url, .. } if url == "http://localhost:8000"));
    }

    #[test]
    fn test_missing_manifest_is_rejected() {
        let args = CliArgs::try_parse_from(["fastroutes", "generate", "/definitely/not/here.yaml"]).unwrap();
        let err = parse_args_from_parsed(args).unwrap_err();
        assert!(err.to_string().contains("Route table does not exist"));
    }

    #[test]
    fn test_generate_into_directory() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("routes.yaml");
        std::fs::write(&manifest, TABLE).unwrap();
        let out_dir = temp_dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();

        let args = CliArgs::try_parse_from([
            OsString::from("fastroutes"),
            OsString::from("generate"),
            manifest.clone().into_os_string(),
            OsString::from("-o"),
            out_dir.clone().into_os_string(),
        ])
        .unwrap();
        run(parse_args_from_parsed(args).unwrap()).unwrap();

        let code = std::fs::read_to_string(out_dir.join("shop.py")).unwrap();
        assert!(code.contains("class Shop:\n"));
        assert!(code.contains("    async def get_item(self, id: int) -> Item:\n"));
    }
}
