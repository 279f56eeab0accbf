//! Swaggen - command-line OpenAPI generator for Rust web services.
//!
//! Scans a project for actix-web style attribute routes and the types their handlers use,
//! and writes an OpenAPI 3.0 document.
//!
//! # Usage
//!
//! ```bash
//! swaggen [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! swaggen ./my-api-project -o openapi.yaml
//! ```
//!
//! Generate the `admin` document described in a config file as JSON:
//! ```bash
//! swaggen ./my-api-project -c swaggen.yaml -d admin -f json -o admin.json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swaggen::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag before the logger exists
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    info!("Swaggen starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
