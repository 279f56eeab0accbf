use crate::api_explorer::actix::ActixApiExplorer;
use crate::api_explorer::ApiDescriptionProvider;
use crate::config::{ConflictPolicy, DocumentConfig, GeneratorConfig};
use crate::contract::source::SourceContractResolver;
use crate::openapi::OpenApiDocument;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::source::SourceTree;
use crate::swagger_generator::SwaggerGenerator;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Swaggen - Generate OpenAPI documents from the routes and types of Rust web services
#[derive(Parser, Debug)]
#[command(name = "swaggen")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Name of the document to generate
    #[arg(short = 'd', long = "doc", value_name = "NAME", default_value = "v1")]
    pub document: String,

    /// YAML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Document title
    #[arg(long = "title")]
    pub title: Option<String>,

    /// Document version
    #[arg(long = "api-version", value_name = "VERSION")]
    pub api_version: Option<String>,

    /// Describe every enum by member names
    #[arg(long = "enums-as-strings")]
    pub enums_as_strings: bool,

    /// camelCase string enum members
    #[arg(long = "camel-case-enums")]
    pub camel_case_enums: bool,

    /// Describe enums in place instead of as shared definitions
    #[arg(long = "inline-enums")]
    pub inline_enums: bool,

    /// Leave out deprecated handlers and fields
    #[arg(long = "ignore-obsolete")]
    pub ignore_obsolete: bool,

    /// Prefix schema names with their module path
    #[arg(long = "full-type-names")]
    pub full_type_names: bool,

    /// Document the first handler when several share a path and method
    #[arg(long = "resolve-conflicts")]
    pub resolve_conflicts: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    info!("Project path: {}", args.project_path.display());
    info!("Document: {}", args.document);
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }
    if let Some(ref config) = args.config_path {
        info!("Config file: {}", config.display());
    }

    Ok(args)
}

/// The configuration file, if any, with the command-line flags applied on top
pub fn load_config(args: &CliArgs) -> Result<GeneratorConfig> {
    let mut config = match &args.config_path {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    if config.documents.is_empty() {
        let title = args
            .project_path
            .canonicalize()
            .ok()
            .and_then(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "API".to_string());
        config
            .documents
            .insert(args.document.clone(), DocumentConfig::new(title, "1.0.0"));
    }
    if let Some(document) = config.documents.get_mut(&args.document) {
        if let Some(title) = &args.title {
            document.title = title.clone();
        }
        if let Some(version) = &args.api_version {
            document.version = version.clone();
        }
    }

    let schemas = &mut config.schemas;
    schemas.enums_as_strings |= args.enums_as_strings;
    schemas.camel_case_enums |= args.camel_case_enums;
    schemas.inline_enums |= args.inline_enums;
    schemas.ignore_obsolete_properties |= args.ignore_obsolete;
    schemas.full_type_names |= args.full_type_names;
    config.ignore_obsolete_actions |= args.ignore_obsolete;
    if args.resolve_conflicts {
        config.resolve_conflicts = Some(ConflictPolicy::First);
    }

    config.validate()?;
    Ok(config)
}

/// Load the project and generate the requested document
pub fn generate(args: &CliArgs) -> Result<OpenApiDocument> {
    let config = load_config(args)?;

    info!("Scanning project directory...");
    let tree = SourceTree::load(&args.project_path)?;
    info!("Parsed {} Rust files", tree.files.len());
    for warning in &tree.warnings {
        warn!("{}", warning);
    }
    if tree.files.is_empty() {
        anyhow::bail!("No Rust files found in the project directory");
    }

    let contracts = SourceContractResolver::new(&tree);
    let explorer = ActixApiExplorer::new(&tree, &contracts);
    let descriptions = explorer.api_descriptions();
    info!("Discovered {} endpoints", descriptions.len());
    if descriptions.is_empty() {
        warn!("No routes found in the project");
    }

    let schema_options = config.schema_options();
    let swagger_options = config.swagger_options();
    let generator =
        SwaggerGenerator::new(&swagger_options, &schema_options, &descriptions, &contracts);
    let document = generator
        .get_swagger(&args.document)
        .with_context(|| format!("Failed to generate document \"{}\"", args.document))?;
    Ok(document)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    let document = generate(&args)?;
    info!("OpenAPI document built successfully");

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    let operations: usize = document
        .paths
        .values()
        .map(|item| item.operations().count())
        .sum();
    info!("Generation complete!");
    info!("Summary:");
    info!("  - Paths: {}", document.paths.len());
    info!("  - Operations: {}", operations);
    info!("  - Schemas: {}", document.components.schemas.len());

    Ok(())
}
