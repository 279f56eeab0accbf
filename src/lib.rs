//! Swaggen - OpenAPI documents from the routes and data types of Rust web services.
//!
//! Endpoints are discovered from handler source code, their parameter and response types
//! are turned into JSON Schema definitions, and the result is assembled into one OpenAPI
//! document per configured document name.
//!
//! # Architecture
//!
//! 1. [`source`] - Scans a project directory and parses every Rust file
//! 2. [`contract`] - Classifies types and describes their serialized shape
//! 3. [`api_explorer`] - Discovers endpoints ([`api_explorer::ApiDescription`])
//! 4. [`schema_generator`] - Converts types into schemas and collects definitions
//! 5. [`swagger_generator`] - Groups endpoints into paths and operations and builds documents
//! 6. [`filters`] - Post-processing hooks for schemas, parameters, bodies, operations and documents
//! 7. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use swaggen::{
//!     api_explorer::{actix::ActixApiExplorer, ApiDescriptionProvider},
//!     contract::source::SourceContractResolver,
//!     openapi::Info,
//!     schema_generator::SchemaGeneratorOptions,
//!     serializer::serialize_yaml,
//!     source::SourceTree,
//!     swagger_generator::{SwaggerGenerator, SwaggerGeneratorOptions},
//! };
//! use std::path::Path;
//!
//! let tree = SourceTree::load(Path::new("./my-project")).unwrap();
//! let contracts = SourceContractResolver::new(&tree);
//! let endpoints = ActixApiExplorer::new(&tree, &contracts).api_descriptions();
//!
//! let mut options = SwaggerGeneratorOptions::default();
//! options.swagger_doc("v1", Info::new("My API", "1.0"));
//! let schema_options = SchemaGeneratorOptions::default();
//!
//! let generator = SwaggerGenerator::new(&options, &schema_options, &endpoints, &contracts);
//! let document = generator.get_swagger("v1").unwrap();
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module and the [`config`] file format.

pub mod api_explorer;
pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod filters;
pub mod openapi;
pub mod schema;
pub mod schema_generator;
pub mod serializer;
pub mod source;
pub mod swagger_generator;
