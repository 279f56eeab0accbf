//! Document assembly.
//!
//! [`SwaggerGenerator`] turns the endpoints of an [`ApiDescriptionProvider`] into one named
//! [`OpenApiDocument`]: it selects the endpoints that belong to the document, groups them into
//! path items and operations, and attaches the definitions the schema registry collected on
//! the way. Every call starts from a fresh registry.

mod operation_ids;
mod operations;
mod responses;

pub use operation_ids::default_operation_id;
pub use responses::status_description;

use crate::api_explorer::{ApiDescription, ApiDescriptionProvider};
use crate::contract::DataContractResolver;
use crate::error::{Error, Result};
use crate::filters::{
    DocumentFilter, DocumentFilterContext, OperationFilter, ParameterFilter, RequestBodyFilter,
};
use crate::openapi::{
    Components, Info, OpenApiDocument, PathItem, SecurityRequirement, SecurityScheme, Server, Tag,
    DEFAULT_OPENAPI_VERSION,
};
use crate::schema_generator::{SchemaGeneratorOptions, SchemaRegistry};
use indexmap::IndexMap;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Decides whether an endpoint belongs to the named document
pub type DocInclusionPredicate = Box<dyn Fn(&str, &ApiDescription) -> bool>;

/// Reduces the endpoints bound to one path and method to the one that is documented
pub type ConflictingActionsResolver = Box<dyn Fn(&[ApiDescription]) -> ApiDescription>;

pub type OperationIdSelector = Box<dyn Fn(&ApiDescription) -> String>;

pub type TagsSelector = Box<dyn Fn(&ApiDescription) -> Vec<String>>;

pub type SortKeySelector = Box<dyn Fn(&ApiDescription) -> String>;

pub struct SwaggerGeneratorOptions {
    /// Document name → info block
    pub swagger_docs: IndexMap<String, Info>,
    pub openapi_version: String,
    pub doc_inclusion_predicate: DocInclusionPredicate,
    pub ignore_obsolete_actions: bool,
    /// Operations keep provider order when unset
    pub sort_key_selector: Option<SortKeySelector>,
    pub conflicting_actions_resolver: Option<ConflictingActionsResolver>,
    pub operation_id_selector: OperationIdSelector,
    pub tags_selector: TagsSelector,
    pub servers: Vec<Server>,
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    pub security_requirements: Vec<SecurityRequirement>,
    pub parameter_filters: Vec<Box<dyn ParameterFilter>>,
    pub request_body_filters: Vec<Box<dyn RequestBodyFilter>>,
    pub operation_filters: Vec<Box<dyn OperationFilter>>,
    pub document_filters: Vec<Box<dyn DocumentFilter>>,
}

impl Default for SwaggerGeneratorOptions {
    fn default() -> Self {
        Self {
            swagger_docs: IndexMap::new(),
            openapi_version: DEFAULT_OPENAPI_VERSION.to_string(),
            doc_inclusion_predicate: Box::new(|_, _| true),
            ignore_obsolete_actions: false,
            sort_key_selector: None,
            conflicting_actions_resolver: None,
            operation_id_selector: Box::new(default_operation_id),
            tags_selector: Box::new(default_tags),
            servers: Vec::new(),
            security_schemes: BTreeMap::new(),
            security_requirements: Vec::new(),
            parameter_filters: Vec::new(),
            request_body_filters: Vec::new(),
            operation_filters: Vec::new(),
            document_filters: Vec::new(),
        }
    }
}

impl SwaggerGeneratorOptions {
    pub fn swagger_doc(&mut self, name: impl Into<String>, info: Info) -> &mut Self {
        self.swagger_docs.insert(name.into(), info);
        self
    }

    pub fn doc_inclusion_predicate(
        &mut self,
        predicate: impl Fn(&str, &ApiDescription) -> bool + 'static,
    ) -> &mut Self {
        self.doc_inclusion_predicate = Box::new(predicate);
        self
    }

    pub fn resolve_conflicting_actions(
        &mut self,
        resolver: impl Fn(&[ApiDescription]) -> ApiDescription + 'static,
    ) -> &mut Self {
        self.conflicting_actions_resolver = Some(Box::new(resolver));
        self
    }

    pub fn order_actions_by(
        &mut self,
        sort_key: impl Fn(&ApiDescription) -> String + 'static,
    ) -> &mut Self {
        self.sort_key_selector = Some(Box::new(sort_key));
        self
    }

    pub fn add_parameter_filter(&mut self, filter: impl ParameterFilter + 'static) -> &mut Self {
        self.parameter_filters.push(Box::new(filter));
        self
    }

    pub fn add_request_body_filter(
        &mut self,
        filter: impl RequestBodyFilter + 'static,
    ) -> &mut Self {
        self.request_body_filters.push(Box::new(filter));
        self
    }

    pub fn add_operation_filter(&mut self, filter: impl OperationFilter + 'static) -> &mut Self {
        self.operation_filters.push(Box::new(filter));
        self
    }

    pub fn add_document_filter(&mut self, filter: impl DocumentFilter + 'static) -> &mut Self {
        self.document_filters.push(Box::new(filter));
        self
    }
}

/// The group name, or else the first literal segment of the path
pub fn default_tags(description: &ApiDescription) -> Vec<String> {
    if let Some(group) = &description.group_name {
        return vec![group.clone()];
    }
    normalize_path(&description.relative_path)
        .split('/')
        .find(|segment| !segment.is_empty() && !segment.starts_with('{'))
        .map(|segment| vec![segment.to_string()])
        .unwrap_or_default()
}

/// Path template as it appears in the document.
///
/// Drops the query string, rewrites `:name` segments to `{name}`, strips route constraints
/// (`{id:\d+}` → `{id}`) and makes the path absolute.
pub fn normalize_path(relative_path: &str) -> String {
    let path = relative_path
        .split_once('?')
        .map_or(relative_path, |(path, _)| path);

    let segments: Vec<String> = path
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(normalize_segment)
        .collect();
    format!("/{}", segments.join("/"))
}

fn normalize_segment(segment: &str) -> String {
    if let Some(name) = segment.strip_prefix(':') {
        return format!("{{{}}}", name);
    }
    let mut normalized = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(start) = rest.find('{') {
        normalized.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let placeholder = &rest[start + 1..start + len];
        let name = placeholder.split(':').next().unwrap_or(placeholder);
        normalized.push('{');
        normalized.push_str(name.trim_start_matches('*'));
        normalized.push('}');
        rest = &rest[start + len + 1..];
    }
    normalized.push_str(rest);
    normalized
}

/// Builds named documents from discovered endpoints
pub struct SwaggerGenerator<'a> {
    options: &'a SwaggerGeneratorOptions,
    schema_options: &'a SchemaGeneratorOptions,
    api_descriptions: &'a dyn ApiDescriptionProvider,
    contracts: &'a dyn DataContractResolver,
}

impl<'a> SwaggerGenerator<'a> {
    pub fn new(
        options: &'a SwaggerGeneratorOptions,
        schema_options: &'a SchemaGeneratorOptions,
        api_descriptions: &'a dyn ApiDescriptionProvider,
        contracts: &'a dyn DataContractResolver,
    ) -> Self {
        Self {
            options,
            schema_options,
            api_descriptions,
            contracts,
        }
    }

    /// Generate the document registered under `document_name`
    pub fn get_swagger(&self, document_name: &str) -> Result<OpenApiDocument> {
        let info = self
            .options
            .swagger_docs
            .get(document_name)
            .ok_or_else(|| Error::UnknownDocument {
                name: document_name.to_string(),
                available: self.options.swagger_docs.keys().cloned().collect(),
            })?;

        let descriptions: Vec<ApiDescription> = self
            .api_descriptions
            .api_descriptions()
            .into_iter()
            .filter(|description| (self.options.doc_inclusion_predicate)(document_name, description))
            .collect();
        debug!(
            "Generating document \"{}\" from {} endpoints",
            document_name,
            descriptions.len()
        );

        let mut registry = SchemaRegistry::new(self.schema_options, self.contracts);
        let paths = self.generate_paths(&descriptions, &mut registry)?;

        let mut document = OpenApiDocument {
            openapi: self.options.openapi_version.clone(),
            info: info.clone(),
            servers: self.options.servers.clone(),
            tags: collect_tags(&paths),
            paths,
            components: Components {
                schemas: registry.definitions().clone(),
                security_schemes: self.options.security_schemes.clone(),
            },
            security: self.options.security_requirements.clone(),
        };

        let attached: BTreeSet<String> = document.components.schemas.keys().cloned().collect();
        for filter in &self.options.document_filters {
            let mut context = DocumentFilterContext {
                api_descriptions: &descriptions,
                registry: &mut registry,
            };
            filter.apply(&mut document, &mut context)?;
        }

        // Definitions registered by document filters
        for (schema_id, schema) in registry.into_definitions() {
            if !attached.contains(&schema_id) {
                document
                    .components
                    .schemas
                    .entry(schema_id)
                    .or_insert(schema);
            }
        }

        debug!(
            "Document \"{}\": {} paths, {} schemas",
            document_name,
            document.paths.len(),
            document.components.schemas.len()
        );
        Ok(document)
    }
}

/// Every tag used by an operation, in first-use order
fn collect_tags(paths: &IndexMap<String, PathItem>) -> Vec<Tag> {
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for item in paths.values() {
        for (_, operation) in item.operations() {
            for tag in &operation.tags {
                if seen.insert(tag.clone()) {
                    tags.push(Tag {
                        name: tag.clone(),
                        description: None,
                    });
                }
            }
        }
    }
    tags
}
