//! Filter pipeline.
//!
//! Filters are user-supplied post-processing steps. Each kind runs at one point of
//! generation, in registration order, on a node the generator has already built:
//!
//! | Filter               | Runs after                                   |
//! |----------------------|----------------------------------------------|
//! | [`SchemaFilter`]     | every built (non-reference) schema node      |
//! | [`ParameterFilter`]  | each generated parameter                     |
//! | [`RequestBodyFilter`]| the request body of an operation             |
//! | [`OperationFilter`]  | each complete operation                      |
//! | [`DocumentFilter`]   | the assembled document                       |
//!
//! Every context hands out the schema registry, so a filter may register further types.
//! A filter error aborts generation.

pub mod doc_comments;
pub mod tags;

pub use doc_comments::{DocCommentsOperationFilter, DocCommentsSchemaFilter};
pub use tags::TagDescriptionsDocumentFilter;

use crate::api_explorer::{ApiDescription, ApiParameter};
use crate::contract::{DataContract, TypeRef};
use crate::error::Result;
use crate::openapi::{OpenApiDocument, Operation, Parameter, RequestBody};
use crate::schema::Schema;
use crate::schema_generator::SchemaRegistry;

pub struct SchemaFilterContext<'c, 'a> {
    /// Canonical type the schema was built for
    pub ty: &'c TypeRef,
    pub contract: &'c DataContract,
    pub registry: &'c mut SchemaRegistry<'a>,
}

pub trait SchemaFilter {
    fn apply(&self, schema: &mut Schema, context: &mut SchemaFilterContext<'_, '_>) -> Result<()>;
}

pub struct ParameterFilterContext<'c, 'a> {
    pub api_parameter: &'c ApiParameter,
    pub registry: &'c mut SchemaRegistry<'a>,
}

pub trait ParameterFilter {
    fn apply(
        &self,
        parameter: &mut Parameter,
        context: &mut ParameterFilterContext<'_, '_>,
    ) -> Result<()>;
}

pub struct RequestBodyFilterContext<'c, 'a> {
    /// The JSON body parameter, if the body came from one
    pub body_parameter: Option<&'c ApiParameter>,
    /// Form fields, if the body came from a form
    pub form_parameters: Vec<&'c ApiParameter>,
    pub registry: &'c mut SchemaRegistry<'a>,
}

pub trait RequestBodyFilter {
    fn apply(
        &self,
        request_body: &mut RequestBody,
        context: &mut RequestBodyFilterContext<'_, '_>,
    ) -> Result<()>;
}

pub struct OperationFilterContext<'c, 'a> {
    pub api_description: &'c ApiDescription,
    pub registry: &'c mut SchemaRegistry<'a>,
}

pub trait OperationFilter {
    fn apply(
        &self,
        operation: &mut Operation,
        context: &mut OperationFilterContext<'_, '_>,
    ) -> Result<()>;
}

pub struct DocumentFilterContext<'c, 'a> {
    /// Every endpoint included in the document
    pub api_descriptions: &'c [ApiDescription],
    pub registry: &'c mut SchemaRegistry<'a>,
}

pub trait DocumentFilter {
    fn apply(
        &self,
        document: &mut OpenApiDocument,
        context: &mut DocumentFilterContext<'_, '_>,
    ) -> Result<()>;
}
