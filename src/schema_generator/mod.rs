//! Schema generation.
//!
//! [`SchemaRegistry`] turns native types into [`Schema`](crate::schema::Schema) nodes and
//! collects the named definitions they reference. [`SchemaGeneratorOptions`] is the one
//! configuration value it reads; build it up front and share it between runs.

mod registry;
mod schema_ids;

pub use registry::SchemaRegistry;
pub use schema_ids::{default_schema_id, full_schema_id};

use crate::contract::TypeRef;
use crate::filters::SchemaFilter;
use crate::schema::Schema;
use std::collections::HashMap;

/// Produces the schema of a mapped type directly
pub type CustomTypeMapping = Box<dyn Fn() -> Schema>;

/// Names the definition of a type
pub type SchemaIdSelector = Box<dyn Fn(&TypeRef) -> String>;

pub struct SchemaGeneratorOptions {
    /// Keyed by `module::Name<Args>`, `module::Name` or bare `Name`
    pub custom_type_mappings: HashMap<String, CustomTypeMapping>,
    pub schema_id_selector: SchemaIdSelector,
    /// Describe enums in place rather than as referenced definitions
    pub use_inline_definitions_for_enums: bool,
    pub describe_all_enums_as_strings: bool,
    pub describe_string_enums_in_camel_case: bool,
    pub ignore_obsolete_properties: bool,
    pub schema_filters: Vec<Box<dyn SchemaFilter>>,
}

impl Default for SchemaGeneratorOptions {
    fn default() -> Self {
        Self {
            custom_type_mappings: HashMap::new(),
            schema_id_selector: Box::new(default_schema_id),
            use_inline_definitions_for_enums: false,
            describe_all_enums_as_strings: false,
            describe_string_enums_in_camel_case: false,
            ignore_obsolete_properties: false,
            schema_filters: Vec::new(),
        }
    }
}

impl SchemaGeneratorOptions {
    pub fn map_type(
        &mut self,
        type_name: impl Into<String>,
        factory: impl Fn() -> Schema + 'static,
    ) -> &mut Self {
        self.custom_type_mappings
            .insert(type_name.into(), Box::new(factory));
        self
    }

    pub fn add_schema_filter(&mut self, filter: impl SchemaFilter + 'static) -> &mut Self {
        self.schema_filters.push(Box::new(filter));
        self
    }

    pub fn use_full_type_names(&mut self) -> &mut Self {
        self.schema_id_selector = Box::new(full_schema_id);
        self
    }
}
