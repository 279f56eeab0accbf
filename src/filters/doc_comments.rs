use super::{OperationFilter, OperationFilterContext, SchemaFilter, SchemaFilterContext};
use crate::contract::ContractKind;
use crate::error::Result;
use crate::openapi::Operation;
use crate::schema::Schema;

/// Copies `///` docs of types and fields into schema descriptions
#[derive(Debug, Default)]
pub struct DocCommentsSchemaFilter;

impl SchemaFilter for DocCommentsSchemaFilter {
    fn apply(&self, schema: &mut Schema, context: &mut SchemaFilterContext<'_, '_>) -> Result<()> {
        if schema.description.is_none() {
            schema.description = context.contract.docs.clone();
        }

        let ContractKind::Object(object) = &context.contract.kind else {
            return Ok(());
        };
        let Some(properties) = schema.properties_mut() else {
            return Ok(());
        };
        for property in &object.properties {
            let (Some(docs), Some(target)) = (&property.docs, properties.get_mut(&property.name))
            else {
                continue;
            };
            // a $ref cannot carry a description
            if !target.is_reference() && target.description.is_none() {
                target.description = Some(docs.clone());
            }
        }
        Ok(())
    }
}

/// Uses handler docs as operation summary (first paragraph) and description (the rest)
#[derive(Debug, Default)]
pub struct DocCommentsOperationFilter;

impl OperationFilter for DocCommentsOperationFilter {
    fn apply(
        &self,
        operation: &mut Operation,
        context: &mut OperationFilterContext<'_, '_>,
    ) -> Result<()> {
        let Some(docs) = &context.api_description.docs else {
            return Ok(());
        };

        let (summary, rest) = match docs.split_once("\n\n") {
            Some((summary, rest)) => (summary, Some(rest.trim())),
            None => (docs.as_str(), None),
        };
        if operation.summary.is_none() {
            operation.summary = Some(summary.replace('\n', " "));
        }
        if operation.description.is_none() {
            operation.description = rest.filter(|r| !r.is_empty()).map(str::to_string);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_explorer::{ApiDescription, HttpMethod};
    use crate::contract::source::SourceContractResolver;
    use crate::contract::TypeRef;
    use crate::schema_generator::{SchemaGeneratorOptions, SchemaRegistry};
    use crate::source::SourceFile;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_and_field_docs_become_descriptions() {
        let file = SourceFile::parse(
            "src/lib.rs",
            r#"
            /// A customer order.
            pub struct Order {
                /// Order number
                pub id: u64,
                /// Who placed it
                pub customer: Customer,
            }
            pub struct Customer { pub name: String }
            "#,
        )
        .unwrap();
        let resolver = SourceContractResolver::from_files(std::slice::from_ref(&file));
        let mut options = SchemaGeneratorOptions::default();
        options.add_schema_filter(DocCommentsSchemaFilter);
        let mut registry = SchemaRegistry::new(&options, &resolver);

        registry.get_or_register(&TypeRef::new("Order")).unwrap();

        let order = &registry.definitions()["Order"];
        assert_eq!(order.description.as_deref(), Some("A customer order."));
        let properties = order.properties().unwrap();
        assert_eq!(properties["id"].description.as_deref(), Some("Order number"));
        assert!(properties["customer"].is_reference());
        assert_eq!(properties["customer"].description, None);
    }

    #[test]
    fn test_handler_docs_split_into_summary_and_description() {
        let resolver = SourceContractResolver::default();
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);
        let mut description = ApiDescription::new("list", Some(HttpMethod::Get), "/users");
        description.docs = Some("List users\nin pages\n\nResults are sorted by id.".to_string());

        let mut operation = Operation::default();
        DocCommentsOperationFilter
            .apply(
                &mut operation,
                &mut OperationFilterContext {
                    api_description: &description,
                    registry: &mut registry,
                },
            )
            .unwrap();

        assert_eq!(operation.summary.as_deref(), Some("List users in pages"));
        assert_eq!(
            operation.description.as_deref(),
            Some("Results are sorted by id.")
        );
    }
}
