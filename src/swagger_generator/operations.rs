use super::operation_ids::unique_operation_id;
use super::{normalize_path, responses, SwaggerGenerator};
use crate::api_explorer::{ApiDescription, ApiParameter, BindingSource, HttpMethod};
use crate::error::{Error, Result};
use crate::filters::{OperationFilterContext, ParameterFilterContext, RequestBodyFilterContext};
use crate::openapi::{
    MediaType, Operation, Parameter, ParameterLocation, ParameterStyle, PathItem, RequestBody,
};
use crate::schema::{Schema, SchemaKind};
use crate::schema_generator::SchemaRegistry;
use indexmap::IndexMap;
use log::debug;
use std::collections::{BTreeSet, HashSet};

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

impl SwaggerGenerator<'_> {
    /// Path items for the selected endpoints, keyed by normalized path
    pub(super) fn generate_paths(
        &self,
        descriptions: &[ApiDescription],
        registry: &mut SchemaRegistry<'_>,
    ) -> Result<IndexMap<String, PathItem>> {
        let mut applicable: Vec<&ApiDescription> = descriptions
            .iter()
            .filter(|description| !(self.options.ignore_obsolete_actions && description.obsolete))
            .collect();
        if let Some(sort_key) = &self.options.sort_key_selector {
            applicable.sort_by_cached_key(|description| sort_key(description));
        }

        let mut by_path: IndexMap<String, Vec<&ApiDescription>> = IndexMap::new();
        for description in applicable {
            by_path
                .entry(normalize_path(&description.relative_path))
                .or_default()
                .push(description);
        }

        let mut paths = IndexMap::new();
        let mut operation_ids = HashSet::new();
        for (path, group) in by_path {
            let mut by_method: IndexMap<HttpMethod, Vec<&ApiDescription>> = IndexMap::new();
            for description in group {
                let method = description.http_method.ok_or_else(|| Error::AmbiguousHttpMethod {
                    action: description.action_name.clone(),
                })?;
                by_method.entry(method).or_default().push(description);
            }

            let mut item = PathItem::default();
            for (method, candidates) in by_method {
                let resolved;
                let description = if let [single] = candidates.as_slice() {
                    *single
                } else {
                    resolved = self.resolve_conflict(&path, method, &candidates)?;
                    &resolved
                };
                let mut operation = self.generate_operation(description, registry)?;
                if let Some(operation_id) = &mut operation.operation_id {
                    *operation_id = unique_operation_id(operation_id, &mut operation_ids);
                }
                item.set_operation(method, operation);
            }
            paths.insert(path, item);
        }
        Ok(paths)
    }

    fn resolve_conflict(
        &self,
        path: &str,
        method: HttpMethod,
        candidates: &[&ApiDescription],
    ) -> Result<ApiDescription> {
        let Some(resolver) = &self.options.conflicting_actions_resolver else {
            return Err(Error::ConflictingActions {
                method: method.to_string(),
                path: path.to_string(),
                actions: candidates
                    .iter()
                    .map(|description| description.action_name.clone())
                    .collect(),
            });
        };
        let owned: Vec<ApiDescription> = candidates.iter().map(|d| (*d).clone()).collect();
        let resolved = resolver(&owned);
        debug!(
            "Resolved {} actions on {} {} to {}",
            owned.len(),
            method,
            path,
            resolved.action_name
        );
        Ok(resolved)
    }

    fn generate_operation(
        &self,
        description: &ApiDescription,
        registry: &mut SchemaRegistry<'_>,
    ) -> Result<Operation> {
        let mut operation = Operation {
            tags: (self.options.tags_selector)(description),
            operation_id: Some((self.options.operation_id_selector)(description)),
            parameters: self.generate_parameters(description, registry)?,
            request_body: self.generate_request_body(description, registry)?,
            responses: responses::generate_responses(description, registry)?,
            deprecated: description.obsolete,
            ..Default::default()
        };

        for filter in &self.options.operation_filters {
            let mut context = OperationFilterContext {
                api_description: description,
                registry: &mut *registry,
            };
            filter.apply(&mut operation, &mut context)?;
        }
        Ok(operation)
    }

    fn generate_parameters(
        &self,
        description: &ApiDescription,
        registry: &mut SchemaRegistry<'_>,
    ) -> Result<Vec<Parameter>> {
        let mut parameters = Vec::new();
        for api_parameter in &description.parameters {
            let location = match api_parameter.source {
                BindingSource::Path => ParameterLocation::Path,
                BindingSource::Query => ParameterLocation::Query,
                BindingSource::Header => ParameterLocation::Header,
                BindingSource::Body | BindingSource::Form => continue,
            };

            let schema = registry.get_or_register(&api_parameter.ty)?;
            let multiple = location != ParameterLocation::Path
                && matches!(schema.kind, SchemaKind::Array { .. });
            let mut parameter = Parameter {
                name: api_parameter.name.clone(),
                location,
                description: api_parameter.description.clone(),
                required: location == ParameterLocation::Path || api_parameter.required,
                deprecated: api_parameter.deprecated,
                style: multiple.then_some(ParameterStyle::Form),
                explode: multiple.then_some(true),
                schema,
            };

            for filter in &self.options.parameter_filters {
                let mut context = ParameterFilterContext {
                    api_parameter,
                    registry: &mut *registry,
                };
                filter.apply(&mut parameter, &mut context)?;
            }
            parameters.push(parameter);
        }
        Ok(parameters)
    }

    fn generate_request_body(
        &self,
        description: &ApiDescription,
        registry: &mut SchemaRegistry<'_>,
    ) -> Result<Option<RequestBody>> {
        let body_parameter = description.parameters_from(BindingSource::Body).next();
        let form_parameters: Vec<&ApiParameter> =
            description.parameters_from(BindingSource::Form).collect();

        let mut request_body = if let Some(body) = body_parameter {
            RequestBody {
                description: body.description.clone(),
                content: IndexMap::from([(
                    JSON_CONTENT_TYPE.to_string(),
                    MediaType {
                        schema: registry.get_or_register(&body.ty)?,
                    },
                )]),
                required: body.required,
            }
        } else if !form_parameters.is_empty() {
            let schema = form_schema(&form_parameters, registry)?;
            let required = form_parameters.iter().any(|field| field.required);
            RequestBody {
                description: None,
                content: IndexMap::from([(FORM_CONTENT_TYPE.to_string(), MediaType { schema })]),
                required,
            }
        } else {
            return Ok(None);
        };

        for filter in &self.options.request_body_filters {
            let mut context = RequestBodyFilterContext {
                body_parameter,
                form_parameters: form_parameters.clone(),
                registry: &mut *registry,
            };
            filter.apply(&mut request_body, &mut context)?;
        }
        Ok(Some(request_body))
    }
}

/// One object whose properties are the form fields
fn form_schema(fields: &[&ApiParameter], registry: &mut SchemaRegistry<'_>) -> Result<Schema> {
    let mut properties = IndexMap::new();
    let mut required = BTreeSet::new();
    for field in fields {
        let mut schema = registry.get_or_register(&field.ty)?;
        if !schema.is_reference() && field.description.is_some() {
            schema.description = field.description.clone();
        }
        if field.required {
            required.insert(field.name.clone());
        }
        properties.insert(field.name.clone(), schema);
    }
    Ok(Schema::new(SchemaKind::Object {
        properties,
        required,
        additional_properties: None,
    }))
}
