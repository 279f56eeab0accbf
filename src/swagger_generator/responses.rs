use crate::api_explorer::ApiDescription;
use crate::contract::TypeRef;
use crate::error::Result;
use crate::openapi::{MediaType, Response};
use crate::schema_generator::SchemaRegistry;
use indexmap::IndexMap;

/// Human-readable description of a status code
pub fn status_description(status_code: u16) -> &'static str {
    match status_code {
        100..=199 => "Information",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        200..=299 => "Success",
        304 => "Not Modified",
        300..=399 => "Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        408 => "Request Timeout",
        409 => "Conflict",
        429 => "Too Many Requests",
        400..=499 => "Client Error",
        500..=599 => "Server Error",
        _ => "Error",
    }
}

/// Declared responses, or a synthesized one when the endpoint declares none
pub(super) fn generate_responses(
    description: &ApiDescription,
    registry: &mut SchemaRegistry<'_>,
) -> Result<IndexMap<String, Response>> {
    let mut responses = IndexMap::new();
    for response_type in &description.supported_response_types {
        let status_code = response_type.status_code;
        let response = build_response(status_code, response_type.ty.as_ref(), registry)?;
        responses.insert(status_code.to_string(), response);
    }

    if responses.is_empty() {
        let status_code = match description.return_type {
            Some(_) => 200,
            None => 204,
        };
        let response = build_response(status_code, description.return_type.as_ref(), registry)?;
        responses.insert(status_code.to_string(), response);
    }
    Ok(responses)
}

fn build_response(
    status_code: u16,
    ty: Option<&TypeRef>,
    registry: &mut SchemaRegistry<'_>,
) -> Result<Response> {
    let mut content = IndexMap::new();
    if let Some(ty) = ty {
        let schema = registry.get_or_register(ty)?;
        content.insert("application/json".to_string(), MediaType { schema });
    }
    Ok(Response {
        description: status_description(status_code).to_string(),
        content,
    })
}
