//! Endpoint discovery.
//!
//! The swagger generator consumes an ordered list of [`ApiDescription`]s from an
//! [`ApiDescriptionProvider`]. Each description is one handler bound to one HTTP method and
//! path template, with its parameter bindings and response types.
//!
//! # Providers
//!
//! - **Actix-Web** attribute routes: see [`actix::ActixApiExplorer`]
//! - Any `Vec<ApiDescription>` built by hand

pub mod actix;

use crate::contract::TypeRef;
use std::collections::BTreeMap;
use std::fmt;

/// Supplies the endpoint descriptors for one generation call.
///
/// The returned order is significant: it is the default operation order and decides which
/// description a "first wins" conflict resolver keeps.
pub trait ApiDescriptionProvider {
    fn api_descriptions(&self) -> Vec<ApiDescription>;
}

impl ApiDescriptionProvider for Vec<ApiDescription> {
    fn api_descriptions(&self) -> Vec<ApiDescription> {
        self.clone()
    }
}

/// HTTP methods an operation can be bound to, in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for HttpMethod {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "put" => Ok(HttpMethod::Put),
            "post" => Ok(HttpMethod::Post),
            "delete" => Ok(HttpMethod::Delete),
            "options" => Ok(HttpMethod::Options),
            "head" => Ok(HttpMethod::Head),
            "patch" => Ok(HttpMethod::Patch),
            "trace" => Ok(HttpMethod::Trace),
            _ => Err(format!("Unknown HTTP method: {}", value)),
        }
    }
}

/// Where a parameter value is bound from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource {
    Path,
    Query,
    Header,
    Body,
    Form,
}

/// One request-bound parameter of a handler
#[derive(Debug, Clone, PartialEq)]
pub struct ApiParameter {
    pub name: String,
    pub source: BindingSource,
    pub ty: TypeRef,
    pub required: bool,
    pub deprecated: bool,
    pub description: Option<String>,
}

impl ApiParameter {
    pub fn new(name: impl Into<String>, source: BindingSource, ty: TypeRef, required: bool) -> Self {
        Self {
            name: name.into(),
            source,
            ty,
            required,
            deprecated: false,
            description: None,
        }
    }

    pub fn path(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, BindingSource::Path, ty, true)
    }

    pub fn query(name: impl Into<String>, ty: TypeRef, required: bool) -> Self {
        Self::new(name, BindingSource::Query, ty, required)
    }

    pub fn body(name: impl Into<String>, ty: TypeRef) -> Self {
        let required = !ty.is_option();
        Self::new(name, BindingSource::Body, ty, required)
    }
}

/// A declared response: status code and, when it has a body, the body type
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponseType {
    pub status_code: u16,
    pub ty: Option<TypeRef>,
}

impl ApiResponseType {
    pub fn new(status_code: u16, ty: Option<TypeRef>) -> Self {
        Self { status_code, ty }
    }
}

/// Complete information about a single endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ApiDescription {
    /// Identifies the handler in error messages (`users::get_user`)
    pub action_name: String,
    /// Grouping key, used as the default tag
    pub group_name: Option<String>,
    /// `None` when the route binding does not name a method
    pub http_method: Option<HttpMethod>,
    /// Path template as declared, possibly with a query string or route constraints
    pub relative_path: String,
    pub parameters: Vec<ApiParameter>,
    /// Explicitly declared responses
    pub supported_response_types: Vec<ApiResponseType>,
    /// Type the handler returns as its body, if any
    pub return_type: Option<TypeRef>,
    pub obsolete: bool,
    /// Handler documentation
    pub docs: Option<String>,
    /// Remaining handler attributes by path, with their raw arguments (repeats joined by `, `)
    pub attributes: BTreeMap<String, String>,
}

impl ApiDescription {
    pub fn new(
        action_name: impl Into<String>,
        http_method: Option<HttpMethod>,
        relative_path: impl Into<String>,
    ) -> Self {
        Self {
            action_name: action_name.into(),
            group_name: None,
            http_method,
            relative_path: relative_path.into(),
            parameters: Vec::new(),
            supported_response_types: Vec::new(),
            return_type: None,
            obsolete: false,
            docs: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }

    pub fn with_parameter(mut self, parameter: ApiParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_return_type(mut self, ty: TypeRef) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn with_response(mut self, status_code: u16, ty: Option<TypeRef>) -> Self {
        self.supported_response_types
            .push(ApiResponseType::new(status_code, ty));
        self
    }

    pub fn parameters_from(&self, source: BindingSource) -> impl Iterator<Item = &ApiParameter> {
        self.parameters.iter().filter(move |p| p.source == source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_http_method_round_trips_through_names() {
        for method in HttpMethod::ALL {
            assert_eq!(HttpMethod::try_from(method.as_str()), Ok(method));
        }
        assert_eq!(HttpMethod::try_from("patch"), Ok(HttpMethod::Patch));
        assert!(HttpMethod::try_from("CONNECT").is_err());
    }

    #[test]
    fn test_body_parameter_required_unless_optional() {
        assert!(ApiParameter::body("user", TypeRef::new("User")).required);
        assert!(!ApiParameter::body("user", TypeRef::option(TypeRef::new("User"))).required);
    }

    #[test]
    fn test_parameters_from_source() {
        let description = ApiDescription::new("get_user", Some(HttpMethod::Get), "/users/{id}")
            .with_parameter(ApiParameter::path("id", TypeRef::new("u32")))
            .with_parameter(ApiParameter::query("expand", TypeRef::new("bool"), false));

        let names: Vec<_> = description
            .parameters_from(BindingSource::Query)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["expand"]);
    }
}
