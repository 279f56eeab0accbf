use super::normalize_path;
use crate::api_explorer::ApiDescription;
use heck::ToUpperCamelCase;
use std::collections::HashSet;

/// `{Method}{Segments}`: `GET /collection/{id}` → `GetCollectionById`
pub fn default_operation_id(description: &ApiDescription) -> String {
    let mut operation_id = description
        .http_method
        .map(|method| method.as_str().to_upper_camel_case())
        .unwrap_or_default();

    for segment in normalize_path(&description.relative_path).split('/') {
        if segment.is_empty() {
            continue;
        }
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(parameter) => {
                operation_id.push_str("By");
                operation_id.push_str(&parameter.to_upper_camel_case());
            }
            None => operation_id.push_str(&segment.to_upper_camel_case()),
        }
    }
    operation_id
}

/// `operation_id`, numbered from 2 when it is already taken in the document
pub(super) fn unique_operation_id(operation_id: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = operation_id.to_string();
    let mut suffix = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{}{}", operation_id, suffix);
        suffix += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_explorer::HttpMethod;
    use pretty_assertions::assert_eq;

    fn operation_id(method: HttpMethod, path: &str) -> String {
        default_operation_id(&ApiDescription::new("handler", Some(method), path))
    }

    #[test]
    fn test_operation_ids_from_path_segments() {
        assert_eq!(operation_id(HttpMethod::Get, "/collection"), "GetCollection");
        assert_eq!(operation_id(HttpMethod::Get, "/collection/{id}"), "GetCollectionById");
        assert_eq!(
            operation_id(HttpMethod::Delete, "/api/user-profiles/:profile_id"),
            "DeleteApiUserProfilesByProfileId"
        );
        assert_eq!(operation_id(HttpMethod::Post, "/"), "Post");
    }

    #[test]
    fn test_taken_operation_ids_are_numbered() {
        let mut taken = HashSet::new();
        assert_eq!(unique_operation_id("GetUsers", &mut taken), "GetUsers");
        assert_eq!(unique_operation_id("GetUsers", &mut taken), "GetUsers2");
        assert_eq!(unique_operation_id("GetUsers", &mut taken), "GetUsers3");
        assert_eq!(unique_operation_id("GetUsers2", &mut taken), "GetUsers22");
    }
}
