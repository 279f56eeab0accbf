//! Configuration file for the command-line tool.
//!
//! A `swaggen.yaml` file describes the documents to generate and the policy switches of
//! both generators. It is mapped onto [`SchemaGeneratorOptions`] and
//! [`SwaggerGeneratorOptions`]; command-line flags are applied on top of it.
//!
//! ```yaml
//! openapi_version: 3.0.1
//! documents:
//!   v1:
//!     title: Store API
//!     version: "1.0"
//!     include_paths: [/api/v1]
//! schemas:
//!   enums_as_strings: true
//! resolve_conflicts: first
//! security_schemes:
//!   bearer:
//!     type: http
//!     scheme: bearer
//! security:
//!   - bearer: []
//! tag_descriptions:
//!   users: User accounts
//! ```

use crate::error::{Error, Result};
use crate::filters::{
    DocCommentsOperationFilter, DocCommentsSchemaFilter, TagDescriptionsDocumentFilter,
};
use crate::openapi::{Info, SecurityRequirement, SecurityScheme, Server, DEFAULT_OPENAPI_VERSION};
use crate::schema_generator::SchemaGeneratorOptions;
use crate::swagger_generator::{normalize_path, SwaggerGeneratorOptions};
use anyhow::Context;
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Root of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub openapi_version: Option<String>,
    /// Document name → document settings
    pub documents: IndexMap<String, DocumentConfig>,
    pub schemas: SchemaConfig,
    pub ignore_obsolete_actions: bool,
    pub resolve_conflicts: Option<ConflictPolicy>,
    pub servers: Vec<Server>,
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    pub security: Vec<SecurityRequirement>,
    /// Tag name → description
    pub tag_descriptions: IndexMap<String, String>,
}

/// One generated document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentConfig {
    pub title: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Path prefixes of the endpoints to include
    #[serde(default)]
    pub include_paths: Vec<String>,
    /// Groups (handler modules) of the endpoints to include
    #[serde(default)]
    pub include_groups: Vec<String>,
}

impl DocumentConfig {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
            include_paths: Vec::new(),
            include_groups: Vec::new(),
        }
    }

    pub fn info(&self) -> Info {
        Info {
            title: self.title.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
        }
    }

    /// Whether an endpoint on `path` in `group` belongs to this document
    pub fn includes(&self, path: &str, group: Option<&str>) -> bool {
        if self.include_paths.is_empty() && self.include_groups.is_empty() {
            return true;
        }
        let path = normalize_path(path);
        let by_path = self.include_paths.iter().any(|prefix| {
            let prefix = normalize_path(prefix);
            prefix == "/"
                || path == prefix
                || path.starts_with(&format!("{}/", prefix))
        });
        let by_group = group.is_some_and(|group| self.include_groups.iter().any(|g| g == group));
        by_path || by_group
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub enums_as_strings: bool,
    pub camel_case_enums: bool,
    pub inline_enums: bool,
    pub ignore_obsolete_properties: bool,
    /// Module-qualified schema ids
    pub full_type_names: bool,
}

/// Which endpoint is documented when several share a path and method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    First,
    Last,
}

impl GeneratorConfig {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Security requirements must name declared schemes
    pub fn validate(&self) -> Result<()> {
        for requirement in &self.security {
            for scheme in requirement.keys() {
                if !self.security_schemes.contains_key(scheme) {
                    return Err(Error::Config(format!(
                        "security requirement names undeclared scheme \"{}\"",
                        scheme
                    )));
                }
            }
        }
        for (name, document) in &self.documents {
            if document.title.trim().is_empty() {
                return Err(Error::Config(format!("document \"{}\" has no title", name)));
            }
        }
        Ok(())
    }

    pub fn schema_options(&self) -> SchemaGeneratorOptions {
        let mut options = SchemaGeneratorOptions {
            use_inline_definitions_for_enums: self.schemas.inline_enums,
            describe_all_enums_as_strings: self.schemas.enums_as_strings,
            describe_string_enums_in_camel_case: self.schemas.camel_case_enums,
            ignore_obsolete_properties: self.schemas.ignore_obsolete_properties,
            ..Default::default()
        };
        if self.schemas.full_type_names {
            options.use_full_type_names();
        }
        options.add_schema_filter(DocCommentsSchemaFilter);
        options
    }

    pub fn swagger_options(&self) -> SwaggerGeneratorOptions {
        let mut options = SwaggerGeneratorOptions {
            openapi_version: self
                .openapi_version
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAPI_VERSION.to_string()),
            ignore_obsolete_actions: self.ignore_obsolete_actions,
            servers: self.servers.clone(),
            security_schemes: self.security_schemes.clone(),
            security_requirements: self.security.clone(),
            ..Default::default()
        };
        for (name, document) in &self.documents {
            options.swagger_doc(name.clone(), document.info());
        }

        let documents = self.documents.clone();
        options.doc_inclusion_predicate(move |name, description| {
            documents.get(name).map_or(true, |document| {
                document.includes(&description.relative_path, description.group_name.as_deref())
            })
        });

        match self.resolve_conflicts {
            Some(ConflictPolicy::First) => {
                options.resolve_conflicting_actions(|candidates| candidates[0].clone());
            }
            Some(ConflictPolicy::Last) => {
                options.resolve_conflicting_actions(|candidates| {
                    candidates[candidates.len() - 1].clone()
                });
            }
            None => {}
        }

        options.add_operation_filter(DocCommentsOperationFilter);
        if !self.tag_descriptions.is_empty() {
            options.add_document_filter(TagDescriptionsDocumentFilter::new(
                self.tag_descriptions.clone(),
            ));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::ParameterLocation;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
openapi_version: 3.0.3
documents:
  v1:
    title: Store API
    version: "1.0"
    include_paths: [/api/v1]
  admin:
    title: Admin API
    version: "1.0"
    include_groups: [admin]
schemas:
  enums_as_strings: true
  full_type_names: true
resolve_conflicts: first
servers:
  - url: https://store.example.com
security_schemes:
  bearer:
    type: http
    scheme: bearer
    bearerFormat: JWT
  key:
    type: apiKey
    name: X-Api-Key
    in: header
security:
  - bearer: []
tag_descriptions:
  users: User accounts
"#;

    #[test]
    fn test_parse_full_config() {
        let config = GeneratorConfig::from_yaml(CONFIG).unwrap();

        assert_eq!(config.openapi_version.as_deref(), Some("3.0.3"));
        assert_eq!(config.documents.keys().collect::<Vec<_>>(), vec!["v1", "admin"]);
        assert_eq!(config.documents["v1"].include_paths, vec!["/api/v1"]);
        assert!(config.schemas.enums_as_strings);
        assert!(config.schemas.full_type_names);
        assert_eq!(config.resolve_conflicts, Some(ConflictPolicy::First));
        assert_eq!(config.servers[0].url, "https://store.example.com");
        assert_eq!(
            config.security_schemes["key"],
            SecurityScheme::ApiKey {
                name: "X-Api-Key".to_string(),
                location: ParameterLocation::Header,
                description: None,
            }
        );
        assert_eq!(config.tag_descriptions["users"], "User accounts");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GeneratorConfig::from_yaml("{}").unwrap();
        assert_eq!(config, GeneratorConfig::default());

        let options = config.swagger_options();
        assert_eq!(options.openapi_version, DEFAULT_OPENAPI_VERSION);
        assert!(options.conflicting_actions_resolver.is_none());
        assert!(options.document_filters.is_empty());
    }

    #[test]
    fn test_undeclared_security_scheme_is_rejected() {
        let err = GeneratorConfig::from_yaml("security:\n  - oauth: [read]\n").unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("\"oauth\"")));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = GeneratorConfig::from_yaml("ignore_obsolete: true\n").unwrap_err();
        assert!(matches!(err, Error::SerializationError(_)));
    }

    #[test]
    fn test_document_inclusion() {
        let mut document = DocumentConfig::new("API", "1.0");
        assert!(document.includes("/anything", None));

        document.include_paths = vec!["/api/v1".to_string()];
        document.include_groups = vec!["admin".to_string()];
        assert!(document.includes("/api/v1", None));
        assert!(document.includes("api/v1/users/{id}", None));
        assert!(!document.includes("/api/v10/users", None));
        assert!(!document.includes("/health", None));
        assert!(document.includes("/health", Some("admin")));
    }

    #[test]
    fn test_options_follow_config() {
        let config = GeneratorConfig::from_yaml(CONFIG).unwrap();

        let schema_options = config.schema_options();
        assert!(schema_options.describe_all_enums_as_strings);
        assert_eq!(schema_options.schema_filters.len(), 1);

        let options = config.swagger_options();
        assert_eq!(options.openapi_version, "3.0.3");
        assert_eq!(options.swagger_docs.keys().collect::<Vec<_>>(), vec!["v1", "admin"]);
        assert_eq!(options.swagger_docs["v1"].title, "Store API");
        assert!(options.conflicting_actions_resolver.is_some());
        assert_eq!(options.security_requirements.len(), 1);
        assert_eq!(options.document_filters.len(), 1);

        let user = crate::api_explorer::ApiDescription::new("users::list", None, "/api/v1/users");
        assert!((options.doc_inclusion_predicate)("v1", &user));
        assert!(!(options.doc_inclusion_predicate)("admin", &user));
    }
}
