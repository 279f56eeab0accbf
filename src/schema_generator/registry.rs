use super::SchemaGeneratorOptions;
use crate::contract::{
    ContractKind, DataContract, DataContractResolver, EnumContract, EnumMember,
    EnumRepresentation, ObjectContract, TypeRef,
};
use crate::error::{Error, Result};
use crate::filters::SchemaFilterContext;
use crate::schema::{DataType, Schema, SchemaKind};
use heck::ToLowerCamelCase;
use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Converts types into schema nodes and owns the definitions they reference.
///
/// Objects, referenced enums and self-referencing containers are never expanded in place:
/// the first request assigns the type its schema id, queues it and returns a reference.
/// Queued types are built after the requested node, in a worklist loop that ends when no
/// type is left without a definition. A type is only ever queued once, so cyclic graphs
/// terminate and repeated requests return the same reference.
///
/// One registry serves one document generation call.
pub struct SchemaRegistry<'a> {
    options: &'a SchemaGeneratorOptions,
    resolver: &'a dyn DataContractResolver,
    /// Type → schema id, recorded before the definition is built
    pending: HashMap<TypeRef, String>,
    /// Schema id → the type it was assigned to
    owners: HashMap<String, TypeRef>,
    queue: VecDeque<TypeRef>,
    definitions: BTreeMap<String, Schema>,
}

impl<'a> SchemaRegistry<'a> {
    pub fn new(options: &'a SchemaGeneratorOptions, resolver: &'a dyn DataContractResolver) -> Self {
        Self {
            options,
            resolver,
            pending: HashMap::new(),
            owners: HashMap::new(),
            queue: VecDeque::new(),
            definitions: BTreeMap::new(),
        }
    }

    /// Schema for `ty`, registering every definition it needs.
    ///
    /// Fails only when two distinct types are assigned the same schema id, or when a
    /// schema filter fails.
    pub fn get_or_register(&mut self, ty: &TypeRef) -> Result<Schema> {
        let schema = self.generate_schema(ty)?;
        self.resolve_pending()?;
        Ok(schema)
    }

    pub fn definitions(&self) -> &BTreeMap<String, Schema> {
        &self.definitions
    }

    pub fn into_definitions(self) -> BTreeMap<String, Schema> {
        self.definitions
    }

    /// The schema id assigned to a type, if it has been registered
    pub fn schema_id(&self, ty: &TypeRef) -> Option<&str> {
        let canonical = self.resolver.resolve(ty).ty;
        self.pending.get(&canonical).map(String::as_str)
    }

    pub fn resolver(&self) -> &'a dyn DataContractResolver {
        self.resolver
    }

    pub fn options(&self) -> &'a SchemaGeneratorOptions {
        self.options
    }

    fn generate_schema(&mut self, ty: &TypeRef) -> Result<Schema> {
        let ty = ty.unwrap_transparent();
        if let Some(schema) = self.custom_mapping(ty) {
            return Ok(schema);
        }

        let contract = self.resolver.resolve(ty);
        if let Some(schema) = self.custom_mapping(&contract.ty) {
            return Ok(schema);
        }

        if self.is_referenced(&contract) {
            return self.reference(&contract.ty);
        }
        self.build_schema(&contract)
    }

    /// Build queued definitions until none is left
    fn resolve_pending(&mut self) -> Result<()> {
        while let Some(ty) = self.queue.pop_front() {
            let Some(schema_id) = self.pending.get(&ty).cloned() else {
                continue;
            };
            trace!("Building definition \"{}\" for {}", schema_id, ty);
            let contract = self.resolver.resolve(&ty);
            let schema = self.build_schema(&contract)?;
            self.definitions.insert(schema_id, schema);
        }
        Ok(())
    }

    fn custom_mapping(&self, ty: &TypeRef) -> Option<Schema> {
        let mappings = &self.options.custom_type_mappings;
        if mappings.is_empty() {
            return None;
        }
        [ty.to_string(), ty.generic_definition(), ty.name.clone()]
            .iter()
            .find_map(|key| mappings.get(key))
            .map(|factory| factory())
    }

    fn is_referenced(&self, contract: &DataContract) -> bool {
        match &contract.kind {
            ContractKind::Object(_) => true,
            ContractKind::Enum(_) => !self.options.use_inline_definitions_for_enums,
            ContractKind::Array { item, .. } => self.resolver.resolve(item).ty == contract.ty,
            ContractKind::Dictionary { value, .. } => {
                self.resolver.resolve(value).ty == contract.ty
            }
            ContractKind::Primitive(_) | ContractKind::Dynamic => false,
        }
    }

    fn reference(&mut self, ty: &TypeRef) -> Result<Schema> {
        if let Some(schema_id) = self.pending.get(ty) {
            return Ok(Schema::reference(schema_id.clone()));
        }

        let schema_id = (self.options.schema_id_selector)(ty);
        if let Some(existing) = self.owners.get(&schema_id) {
            return Err(Error::SchemaIdConflict {
                schema_id,
                existing: existing.to_string(),
                conflicting: ty.to_string(),
            });
        }

        debug!("Registering {} as \"{}\"", ty, schema_id);
        self.pending.insert(ty.clone(), schema_id.clone());
        self.owners.insert(schema_id.clone(), ty.clone());
        self.queue.push_back(ty.clone());
        Ok(Schema::reference(schema_id))
    }

    /// Build the node for a contract in place, then run the schema filters on it
    fn build_schema(&mut self, contract: &DataContract) -> Result<Schema> {
        let mut schema = match &contract.kind {
            ContractKind::Primitive(primitive) => {
                Schema::primitive(primitive.data_type, primitive.format)
            }
            ContractKind::Enum(enum_contract) => self.enum_schema(enum_contract),
            ContractKind::Array { item, unique } => {
                Schema::array(self.generate_schema(item)?, *unique)
            }
            ContractKind::Dictionary { key, value } => self.dictionary_schema(key, value)?,
            ContractKind::Object(object) => self.object_schema(object)?,
            ContractKind::Dynamic => Schema::empty_object(),
        };

        let options = self.options;
        for filter in &options.schema_filters {
            let mut context = SchemaFilterContext {
                ty: &contract.ty,
                contract,
                registry: &mut *self,
            };
            filter.apply(&mut schema, &mut context)?;
        }
        Ok(schema)
    }

    fn enum_schema(&self, contract: &EnumContract) -> Schema {
        let as_strings = self.options.describe_all_enums_as_strings
            || contract.representation == Some(EnumRepresentation::String);

        let kind = if as_strings {
            SchemaKind::Enum {
                data_type: DataType::String,
                format: None,
                values: contract
                    .members
                    .iter()
                    .map(|m| self.enum_member_name(m).into())
                    .collect(),
            }
        } else {
            SchemaKind::Enum {
                data_type: DataType::Integer,
                format: Some("int32".to_string()),
                values: contract.members.iter().map(|m| m.value.into()).collect(),
            }
        };
        Schema::new(kind)
    }

    fn enum_member_name(&self, member: &EnumMember) -> String {
        if self.options.describe_string_enums_in_camel_case {
            member.name.to_lower_camel_case()
        } else {
            member.name.clone()
        }
    }

    /// Maps keyed by an enum list each member as a property
    fn dictionary_schema(&mut self, key: &TypeRef, value: &TypeRef) -> Result<Schema> {
        let ContractKind::Enum(keys) = self.resolver.resolve(key).kind else {
            return Ok(Schema::map(self.generate_schema(value)?));
        };

        let mut properties = IndexMap::new();
        for member in &keys.members {
            properties.insert(self.enum_member_name(member), self.generate_schema(value)?);
        }
        Ok(Schema::new(SchemaKind::Object {
            properties,
            required: BTreeSet::new(),
            additional_properties: None,
        }))
    }

    fn object_schema(&mut self, object: &ObjectContract) -> Result<Schema> {
        let mut properties = IndexMap::new();
        let mut required = BTreeSet::new();

        for property in &object.properties {
            if property.ignored || (property.obsolete && self.options.ignore_obsolete_properties)
            {
                continue;
            }

            let mut schema = self.generate_schema(&property.ty)?;
            if !schema.is_reference() {
                schema.nullable |= property.nullable;
                schema.deprecated |= property.obsolete;
                if let Some(format) = &property.format {
                    schema.set_format(format);
                }
                schema.apply_validation(&property.validation);
            }

            if property.required {
                required.insert(property.name.clone());
            }
            properties.insert(property.name.clone(), schema);
        }

        let additional_properties = match &object.extension_data {
            Some(value) => Some(Box::new(self.generate_schema(value)?)),
            None => None,
        };

        Ok(Schema::new(SchemaKind::Object {
            properties,
            required,
            additional_properties,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::source::SourceContractResolver;
    use crate::filters::SchemaFilter;
    use crate::source::SourceFile;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn resolver(files: &[(&str, &str)]) -> SourceContractResolver {
        let parsed: Vec<SourceFile> = files
            .iter()
            .map(|(path, code)| SourceFile::parse(*path, code).unwrap())
            .collect();
        SourceContractResolver::from_files(&parsed)
    }

    fn lib(code: &str) -> SourceContractResolver {
        resolver(&[("src/lib.rs", code)])
    }

    fn ty(s: &str) -> TypeRef {
        s.parse().unwrap()
    }

    struct AppendMarker(&'static str);

    impl SchemaFilter for AppendMarker {
        fn apply(&self, schema: &mut Schema, _context: &mut SchemaFilterContext<'_, '_>) -> Result<()> {
            schema
                .description
                .get_or_insert_with(String::new)
                .push_str(self.0);
            Ok(())
        }
    }

    #[test]
    fn test_primitives_are_inline() {
        let resolver = lib("");
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        let schema = registry.get_or_register(&ty("Option<i64>")).unwrap();

        assert_eq!(schema, Schema::primitive(DataType::Integer, Some("int64")));
        assert!(registry.definitions().is_empty());
        assert_eq!(
            registry.get_or_register(&ty("Vec<u8>")).unwrap().format(),
            Some("byte")
        );
    }

    #[test]
    fn test_repeated_registration_is_stable() {
        let resolver = lib("pub struct User { pub id: u32, pub name: String }");
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        let first = registry.get_or_register(&ty("User")).unwrap();
        let second = registry.get_or_register(&ty("User")).unwrap();

        assert_eq!(first.reference_id(), Some("User"));
        assert_eq!(first, second);
        assert_eq!(registry.definitions().len(), 1);
        assert_eq!(registry.schema_id(&ty("User")), Some("User"));
    }

    #[test]
    fn test_self_reference_terminates() {
        let resolver = lib(
            r#"
            pub struct Node {
                pub value: u32,
                pub children: Vec<Node>,
                pub parent: Option<Box<Node>>,
            }
            "#,
        );
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        registry.get_or_register(&ty("Node")).unwrap();

        assert_eq!(registry.definitions().len(), 1);
        let properties = registry.definitions()["Node"].properties().unwrap();
        assert_eq!(
            properties["children"].items().and_then(Schema::reference_id),
            Some("Node")
        );
        assert_eq!(properties["parent"].reference_id(), Some("Node"));
    }

    #[test]
    fn test_mutual_references_terminate() {
        let resolver = lib(
            r#"
            pub struct Author { pub name: String, pub books: Vec<Book> }
            pub struct Book { pub title: String, pub author: Author }
            "#,
        );
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        registry.get_or_register(&ty("Book")).unwrap();

        let ids: Vec<_> = registry.definitions().keys().cloned().collect();
        assert_eq!(ids, vec!["Author", "Book"]);
    }

    #[test]
    fn test_self_referencing_containers_are_referenced() {
        let resolver = lib(
            r#"
            pub struct Tree(pub Vec<Tree>);
            pub struct Index(pub HashMap<String, Index>);
            "#,
        );
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        let tree = registry.get_or_register(&ty("Tree")).unwrap();
        let index = registry.get_or_register(&ty("Index")).unwrap();

        assert_eq!(tree.reference_id(), Some("Tree"));
        assert_eq!(index.reference_id(), Some("Index"));
        let definition = &registry.definitions()["Tree"];
        assert_eq!(definition.data_type(), Some(DataType::Array));
        assert_eq!(
            definition.items().and_then(Schema::reference_id),
            Some("Tree")
        );
        assert_eq!(
            serde_json::to_value(&registry.definitions()["Index"]).unwrap(),
            json!({
                "type": "object",
                "additionalProperties": { "$ref": "#/components/schemas/Index" }
            })
        );
    }

    #[test]
    fn test_plain_containers_are_inline() {
        let resolver = lib("pub struct Tag { pub label: String }");
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        let schema = registry.get_or_register(&ty("BTreeSet<Tag>")).unwrap();

        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "type": "array",
                "items": { "$ref": "#/components/schemas/Tag" },
                "uniqueItems": true
            })
        );
        assert!(registry.definitions().contains_key("Tag"));
    }

    #[test]
    fn test_schema_id_conflict_is_fatal_before_mutation() {
        let resolver = resolver(&[
            ("src/orders.rs", "pub struct Item { pub quantity: u32 }"),
            ("src/catalog.rs", "pub struct Item { pub sku: String }"),
        ]);
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        registry.get_or_register(&ty("orders::Item")).unwrap();
        let err = registry.get_or_register(&ty("catalog::Item")).unwrap_err();

        match err {
            Error::SchemaIdConflict {
                schema_id,
                existing,
                conflicting,
            } => {
                assert_eq!(schema_id, "Item");
                assert_eq!(existing, "orders::Item");
                assert_eq!(conflicting, "catalog::Item");
            }
            other => panic!("Expected schema id conflict, got {:?}", other),
        }
        assert_eq!(registry.definitions().len(), 1);
        let kept = registry.definitions()["Item"].properties().unwrap();
        assert!(kept.contains_key("quantity"));
    }

    #[test]
    fn test_full_type_names_avoid_conflicts() {
        let resolver = resolver(&[
            ("src/orders.rs", "pub struct Item { pub quantity: u32 }"),
            ("src/catalog.rs", "pub struct Item { pub sku: String }"),
        ]);
        let mut options = SchemaGeneratorOptions::default();
        options.use_full_type_names();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        registry.get_or_register(&ty("orders::Item")).unwrap();
        registry.get_or_register(&ty("catalog::Item")).unwrap();

        let ids: Vec<_> = registry.definitions().keys().cloned().collect();
        assert_eq!(ids, vec!["catalog.Item", "orders.Item"]);
    }

    #[test]
    fn test_enum_as_integer_and_as_string() {
        let code = "pub enum Letter { A = 1, B = 2 }";

        let resolver = lib(code);
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);
        registry.get_or_register(&ty("Letter")).unwrap();
        let numeric = &registry.definitions()["Letter"];
        assert_eq!(numeric.data_type(), Some(DataType::Integer));
        assert_eq!(numeric.enum_values(), Some(&[json!(1), json!(2)][..]));

        let options = SchemaGeneratorOptions {
            describe_all_enums_as_strings: true,
            ..Default::default()
        };
        let mut registry = SchemaRegistry::new(&options, &resolver);
        registry.get_or_register(&ty("Letter")).unwrap();
        let named = &registry.definitions()["Letter"];
        assert_eq!(named.data_type(), Some(DataType::String));
        assert_eq!(named.enum_values(), Some(&[json!("A"), json!("B")][..]));
    }

    #[test]
    fn test_string_enum_policies() {
        let resolver = lib(
            r#"
            #[derive(Serialize)]
            pub enum Status { InProgress, Done }
            "#,
        );
        let options = SchemaGeneratorOptions {
            describe_string_enums_in_camel_case: true,
            use_inline_definitions_for_enums: true,
            ..Default::default()
        };
        let mut registry = SchemaRegistry::new(&options, &resolver);

        let schema = registry.get_or_register(&ty("Status")).unwrap();

        assert!(registry.definitions().is_empty());
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({ "type": "string", "enum": ["inProgress", "done"] })
        );
    }

    #[test]
    fn test_object_properties() {
        let resolver = lib(
            r#"
            pub struct Account {
                #[validate(length(min = 3, max = 20))]
                pub username: String,
                #[validate(email)]
                pub email: Option<String>,
                #[serde(skip)]
                pub password_hash: String,
                #[deprecated]
                pub legacy_id: Option<u64>,
                #[validate(range(min = 18))]
                pub age: u8,
                #[serde(flatten)]
                pub extra: HashMap<String, String>,
            }
            "#,
        );
        let options = SchemaGeneratorOptions {
            ignore_obsolete_properties: true,
            ..Default::default()
        };
        let mut registry = SchemaRegistry::new(&options, &resolver);

        registry.get_or_register(&ty("Account")).unwrap();

        assert_eq!(
            serde_json::to_value(&registry.definitions()["Account"]).unwrap(),
            json!({
                "type": "object",
                "properties": {
                    "username": { "type": "string", "minLength": 3, "maxLength": 20 },
                    "email": { "type": "string", "format": "email", "nullable": true },
                    "age": { "type": "integer", "format": "int32", "minimum": 18 }
                },
                "required": ["age", "username"],
                "additionalProperties": { "type": "string" }
            })
        );
    }

    #[test]
    fn test_enum_keyed_maps_list_members() {
        let resolver = lib(
            r#"
            #[derive(Serialize)]
            pub enum Color { Red, Green }
            pub struct Palette { pub weights: BTreeMap<Color, f32> }
            "#,
        );
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        registry.get_or_register(&ty("Palette")).unwrap();

        let weights = &registry.definitions()["Palette"].properties().unwrap()["weights"];
        let keys: Vec<_> = weights.properties().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["Red", "Green"]);
    }

    #[test]
    fn test_generic_types_get_argument_ids() {
        let resolver = lib(
            r#"
            pub struct Page<T> { pub items: Vec<T>, pub total: u64 }
            pub struct User { pub id: u32 }
            "#,
        );
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        let schema = registry.get_or_register(&ty("Page<User>")).unwrap();

        assert_eq!(schema.reference_id(), Some("Page[User]"));
        let items = &registry.definitions()["Page[User]"].properties().unwrap()["items"];
        assert_eq!(items.items().and_then(Schema::reference_id), Some("User"));
    }

    #[test]
    fn test_recursive_newtype_terminates() {
        let resolver = lib(
            r#"
            pub struct Chain(pub Option<Box<Chain>>);
            pub struct Holder { pub chain: Chain }
            "#,
        );
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        assert_eq!(
            registry.get_or_register(&ty("Chain")).unwrap(),
            Schema::empty_object()
        );
        registry.get_or_register(&ty("Holder")).unwrap();
        let properties = registry.definitions()["Holder"].properties().unwrap();
        assert_eq!(properties["chain"], Schema::empty_object());
    }

    #[test]
    fn test_boxed_generic_arguments_share_a_definition() {
        let resolver = lib(
            r#"
            pub struct Page<T> { pub items: Vec<T>, pub total: u64 }
            pub struct User { pub id: u32 }
            "#,
        );
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        let plain = registry.get_or_register(&ty("Page<User>")).unwrap();
        let boxed = registry.get_or_register(&ty("Page<Box<User>>")).unwrap();

        assert_eq!(plain, boxed);
        assert_eq!(plain.reference_id(), Some("Page[User]"));
        let ids: Vec<_> = registry.definitions().keys().cloned().collect();
        assert_eq!(ids, vec!["Page[User]", "User"]);
    }

    #[test]
    fn test_unknown_types_fall_back_to_empty_object() {
        let resolver = lib("pub enum Shape { Circle(f64) }");
        let options = SchemaGeneratorOptions::default();
        let mut registry = SchemaRegistry::new(&options, &resolver);

        assert_eq!(
            registry.get_or_register(&ty("Mystery")).unwrap(),
            Schema::empty_object()
        );
        assert_eq!(
            registry.get_or_register(&ty("Shape")).unwrap(),
            Schema::empty_object()
        );
        assert!(registry.definitions().is_empty());
    }

    #[test]
    fn test_custom_mapping_bypasses_generation() {
        let resolver = lib("pub struct Money { pub cents: i64 }");
        let mut options = SchemaGeneratorOptions::default();
        options
            .map_type("Money", || Schema::primitive(DataType::String, Some("decimal")))
            .add_schema_filter(AppendMarker("filtered"));
        let mut registry = SchemaRegistry::new(&options, &resolver);

        let schema = registry.get_or_register(&ty("Money")).unwrap();

        assert_eq!(schema, Schema::primitive(DataType::String, Some("decimal")));
        assert!(registry.definitions().is_empty());
    }

    #[test]
    fn test_schema_filters_run_in_registration_order() {
        let resolver = lib("pub struct User { pub id: u32 }");
        let mut options = SchemaGeneratorOptions::default();
        options
            .add_schema_filter(AppendMarker("F1"))
            .add_schema_filter(AppendMarker("F2"));
        let mut registry = SchemaRegistry::new(&options, &resolver);

        let reference = registry.get_or_register(&ty("User")).unwrap();

        assert_eq!(reference.description, None);
        let user = &registry.definitions()["User"];
        assert!(user.description.as_deref().unwrap().ends_with("F1F2"));
        assert_eq!(
            user.properties().unwrap()["id"].description.as_deref(),
            Some("F1F2")
        );
    }

    struct AttachAudit;

    impl SchemaFilter for AttachAudit {
        fn apply(&self, schema: &mut Schema, context: &mut SchemaFilterContext<'_, '_>) -> Result<()> {
            if context.ty.name != "User" {
                return Ok(());
            }
            let audit = context.registry.get_or_register(&TypeRef::new("Audit"))?;
            let own = context.registry.get_or_register(context.ty)?;
            if let Some(properties) = schema.properties_mut() {
                properties.insert("audit".to_string(), audit);
                properties.insert("self".to_string(), own);
            }
            Ok(())
        }
    }

    #[test]
    fn test_filters_may_register_types() {
        let resolver = lib(
            r#"
            pub struct User { pub id: u32 }
            pub struct Audit { pub by: String }
            "#,
        );
        let mut options = SchemaGeneratorOptions::default();
        options.add_schema_filter(AttachAudit);
        let mut registry = SchemaRegistry::new(&options, &resolver);

        registry.get_or_register(&ty("User")).unwrap();

        let user = registry.definitions()["User"].properties().unwrap();
        assert_eq!(user["audit"].reference_id(), Some("Audit"));
        assert_eq!(user["self"].reference_id(), Some("User"));
        assert!(registry.definitions().contains_key("Audit"));
    }
}
