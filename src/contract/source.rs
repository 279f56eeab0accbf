//! Serialization contracts read from Rust source.
//!
//! Indexes every struct, enum and type alias in a [`SourceTree`] (including inline `mod`
//! blocks) and answers [`DataContractResolver::resolve`] by reading the definition and its
//! serde, validation and doc attributes.

use super::attributes::{
    apply_rename_rule, derives, doc_comments, field_constraints, is_deprecated, literal_number,
    serde_attributes,
};
use super::{
    classify_std, ContractKind, DataContract, DataContractResolver, DataProperty, EnumContract,
    EnumMember, EnumRepresentation, ObjectContract, TypeRef,
};
use crate::source::{SourceFile, SourceTree};
use log::debug;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum DefinitionItem {
    Struct(syn::ItemStruct),
    Enum(syn::ItemEnum),
    Alias(syn::ItemType),
}

#[derive(Debug, Clone)]
struct TypeDefinition {
    module: Vec<String>,
    item: DefinitionItem,
}

impl TypeDefinition {
    fn generics(&self) -> &syn::Generics {
        match &self.item {
            DefinitionItem::Struct(s) => &s.generics,
            DefinitionItem::Enum(e) => &e.generics,
            DefinitionItem::Alias(a) => &a.generics,
        }
    }
}

/// Contract resolver backed by parsed Rust source
#[derive(Debug, Default)]
pub struct SourceContractResolver {
    /// Definitions by type name, in source order
    definitions: HashMap<String, Vec<TypeDefinition>>,
}

impl SourceContractResolver {
    pub fn new(tree: &SourceTree) -> Self {
        Self::from_files(&tree.files)
    }

    pub fn from_files(files: &[SourceFile]) -> Self {
        let mut resolver = Self::default();
        for file in files {
            resolver.index_items(&file.syntax_tree.items, &file.module_path);
        }
        debug!(
            "Indexed {} type names from {} files",
            resolver.definitions.len(),
            files.len()
        );
        resolver
    }

    fn index_items(&mut self, items: &[syn::Item], module: &[String]) {
        for item in items {
            let (name, definition) = match item {
                syn::Item::Struct(s) => (s.ident.to_string(), DefinitionItem::Struct(s.clone())),
                syn::Item::Enum(e) => (e.ident.to_string(), DefinitionItem::Enum(e.clone())),
                syn::Item::Type(t) => (t.ident.to_string(), DefinitionItem::Alias(t.clone())),
                syn::Item::Mod(m) => {
                    if let Some((_, nested)) = &m.content {
                        let mut nested_module = module.to_vec();
                        nested_module.push(m.ident.to_string());
                        self.index_items(nested, &nested_module);
                    }
                    continue;
                }
                _ => continue,
            };
            self.definitions
                .entry(name)
                .or_default()
                .push(TypeDefinition {
                    module: module.to_vec(),
                    item: definition,
                });
        }
    }

    /// A qualified name matches the definition whose module ends with the qualifier; an
    /// unqualified one takes the first definition by name.
    fn find(&self, ty: &TypeRef) -> Option<&TypeDefinition> {
        let candidates = self.definitions.get(&ty.name)?;
        if ty.module.is_empty() {
            return candidates.first();
        }
        candidates.iter().find(|d| d.module.ends_with(&ty.module))
    }

    /// Qualify unqualified names that have a definition in `module`
    pub fn qualify(&self, ty: &TypeRef, module: &[String]) -> TypeRef {
        let mut qualified = ty.clone();
        qualified.args = ty.args.iter().map(|a| self.qualify(a, module)).collect();
        if ty.module.is_empty() {
            let local = self
                .definitions
                .get(&ty.name)
                .is_some_and(|defs| defs.iter().any(|d| d.module == module));
            if local {
                qualified.module = module.to_vec();
            }
        }
        qualified
    }

    /// The identity a type resolves to, with every nested argument resolved as well.
    /// Pointer wrappers in arguments are dropped: `Page<Box<User>>` is `Page<User>`.
    pub fn canonicalize(&self, ty: &TypeRef) -> TypeRef {
        let args = ty
            .args
            .iter()
            .map(|a| self.canonicalize(a.unwrap_pointers()))
            .collect();
        let module = if classify_std(ty).is_some() {
            ty.module.clone()
        } else {
            self.find(ty)
                .map(|d| d.module.clone())
                .unwrap_or_else(|| ty.module.clone())
        };
        TypeRef {
            module,
            name: ty.name.clone(),
            args,
        }
    }

    fn struct_contract(
        &self,
        item: &syn::ItemStruct,
        definition: &TypeDefinition,
        canonical: TypeRef,
        params: &HashMap<String, TypeRef>,
        visiting: &mut Vec<TypeRef>,
    ) -> DataContract {
        let container = serde_attributes(&item.attrs);
        let docs = doc_comments(&item.attrs);
        let field_type = |field: &syn::Field| {
            substitute(
                &self.qualify(&TypeRef::from_syn(&field.ty), &definition.module),
                params,
            )
        };

        let kind = match &item.fields {
            syn::Fields::Named(named) => {
                let mut object = ObjectContract::default();

                for field in &named.named {
                    let Some(ident) = &field.ident else { continue };
                    let serde = serde_attributes(&field.attrs);
                    let ty = field_type(field);

                    if serde.flatten {
                        match self.resolve_in(&ty, visiting).kind {
                            ContractKind::Object(inner) => {
                                object.properties.extend(inner.properties);
                                if object.extension_data.is_none() {
                                    object.extension_data = inner.extension_data;
                                }
                            }
                            ContractKind::Dictionary { value, .. } => {
                                object.extension_data = Some(value);
                            }
                            _ => debug!("Cannot flatten {} into {}", ty, canonical),
                        }
                        continue;
                    }

                    let member_name = ident.to_string().trim_start_matches("r#").to_string();
                    let name = match (&serde.rename, &container.rename_all) {
                        (Some(rename), _) => rename.clone(),
                        (None, Some(rule)) => apply_rename_rule(rule, &member_name),
                        (None, None) => member_name.clone(),
                    };
                    let constraints = field_constraints(&field.attrs);
                    let nullable = ty.is_nullable();

                    object.properties.push(DataProperty {
                        name,
                        member_name,
                        required: !nullable && !serde.default && !container.default,
                        nullable,
                        ignored: serde.ignored(),
                        obsolete: is_deprecated(&field.attrs),
                        validation: constraints.validation,
                        format: constraints.format,
                        docs: doc_comments(&field.attrs),
                        ty,
                    });
                }

                ContractKind::Object(object)
            }
            // newtypes serialize as their only field
            syn::Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                let inner = field_type(&unnamed.unnamed[0]);
                self.resolve_in(&inner, visiting).kind
            }
            _ => ContractKind::Dynamic,
        };

        DataContract {
            ty: canonical,
            kind,
            docs,
        }
    }

    fn enum_contract(&self, item: &syn::ItemEnum, canonical: TypeRef) -> DataContract {
        let docs = doc_comments(&item.attrs);

        if item.variants.iter().any(|v| !v.fields.is_empty()) {
            debug!("{} carries data in its variants, describing as dynamic", canonical);
            return DataContract {
                ty: canonical,
                kind: ContractKind::Dynamic,
                docs,
            };
        }

        let container = serde_attributes(&item.attrs);
        let derived = derives(&item.attrs);
        let representation = if derived
            .iter()
            .any(|d| d == "Serialize_repr" || d == "Deserialize_repr")
        {
            Some(EnumRepresentation::Integer)
        } else if derived.iter().any(|d| d == "Serialize" || d == "Deserialize") {
            Some(EnumRepresentation::String)
        } else {
            None
        };

        let mut members = Vec::new();
        let mut next_value = 0i64;
        for variant in &item.variants {
            let value = variant
                .discriminant
                .as_ref()
                .and_then(|(_, expr)| literal_number(expr))
                .map(|v| v as i64)
                .unwrap_or(next_value);
            next_value = value + 1;

            let serde = serde_attributes(&variant.attrs);
            if serde.ignored() {
                continue;
            }
            let ident = variant.ident.to_string();
            let name = match (&serde.rename, &container.rename_all) {
                (Some(rename), _) => rename.clone(),
                (None, Some(rule)) => apply_rename_rule(rule, &ident),
                (None, None) => ident,
            };
            members.push(EnumMember {
                name,
                value,
                docs: doc_comments(&variant.attrs),
            });
        }

        DataContract {
            ty: canonical,
            kind: ContractKind::Enum(EnumContract {
                members,
                representation,
            }),
            docs,
        }
    }
}

impl SourceContractResolver {
    /// `visiting` holds the definitions whose shape is being resolved further up the stack.
    /// Newtypes and aliases that lead back to one of them describe as dynamic.
    fn resolve_in(&self, ty: &TypeRef, visiting: &mut Vec<TypeRef>) -> DataContract {
        let ty = ty.unwrap_transparent();

        if let Some(kind) = classify_std(ty) {
            return DataContract::new(ty.clone(), kind);
        }

        let Some(definition) = self.find(ty) else {
            debug!("No definition found for {}, describing as dynamic", ty);
            return DataContract::dynamic(ty.clone());
        };

        let canonical = TypeRef {
            module: definition.module.clone(),
            name: ty.name.clone(),
            args: ty
                .args
                .iter()
                .map(|a| self.canonicalize(a.unwrap_pointers()))
                .collect(),
        };
        if visiting.contains(&canonical) {
            debug!("{} serializes as itself, describing as dynamic", canonical);
            return DataContract::dynamic(canonical);
        }
        let params: HashMap<String, TypeRef> = definition
            .generics()
            .type_params()
            .map(|p| p.ident.to_string())
            .zip(canonical.args.iter().cloned())
            .collect();

        visiting.push(canonical.clone());
        let contract = match &definition.item {
            DefinitionItem::Struct(item) => {
                self.struct_contract(item, definition, canonical, &params, visiting)
            }
            DefinitionItem::Enum(item) => self.enum_contract(item, canonical),
            DefinitionItem::Alias(item) => {
                let target = substitute(
                    &self.qualify(&TypeRef::from_syn(&item.ty), &definition.module),
                    &params,
                );
                self.resolve_in(&target, visiting)
            }
        };
        visiting.pop();
        contract
    }
}

impl DataContractResolver for SourceContractResolver {
    fn resolve(&self, ty: &TypeRef) -> DataContract {
        self.resolve_in(ty, &mut Vec::new())
    }
}

/// Replace generic parameters by the arguments they were instantiated with
fn substitute(ty: &TypeRef, params: &HashMap<String, TypeRef>) -> TypeRef {
    if ty.module.is_empty() && ty.args.is_empty() {
        if let Some(argument) = params.get(&ty.name) {
            return argument.clone();
        }
    }
    TypeRef {
        module: ty.module.clone(),
        name: ty.name.clone(),
        args: ty.args.iter().map(|a| substitute(a, params)).collect(),
    }
}
