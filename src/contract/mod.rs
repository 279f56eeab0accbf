//! Type classification.
//!
//! The schema registry never inspects Rust types itself. It asks a
//! [`DataContractResolver`] for the [`DataContract`] of a [`TypeRef`] and works from the
//! returned shape: primitive, enum, array, dictionary, object or dynamic.
//!
//! [`classify_std`] covers the standard library and the common ecosystem scalars
//! (`chrono`, `uuid`, `url`, ...) through a static lookup table; resolvers call it before
//! looking at user definitions. The syn-backed resolver lives in [`source`].

pub(crate) mod attributes;
pub mod source;

use crate::schema::{DataType, Validation};
use std::fmt;
use std::str::FromStr;

/// Identity of a native type: `module::path::Name<Args>`.
///
/// `module` is empty when the use site did not qualify the name. Resolvers return the
/// canonical (fully-qualified) form in [`DataContract::ty`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef {
    pub module: Vec<String>,
    pub name: String,
    pub args: Vec<TypeRef>,
}

/// Name used for tuple types; the elements are the args
pub const TUPLE_NAME: &str = "(..)";
/// Name used for types the resolver cannot describe (`impl Trait`, fn pointers, `_`)
pub const INFERRED_NAME: &str = "_";

/// Wrappers that are transparent to serialization; `Option` also makes the value nullable
const TRANSPARENT_WRAPPERS: &[&str] = &["Option", "Box", "Rc", "Arc", "Cow", "RefCell", "Cell"];

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module: Vec::new(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<TypeRef>) -> Self {
        self.args = args;
        self
    }

    pub fn in_module<S: Into<String>>(mut self, module: impl IntoIterator<Item = S>) -> Self {
        self.module = module.into_iter().map(Into::into).collect();
        self
    }

    pub fn option(inner: TypeRef) -> Self {
        Self::new("Option").with_args(vec![inner])
    }

    pub fn vec(inner: TypeRef) -> Self {
        Self::new("Vec").with_args(vec![inner])
    }

    pub fn tuple(elements: Vec<TypeRef>) -> Self {
        Self::new(TUPLE_NAME).with_args(elements)
    }

    pub fn inferred() -> Self {
        Self::new(INFERRED_NAME)
    }

    pub fn is_tuple(&self) -> bool {
        self.name == TUPLE_NAME
    }

    pub fn is_option(&self) -> bool {
        self.name == "Option" && self.args.len() == 1
    }

    /// Strip transparent wrappers (`Option`, `Box`, `Arc`, ...)
    pub fn unwrap_transparent(&self) -> &TypeRef {
        let mut current = self;
        while TRANSPARENT_WRAPPERS.contains(&current.name.as_str()) {
            // Cow<'a, T> keeps T as its only type argument
            match current.args.last() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    /// Strip the wrappers that serialize as their contents (`Box`, `Arc`, `Cow`, ...), keeping
    /// `Option`
    pub fn unwrap_pointers(&self) -> &TypeRef {
        let mut current = self;
        while !current.is_option() && TRANSPARENT_WRAPPERS.contains(&current.name.as_str()) {
            match current.args.last() {
                Some(inner) => current = inner,
                None => break,
            }
        }
        current
    }

    /// Whether any wrapper on the way to the inner type is an `Option`
    pub fn is_nullable(&self) -> bool {
        let mut current = self;
        loop {
            if current.is_option() {
                return true;
            }
            if !TRANSPARENT_WRAPPERS.contains(&current.name.as_str()) {
                return false;
            }
            match current.args.last() {
                Some(inner) => current = inner,
                None => return false,
            }
        }
    }

    /// `module::Name` without generic arguments
    pub fn generic_definition(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.module.join("::"), self.name)
        }
    }

    /// Build a `TypeRef` from a parsed Rust type
    pub fn from_syn(ty: &syn::Type) -> TypeRef {
        match ty {
            syn::Type::Path(type_path) => Self::from_syn_path(&type_path.path),
            syn::Type::Reference(reference) => Self::from_syn(&reference.elem),
            syn::Type::Paren(paren) => Self::from_syn(&paren.elem),
            syn::Type::Group(group) => Self::from_syn(&group.elem),
            syn::Type::Slice(slice) => Self::vec(Self::from_syn(&slice.elem)),
            syn::Type::Array(array) => Self::vec(Self::from_syn(&array.elem)),
            syn::Type::Tuple(tuple) => {
                Self::tuple(tuple.elems.iter().map(Self::from_syn).collect())
            }
            _ => Self::inferred(),
        }
    }

    fn from_syn_path(path: &syn::Path) -> TypeRef {
        let Some(last) = path.segments.last() else {
            return Self::inferred();
        };

        let module: Vec<String> = path
            .segments
            .iter()
            .take(path.segments.len() - 1)
            .map(|segment| segment.ident.to_string())
            .filter(|segment| !matches!(segment.as_str(), "crate" | "self" | "super"))
            .collect();

        let mut args = Vec::new();
        if let syn::PathArguments::AngleBracketed(generics) = &last.arguments {
            for arg in &generics.args {
                if let syn::GenericArgument::Type(inner) = arg {
                    args.push(Self::from_syn(inner));
                }
            }
        }

        TypeRef {
            module,
            name: last.ident.to_string(),
            args,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tuple() {
            let elements: Vec<String> = self.args.iter().map(ToString::to_string).collect();
            return write!(f, "({})", elements.join(", "));
        }
        write!(f, "{}", self.generic_definition())?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

impl FromStr for TypeRef {
    type Err = syn::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty: syn::Type = syn::parse_str(s)?;
        Ok(TypeRef::from_syn(&ty))
    }
}

/// A primitive `(type, format)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveType {
    pub data_type: DataType,
    pub format: Option<&'static str>,
}

/// Scalars keyed by their type name (last path segment)
static PRIMITIVE_TYPES: &[(&str, DataType, Option<&str>)] = &[
    ("bool", DataType::Boolean, None),
    ("i8", DataType::Integer, Some("int32")),
    ("i16", DataType::Integer, Some("int32")),
    ("i32", DataType::Integer, Some("int32")),
    ("i64", DataType::Integer, Some("int64")),
    ("i128", DataType::Integer, Some("int64")),
    ("isize", DataType::Integer, Some("int64")),
    ("u8", DataType::Integer, Some("int32")),
    ("u16", DataType::Integer, Some("int32")),
    ("u32", DataType::Integer, Some("int32")),
    ("u64", DataType::Integer, Some("int64")),
    ("u128", DataType::Integer, Some("int64")),
    ("usize", DataType::Integer, Some("int64")),
    ("NonZeroU32", DataType::Integer, Some("int32")),
    ("NonZeroU64", DataType::Integer, Some("int64")),
    ("f32", DataType::Number, Some("float")),
    ("f64", DataType::Number, Some("double")),
    ("Decimal", DataType::Number, Some("double")),
    ("char", DataType::String, None),
    ("str", DataType::String, None),
    ("String", DataType::String, None),
    ("PathBuf", DataType::String, None),
    ("Uuid", DataType::String, Some("uuid")),
    ("DateTime", DataType::String, Some("date-time")),
    ("NaiveDateTime", DataType::String, Some("date-time")),
    ("OffsetDateTime", DataType::String, Some("date-time")),
    ("PrimitiveDateTime", DataType::String, Some("date-time")),
    ("SystemTime", DataType::String, Some("date-time")),
    ("NaiveDate", DataType::String, Some("date")),
    ("Date", DataType::String, Some("date")),
    ("NaiveTime", DataType::String, Some("time")),
    ("Duration", DataType::String, Some("duration")),
    ("Url", DataType::String, Some("uri")),
    ("IpAddr", DataType::String, Some("ip")),
    ("Bytes", DataType::String, Some("byte")),
];

/// Look up the fixed `(type, format)` pair for a scalar type name
pub fn primitive_type(name: &str) -> Option<PrimitiveType> {
    PRIMITIVE_TYPES
        .iter()
        .find(|(candidate, _, _)| *candidate == name)
        .map(|(_, data_type, format)| PrimitiveType {
            data_type: *data_type,
            format: *format,
        })
}

/// Preferred wire representation of an enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumRepresentation {
    String,
    Integer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// Serialized name
    pub name: String,
    pub value: i64,
    pub docs: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumContract {
    pub members: Vec<EnumMember>,
    /// Representation the type itself asks for, if it says anything
    pub representation: Option<EnumRepresentation>,
}

/// One serialized property of an object
#[derive(Debug, Clone, PartialEq)]
pub struct DataProperty {
    /// Serialized name
    pub name: String,
    /// Name of the member in source
    pub member_name: String,
    pub ty: TypeRef,
    pub required: bool,
    pub nullable: bool,
    pub ignored: bool,
    pub obsolete: bool,
    pub validation: Validation,
    /// Explicit format override (`email`, `uri`, ...)
    pub format: Option<String>,
    pub docs: Option<String>,
}

impl DataProperty {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        let nullable = ty.is_nullable();
        Self {
            member_name: name.clone(),
            name,
            required: !nullable,
            nullable,
            ty,
            ignored: false,
            obsolete: false,
            validation: Validation::default(),
            format: None,
            docs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectContract {
    /// Declared properties, flattened ones merged in at their position
    pub properties: Vec<DataProperty>,
    /// Value type of a flattened catch-all map
    pub extension_data: Option<TypeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContractKind {
    Primitive(PrimitiveType),
    Enum(EnumContract),
    Array { item: TypeRef, unique: bool },
    Dictionary { key: TypeRef, value: TypeRef },
    Object(ObjectContract),
    /// No recognizable shape; described as an empty object
    Dynamic,
}

/// How a type serializes, as reported by the contract collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct DataContract {
    /// Canonical identity of the classified type (wrappers already removed)
    pub ty: TypeRef,
    pub kind: ContractKind,
    pub docs: Option<String>,
}

impl DataContract {
    pub fn new(ty: TypeRef, kind: ContractKind) -> Self {
        Self {
            ty,
            kind,
            docs: None,
        }
    }

    pub fn dynamic(ty: TypeRef) -> Self {
        Self::new(ty, ContractKind::Dynamic)
    }
}

/// The serialization contract collaborator.
///
/// Implementations must be deterministic: the same input yields the same canonical type
/// for the whole generation run.
pub trait DataContractResolver {
    fn resolve(&self, ty: &TypeRef) -> DataContract;
}

/// Classify standard library containers and scalars.
///
/// Expects a type with transparent wrappers already removed. Returns `None` for anything
/// that needs user definitions to classify.
pub fn classify_std(ty: &TypeRef) -> Option<ContractKind> {
    if let Some(primitive) = primitive_type(&ty.name) {
        return Some(ContractKind::Primitive(primitive));
    }

    let first = ty.args.first().cloned();
    let kind = match ty.name.as_str() {
        "Vec" | "VecDeque" | "LinkedList" | "BinaryHeap" | "SmallVec" => match first {
            Some(item) if item.name == "u8" => ContractKind::Primitive(PrimitiveType {
                data_type: DataType::String,
                format: Some("byte"),
            }),
            Some(item) => ContractKind::Array {
                item,
                unique: false,
            },
            None => ContractKind::Dynamic,
        },
        "HashSet" | "BTreeSet" | "IndexSet" => match first {
            Some(item) => ContractKind::Array { item, unique: true },
            None => ContractKind::Dynamic,
        },
        "HashMap" | "BTreeMap" | "IndexMap" => match (first, ty.args.get(1).cloned()) {
            (Some(key), Some(value)) => ContractKind::Dictionary { key, value },
            _ => ContractKind::Dynamic,
        },
        "Value" | "Map" | "Json" if ty.module.last().map(String::as_str) == Some("serde_json") => {
            ContractKind::Dynamic
        }
        INFERRED_NAME | TUPLE_NAME => ContractKind::Dynamic,
        _ => return None,
    };
    Some(kind)
}
