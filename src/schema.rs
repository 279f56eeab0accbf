//! Schema node model.
//!
//! A [`Schema`] is one unit of generated JSON-Schema description. Its shape lives in
//! [`SchemaKind`]; the fields on [`Schema`] itself (description, nullability, validation
//! constraints, extensions) are shared by every shape except references, which serialize
//! as a bare `$ref`.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// Prefix for references into the document's component schemas
pub const REFERENCE_PREFIX: &str = "#/components/schemas/";

/// JSON Schema primitive type keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Integer => "integer",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Array => "array",
            DataType::Object => "object",
        }
    }
}

/// Validation constraints derived from field attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validation {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub pattern: Option<String>,
}

impl Validation {
    pub fn is_empty(&self) -> bool {
        *self == Validation::default()
    }
}

/// The shape of a schema node
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// Points at a named definition in the document's component schemas
    Reference(String),
    Primitive {
        data_type: DataType,
        format: Option<String>,
    },
    Enum {
        data_type: DataType,
        format: Option<String>,
        values: Vec<serde_json::Value>,
    },
    Array {
        items: Box<Schema>,
        unique_items: bool,
    },
    /// Free-form keys with a uniform value schema
    Map { additional_properties: Box<Schema> },
    Object {
        properties: IndexMap<String, Schema>,
        required: BTreeSet<String>,
        additional_properties: Option<Box<Schema>>,
    },
}

impl Default for SchemaKind {
    fn default() -> Self {
        SchemaKind::Object {
            properties: IndexMap::new(),
            required: BTreeSet::new(),
            additional_properties: None,
        }
    }
}

/// A generated schema node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    pub title: Option<String>,
    pub description: Option<String>,
    pub nullable: bool,
    pub deprecated: bool,
    pub example: Option<serde_json::Value>,
    pub validation: Validation,
    /// Vendor extensions, serialized with their keys as given (conventionally `x-...`)
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// A reference to the definition registered under `schema_id`
    pub fn reference(schema_id: impl Into<String>) -> Self {
        Self::new(SchemaKind::Reference(schema_id.into()))
    }

    pub fn primitive(data_type: DataType, format: Option<&str>) -> Self {
        Self::new(SchemaKind::Primitive {
            data_type,
            format: format.map(str::to_string),
        })
    }

    pub fn array(items: Schema, unique_items: bool) -> Self {
        Self::new(SchemaKind::Array {
            items: Box::new(items),
            unique_items,
        })
    }

    pub fn map(value: Schema) -> Self {
        Self::new(SchemaKind::Map {
            additional_properties: Box::new(value),
        })
    }

    /// An object without declared properties; the fallback for unknown shapes
    pub fn empty_object() -> Self {
        Self::default()
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, SchemaKind::Reference(_))
    }

    pub fn reference_id(&self) -> Option<&str> {
        match &self.kind {
            SchemaKind::Reference(id) => Some(id),
            _ => None,
        }
    }

    /// The `type` keyword this node serializes with, if any
    pub fn data_type(&self) -> Option<DataType> {
        match &self.kind {
            SchemaKind::Reference(_) => None,
            SchemaKind::Primitive { data_type, .. } | SchemaKind::Enum { data_type, .. } => {
                Some(*data_type)
            }
            SchemaKind::Array { .. } => Some(DataType::Array),
            SchemaKind::Map { .. } | SchemaKind::Object { .. } => Some(DataType::Object),
        }
    }

    pub fn format(&self) -> Option<&str> {
        match &self.kind {
            SchemaKind::Primitive { format, .. } | SchemaKind::Enum { format, .. } => {
                format.as_deref()
            }
            _ => None,
        }
    }

    /// Override the format of a primitive or enum node
    pub fn set_format(&mut self, value: &str) {
        if let SchemaKind::Primitive { format, .. } | SchemaKind::Enum { format, .. } =
            &mut self.kind
        {
            *format = Some(value.to_string());
        }
    }

    pub fn items(&self) -> Option<&Schema> {
        match &self.kind {
            SchemaKind::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&IndexMap<String, Schema>> {
        match &self.kind {
            SchemaKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    pub fn properties_mut(&mut self) -> Option<&mut IndexMap<String, Schema>> {
        match &mut self.kind {
            SchemaKind::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }

    pub fn required(&self) -> Option<&BTreeSet<String>> {
        match &self.kind {
            SchemaKind::Object { required, .. } => Some(required),
            _ => None,
        }
    }

    pub fn enum_values(&self) -> Option<&[serde_json::Value]> {
        match &self.kind {
            SchemaKind::Enum { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Attach validation constraints. References never carry constraints, so this is a
    /// no-op for them.
    pub fn apply_validation(&mut self, validation: &Validation) {
        if self.is_reference() {
            return;
        }
        let target = &mut self.validation;
        if validation.minimum.is_some() {
            target.minimum = validation.minimum;
        }
        if validation.maximum.is_some() {
            target.maximum = validation.maximum;
        }
        if validation.pattern.is_some() {
            target.pattern = validation.pattern.clone();
        }
        // length bounds become item counts on arrays
        let is_array = matches!(self.kind, SchemaKind::Array { .. });
        let (min, max) = (
            validation.min_length.or(validation.min_items),
            validation.max_length.or(validation.max_items),
        );
        if is_array {
            target.min_items = min.or(target.min_items);
            target.max_items = max.or(target.max_items);
        } else {
            target.min_length = min.or(target.min_length);
            target.max_length = max.or(target.max_length);
        }
    }
}

/// Write `Option<f64>` bounds as integers when they have no fractional part
fn number_value(value: f64) -> serde_json::Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serde_json::Value::from(value as i64)
    } else {
        serde_json::Value::from(value)
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        if let SchemaKind::Reference(id) = &self.kind {
            map.serialize_entry("$ref", &format!("{}{}", REFERENCE_PREFIX, id))?;
            return map.end();
        }

        if let Some(data_type) = self.data_type() {
            map.serialize_entry("type", data_type.as_str())?;
        }
        if let Some(format) = self.format() {
            map.serialize_entry("format", format)?;
        }
        if let Some(title) = &self.title {
            map.serialize_entry("title", title)?;
        }
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }

        match &self.kind {
            SchemaKind::Reference(_) | SchemaKind::Primitive { .. } => {}
            SchemaKind::Enum { values, .. } => map.serialize_entry("enum", values)?,
            SchemaKind::Array {
                items,
                unique_items,
            } => {
                map.serialize_entry("items", items)?;
                if *unique_items {
                    map.serialize_entry("uniqueItems", &true)?;
                }
            }
            SchemaKind::Map {
                additional_properties,
            } => map.serialize_entry("additionalProperties", additional_properties)?,
            SchemaKind::Object {
                properties,
                required,
                additional_properties,
            } => {
                if !properties.is_empty() {
                    map.serialize_entry("properties", properties)?;
                }
                if !required.is_empty() {
                    map.serialize_entry("required", required)?;
                }
                if let Some(additional) = additional_properties {
                    map.serialize_entry("additionalProperties", additional)?;
                }
            }
        }

        if self.nullable {
            map.serialize_entry("nullable", &true)?;
        }
        if self.deprecated {
            map.serialize_entry("deprecated", &true)?;
        }

        let v = &self.validation;
        if let Some(minimum) = v.minimum {
            map.serialize_entry("minimum", &number_value(minimum))?;
        }
        if let Some(maximum) = v.maximum {
            map.serialize_entry("maximum", &number_value(maximum))?;
        }
        if let Some(min_length) = v.min_length {
            map.serialize_entry("minLength", &min_length)?;
        }
        if let Some(max_length) = v.max_length {
            map.serialize_entry("maxLength", &max_length)?;
        }
        if let Some(min_items) = v.min_items {
            map.serialize_entry("minItems", &min_items)?;
        }
        if let Some(max_items) = v.max_items {
            map.serialize_entry("maxItems", &max_items)?;
        }
        if let Some(pattern) = &v.pattern {
            map.serialize_entry("pattern", pattern)?;
        }

        if let Some(example) = &self.example {
            map.serialize_entry("example", example)?;
        }
        for (key, value) in &self.extensions {
            map.serialize_entry(key, value)?;
        }

        map.end()
    }
}
