//! Readers for the attributes that shape serialization and documentation:
//! `#[serde(...)]`, `#[validate(...)]`, `#[schema(...)]`, `#[deprecated]`, `#[derive(...)]`
//! and `///` doc comments.

use crate::schema::Validation;
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use log::debug;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, Lit, LitStr, Token, UnOp};

/// Serde attributes on a container, field or variant
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SerdeAttributes {
    pub rename: Option<String>,
    pub rename_all: Option<String>,
    pub skip: bool,
    pub skip_serializing: bool,
    pub skip_deserializing: bool,
    pub default: bool,
    pub flatten: bool,
    pub transparent: bool,
}

impl SerdeAttributes {
    pub fn ignored(&self) -> bool {
        self.skip || (self.skip_serializing && self.skip_deserializing)
    }
}

pub(crate) fn serde_attributes(attrs: &[Attribute]) -> SerdeAttributes {
    let mut serde = SerdeAttributes::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                // rename(serialize = "..") is treated as unspecified
                if meta.input.peek(Token![=]) {
                    serde.rename = Some(string_value(&meta)?);
                } else {
                    skip_meta_value(&meta)?;
                }
            } else if meta.path.is_ident("rename_all") {
                if meta.input.peek(Token![=]) {
                    serde.rename_all = Some(string_value(&meta)?);
                } else {
                    skip_meta_value(&meta)?;
                }
            } else if meta.path.is_ident("skip") {
                serde.skip = true;
            } else if meta.path.is_ident("skip_serializing") {
                serde.skip_serializing = true;
            } else if meta.path.is_ident("skip_deserializing") {
                serde.skip_deserializing = true;
            } else if meta.path.is_ident("default") {
                serde.default = true;
                skip_meta_value(&meta)?;
            } else if meta.path.is_ident("flatten") {
                serde.flatten = true;
            } else if meta.path.is_ident("transparent") {
                serde.transparent = true;
            } else {
                skip_meta_value(&meta)?;
            }
            Ok(())
        });
        if let Err(e) = parsed {
            debug!("Ignoring unreadable serde attribute: {}", e);
        }
    }

    serde
}

/// Constraints and format hints on a field
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FieldConstraints {
    pub validation: Validation,
    pub format: Option<String>,
}

/// Read `#[validate(...)]` (validator crate) and `#[schema(...)]` (utoipa style) attributes
pub(crate) fn field_constraints(attrs: &[Attribute]) -> FieldConstraints {
    let mut constraints = FieldConstraints::default();

    for attr in attrs {
        let parsed = if attr.path().is_ident("validate") {
            attr.parse_nested_meta(|meta| read_validate(&meta, &mut constraints))
        } else if attr.path().is_ident("schema") {
            attr.parse_nested_meta(|meta| read_schema(&meta, &mut constraints))
        } else {
            continue;
        };
        if let Err(e) = parsed {
            debug!("Ignoring unreadable constraint attribute: {}", e);
        }
    }

    constraints
}

fn read_validate(meta: &ParseNestedMeta, constraints: &mut FieldConstraints) -> syn::Result<()> {
    let validation = &mut constraints.validation;
    if meta.path.is_ident("length") {
        meta.parse_nested_meta(|inner| {
            if inner.path.is_ident("min") {
                validation.min_length = number_value(&inner)?.map(|n| n as usize);
            } else if inner.path.is_ident("max") {
                validation.max_length = number_value(&inner)?.map(|n| n as usize);
            } else if inner.path.is_ident("equal") {
                let exact = number_value(&inner)?.map(|n| n as usize);
                validation.min_length = exact;
                validation.max_length = exact;
            } else {
                skip_meta_value(&inner)?;
            }
            Ok(())
        })
    } else if meta.path.is_ident("range") {
        meta.parse_nested_meta(|inner| {
            if inner.path.is_ident("min") {
                validation.minimum = number_value(&inner)?;
            } else if inner.path.is_ident("max") {
                validation.maximum = number_value(&inner)?;
            } else {
                skip_meta_value(&inner)?;
            }
            Ok(())
        })
    } else if meta.path.is_ident("email") {
        constraints.format = Some("email".to_string());
        skip_meta_value(meta)
    } else if meta.path.is_ident("url") {
        constraints.format = Some("uri".to_string());
        skip_meta_value(meta)
    } else {
        skip_meta_value(meta)
    }
}

fn read_schema(meta: &ParseNestedMeta, constraints: &mut FieldConstraints) -> syn::Result<()> {
    let validation = &mut constraints.validation;
    if meta.path.is_ident("pattern") {
        validation.pattern = Some(string_value(meta)?);
    } else if meta.path.is_ident("minimum") {
        validation.minimum = number_value(meta)?;
    } else if meta.path.is_ident("maximum") {
        validation.maximum = number_value(meta)?;
    } else if meta.path.is_ident("min_length") {
        validation.min_length = number_value(meta)?.map(|n| n as usize);
    } else if meta.path.is_ident("max_length") {
        validation.max_length = number_value(meta)?.map(|n| n as usize);
    } else if meta.path.is_ident("min_items") {
        validation.min_items = number_value(meta)?.map(|n| n as usize);
    } else if meta.path.is_ident("max_items") {
        validation.max_items = number_value(meta)?.map(|n| n as usize);
    } else if meta.path.is_ident("format") {
        let expr: Expr = meta.value()?.parse()?;
        constraints.format = match expr {
            Expr::Lit(lit) => match lit.lit {
                Lit::Str(s) => Some(s.value()),
                _ => None,
            },
            // KnownFormat::DateTime → date-time
            Expr::Path(path) => path
                .path
                .segments
                .last()
                .map(|s| s.ident.to_string().to_kebab_case()),
            _ => None,
        };
    } else {
        skip_meta_value(meta)?;
    }
    Ok(())
}

/// Joined `///` lines, or `None` when there are none
pub(crate) fn doc_comments(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .filter_map(|a| match &a.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(lit) => match &lit.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        })
        .collect();

    let text = lines.join("\n").trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub(crate) fn is_deprecated(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|a| a.path().is_ident("deprecated"))
}

/// Names of the derives on an item (`Serialize`, `Serialize_repr`, ...)
pub(crate) fn derives(attrs: &[Attribute]) -> Vec<String> {
    let mut names = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                names.push(segment.ident.to_string());
            }
            Ok(())
        });
    }
    names
}

/// Apply a serde `rename_all` rule to a name
pub(crate) fn apply_rename_rule(rule: &str, name: &str) -> String {
    match rule {
        "lowercase" => name.to_lowercase(),
        "UPPERCASE" => name.to_uppercase(),
        "PascalCase" => name.to_upper_camel_case(),
        "camelCase" => name.to_lower_camel_case(),
        "snake_case" => name.to_snake_case(),
        "SCREAMING_SNAKE_CASE" => name.to_shouty_snake_case(),
        "kebab-case" => name.to_kebab_case(),
        "SCREAMING-KEBAB-CASE" => name.to_shouty_kebab_case(),
        _ => name.to_string(),
    }
}

/// Evaluate an integer or float literal, optionally negated
pub(crate) fn literal_number(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(i) => i.base10_parse::<f64>().ok(),
            Lit::Float(f) => f.base10_parse::<f64>().ok(),
            _ => None,
        },
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => {
            literal_number(&unary.expr).map(|v| -v)
        }
        Expr::Paren(paren) => literal_number(&paren.expr),
        Expr::Group(group) => literal_number(&group.expr),
        _ => None,
    }
}

fn string_value(meta: &ParseNestedMeta) -> syn::Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    Ok(lit.value())
}

fn number_value(meta: &ParseNestedMeta) -> syn::Result<Option<f64>> {
    let expr: Expr = meta.value()?.parse()?;
    Ok(literal_number(&expr))
}

/// Consume `= value` or `(...)` after a key we do not care about
fn skip_meta_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|nested| skip_meta_value(&nested))?;
    }
    Ok(())
}
