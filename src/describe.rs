//! Recursive descriptor generation: a [`Struct`] to a format-agnostic
//! [`Document`] of field paths and method descriptions.
//!
//! Nested structs are expanded until a depth bound; past the bound a field
//! is reported by its type name. The bound is what terminates cyclic struct
//! graphs, there is no visited set.

use crate::model::{Field, Method, Struct};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FLAT_DEPTH: usize = 4;
pub const DEFAULT_NESTED_DEPTH: usize = 3;

/// How nested structs appear in the `field` mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Dotted paths: `start.x`.
    #[default]
    Flat,
    /// Objects within objects.
    Nested,
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Shape::Flat),
            "nested" => Ok(Shape::Nested),
            other => Err(format!("unknown shape: {}. Use flat or nested", other)),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shape::Flat => "flat",
            Shape::Nested => "nested",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescribeOptions {
    pub shape: Shape,
    /// Depth at which nested structs stop expanding; top-level fields are depth 1.
    pub max_depth: usize,
}

impl DescribeOptions {
    pub fn flat(max_depth: usize) -> Self {
        Self {
            shape: Shape::Flat,
            max_depth,
        }
    }

    pub fn nested(max_depth: usize) -> Self {
        Self {
            shape: Shape::Nested,
            max_depth,
        }
    }

    /// `shape` with its default bound.
    pub fn for_shape(shape: Shape) -> Self {
        match shape {
            Shape::Flat => Self::flat(DEFAULT_FLAT_DEPTH),
            Shape::Nested => Self::nested(DEFAULT_NESTED_DEPTH),
        }
    }
}

impl Default for DescribeOptions {
    fn default() -> Self {
        Self::for_shape(Shape::Flat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldEntry {
    Type(String),
    Struct(BTreeMap<String, FieldEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldMap {
    Flat(BTreeMap<String, String>),
    Nested(BTreeMap<String, FieldEntry>),
}

impl FieldMap {
    pub fn len(&self) -> usize {
        match self {
            FieldMap::Flat(m) => m.len(),
            FieldMap::Nested(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarDescription {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MethodDescription {
    pub description: String,
    pub params: Vec<VarDescription>,
    #[serde(rename = "Return", skip_serializing_if = "Option::is_none")]
    pub returns: Option<VarDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub field: FieldMap,
    pub function: BTreeMap<String, MethodDescription>,
}

/// Describe `item`. Pure: no I/O, no caching.
pub fn describe(item: &Struct, options: &DescribeOptions) -> Document {
    let field = match options.shape {
        Shape::Flat => {
            let mut out = BTreeMap::new();
            flat_fields(item.fields(), "", 1, options.max_depth, &mut out);
            FieldMap::Flat(out)
        }
        Shape::Nested => FieldMap::Nested(nested_fields(item.fields(), 1, options.max_depth)),
    };

    let function = item
        .methods()
        .iter()
        .map(|m| (m.name().to_string(), describe_method(m)))
        .collect();

    Document { field, function }
}

fn flat_fields(
    fields: Vec<Field>,
    prefix: &str,
    depth: usize,
    max_depth: usize,
    out: &mut BTreeMap<String, String>,
) {
    for field in fields {
        let path = if prefix.is_empty() {
            field.name().to_string()
        } else {
            format!("{}.{}", prefix, field.name())
        };
        let inner = match field.as_struct() {
            Some(nested) if depth < max_depth => nested.fields(),
            _ => Vec::new(),
        };
        // A struct without exported fields is kept as a leaf.
        if inner.is_empty() {
            out.insert(path, field.ty().to_string());
        } else {
            flat_fields(inner, &path, depth + 1, max_depth, out);
        }
    }
}

fn nested_fields(fields: Vec<Field>, depth: usize, max_depth: usize) -> BTreeMap<String, FieldEntry> {
    fields
        .into_iter()
        .map(|field| {
            let entry = match field.as_struct() {
                Some(nested) if depth < max_depth => {
                    FieldEntry::Struct(nested_fields(nested.fields(), depth + 1, max_depth))
                }
                _ => FieldEntry::Type(field.ty().to_string()),
            };
            (field.name().to_string(), entry)
        })
        .collect()
}

fn describe_var(field: &Field) -> VarDescription {
    VarDescription {
        name: field.name().to_string(),
        ty: field.ty().to_string(),
    }
}

fn describe_method(method: &Method) -> MethodDescription {
    MethodDescription {
        description: method.comment().unwrap_or_default().to_string(),
        params: method.params().iter().map(describe_var).collect(),
        returns: method.returns().as_ref().map(describe_var),
    }
}
