//! Binding schema types to Rust types.

use super::TypeMap;
use crate::error::{CodegenError, Result};
use sdlgen_schema::TypeRef;
use serde::Serialize;
use std::fmt;

/// How values of a bound type look on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Int,
    Float,
    Boolean,
    /// Anything deserialized structurally.
    Other,
}

impl ValueKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Other => "value",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved Rust type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TargetType {
    /// Full path, e.g. `crate::model::Product` or `i32`.
    pub path: String,
    pub kind: ValueKind,
}

impl TargetType {
    /// Creates a descriptor, inferring the value kind from well-known paths.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let kind = match path.as_str() {
            "String" | "std::string::String" | "&str" => ValueKind::String,
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize" => ValueKind::Int,
            "f32" | "f64" => ValueKind::Float,
            "bool" => ValueKind::Boolean,
            _ => ValueKind::Other,
        };
        Self { path, kind }
    }

    /// The last path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit("::").next().unwrap_or(&self.path)
    }
}

/// A schema type reference together with its binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeReference {
    /// The schema spelling, e.g. `[_Any!]!`.
    pub gql: String,
    /// The innermost named schema type.
    pub named: String,
    /// The binding of the named type.
    pub target: TargetType,
    /// The full Rust type with `Option` and `Vec` wrapping applied.
    pub rust: String,
}

impl TypeReference {
    pub fn new(ty: &TypeRef, target: TargetType) -> Self {
        Self {
            gql: ty.to_string(),
            named: ty.name().to_string(),
            rust: wrap(ty, &target.path),
            target,
        }
    }

    #[must_use]
    pub fn is_non_null(&self) -> bool {
        self.gql.ends_with('!')
    }
}

fn wrap(ty: &TypeRef, path: &str) -> String {
    match ty {
        TypeRef::NonNull(inner) => match inner.as_ref() {
            TypeRef::List(elem) => format!("Vec<{}>", wrap(elem, path)),
            TypeRef::NonNull(nested) => wrap(nested, path),
            TypeRef::Named(_) => path.to_string(),
        },
        TypeRef::List(elem) => format!("Option<Vec<{}>>", wrap(elem, path)),
        TypeRef::Named(_) => format!("Option<{path}>"),
    }
}

/// Resolves schema type names to Rust types.
pub trait TypeBinder {
    /// Binds a named schema type.
    fn bind(&self, name: &str) -> Result<TargetType>;

    /// Binds a full type reference, keeping its list and null wrapping.
    fn resolve(&self, ty: &TypeRef) -> Result<TypeReference> {
        let target = self.bind(ty.name())?;
        Ok(TypeReference::new(ty, target))
    }
}

/// The default binder, backed by the configured type map.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'a> {
    models: &'a TypeMap,
}

impl<'a> Binder<'a> {
    pub fn new(models: &'a TypeMap) -> Self {
        Self { models }
    }
}

impl TypeBinder for Binder<'_> {
    fn bind(&self, name: &str) -> Result<TargetType> {
        self.models
            .get(name)
            .and_then(|entry| entry.model.first())
            .map(TargetType::new)
            .ok_or_else(|| CodegenError::TypeBuild {
                type_name: name.to_string(),
                target: name.to_string(),
                reason: "no model is bound".to_string(),
            })
    }
}
