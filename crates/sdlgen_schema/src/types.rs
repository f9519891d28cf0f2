//! Schema graph node types.
//!
//! These are the owned, mutable counterparts of the syntax tree. Plugins
//! rewrite them between loading and IR construction.

use sdlgen_core::Span;
use sdlgen_syntax::DirectiveLocation;
use std::fmt;

/// A named schema source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub input: String,
    /// Builtin sources are loaded like any other but never printed.
    pub builtin: bool,
}

impl Source {
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            builtin: false,
        }
    }

    pub fn builtin(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            builtin: true,
            ..Self::new(name, input)
        }
    }
}

/// Where a node was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Index into the loaded source list.
    pub source: usize,
    pub span: Span,
}

/// The kind of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl DefinitionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Object => "type",
            Self::Interface => "interface",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::InputObject => "input",
        }
    }

    /// Interfaces and unions.
    #[must_use]
    pub const fn is_abstract(self) -> bool {
        matches!(self, Self::Interface | Self::Union)
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type definition in the schema graph.
#[derive(Debug, Clone)]
pub struct Definition {
    pub kind: DefinitionKind,
    pub name: String,
    pub description: Option<String>,
    /// Implemented interfaces (objects and interfaces).
    pub interfaces: Vec<String>,
    pub directives: Vec<DirectiveApplication>,
    /// Fields of objects and interfaces, input fields of input objects.
    pub fields: Vec<FieldDefinition>,
    pub enum_values: Vec<EnumValueDefinition>,
    /// Union members.
    pub types: Vec<String>,
    pub builtin: bool,
    pub location: Option<Location>,
}

impl Definition {
    /// Creates an empty, non-builtin definition.
    pub fn new(kind: DefinitionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: None,
            interfaces: Vec::new(),
            directives: Vec::new(),
            fields: Vec::new(),
            enum_values: Vec::new(),
            types: Vec::new(),
            builtin: false,
            location: None,
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the first application of the named directive.
    #[must_use]
    pub fn directive(&self, name: &str) -> Option<&DirectiveApplication> {
        self.directives.iter().find(|d| d.name == name)
    }
}

/// A field, argument or input field.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<ArgumentDefinition>,
    pub ty: TypeRef,
    /// Default value of an input field.
    pub default_value: Option<Value>,
    pub directives: Vec<DirectiveApplication>,
    /// Machinery fields (`_entities`, `_service`) that are omitted from the
    /// published schema.
    pub internal: bool,
    pub location: Option<Location>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
            ty,
            default_value: None,
            directives: Vec::new(),
            internal: false,
            location: None,
        }
    }

    #[must_use]
    pub fn with_argument(mut self, argument: ArgumentDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    #[must_use]
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Introspection fields are named with a leading `__`.
    #[must_use]
    pub fn is_introspection(&self) -> bool {
        self.name.starts_with("__")
    }
}

/// An argument definition on a field or directive.
#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<Value>,
    pub directives: Vec<DirectiveApplication>,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
            directives: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub directives: Vec<DirectiveApplication>,
}

/// A directive declaration.
#[derive(Debug, Clone)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<ArgumentDefinition>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
    pub builtin: bool,
    pub location: Option<Location>,
}

impl DirectiveDefinition {
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&ArgumentDefinition> {
        self.arguments.iter().find(|a| a.name == name)
    }
}

/// A directive applied to a schema element.
#[derive(Debug, Clone)]
pub struct DirectiveApplication {
    pub name: String,
    pub arguments: Vec<(String, Value)>,
    pub location: Option<Location>,
}

impl DirectiveApplication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            location: None,
        }
    }

    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.push((name.into(), value));
        self
    }

    /// Looks up an argument by name.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value)
    }
}

/// A type reference with list and non-null wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn non_null_named(name: impl Into<String>) -> Self {
        Self::NonNull(Box::new(Self::named(name)))
    }

    #[must_use]
    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    #[must_use]
    pub fn non_null_list(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(Self::list(inner)))
    }

    /// The innermost named type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.name(),
        }
    }

    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// True for `[T]` and `[T]!`.
    #[must_use]
    pub fn is_list(&self) -> bool {
        match self {
            Self::Named(_) => false,
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// A constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::String(s) => write_quoted(f, s),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Null => f.write_str("null"),
            Self::Enum(name) => f.write_str(name),
            Self::List(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Self::Object(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Writes `s` as a quoted string literal.
pub(crate) fn write_quoted(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04X}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}
