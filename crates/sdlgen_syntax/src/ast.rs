//! Abstract syntax tree for schema documents.

use crate::token::DirectiveLocation;
use sdlgen_core::{Span, Text};

/// A complete document.
#[derive(Debug, Clone)]
pub struct Document {
    pub definitions: Vec<Definition>,
    pub span: Span,
}

/// A top-level definition.
#[derive(Debug, Clone)]
pub enum Definition {
    Schema(SchemaDefinition),
    /// `extend schema ...`
    SchemaExtension(SchemaDefinition),
    Type(TypeDefinition),
    /// `extend type ...`, `extend union ...` and friends. Extensions carry no
    /// description.
    TypeExtension(TypeDefinition),
    Directive(DirectiveDefinitionNode),
}

/// Schema definition.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub description: Option<Description>,
    pub directives: Vec<Directive>,
    pub operations: Vec<OperationTypeDefinition>,
    pub span: Span,
}

/// Operation type in schema (query/mutation/subscription).
#[derive(Debug, Clone)]
pub struct OperationTypeDefinition {
    pub operation: OperationType,
    pub type_name: Name,
    pub span: Span,
}

/// Type of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

/// Type definitions.
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    Scalar(ScalarTypeDefinition),
    Object(ObjectTypeDefinition),
    Interface(InterfaceTypeDefinition),
    Union(UnionTypeDefinition),
    Enum(EnumTypeDefinition),
    Input(InputObjectTypeDefinition),
}

impl TypeDefinition {
    /// Returns the defined name.
    #[must_use]
    pub fn name(&self) -> Name {
        match self {
            Self::Scalar(def) => def.name,
            Self::Object(def) => def.name,
            Self::Interface(def) => def.name,
            Self::Union(def) => def.name,
            Self::Enum(def) => def.name,
            Self::Input(def) => def.name,
        }
    }

    /// Returns the span of the whole definition.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Scalar(def) => def.span,
            Self::Object(def) => def.span,
            Self::Interface(def) => def.span,
            Self::Union(def) => def.span,
            Self::Enum(def) => def.span,
            Self::Input(def) => def.span,
        }
    }
}

/// Scalar type definition.
#[derive(Debug, Clone)]
pub struct ScalarTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// Object type definition.
#[derive(Debug, Clone)]
pub struct ObjectTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub implements: Vec<Name>,
    pub directives: Vec<Directive>,
    pub fields: Vec<FieldDefinition>,
    pub span: Span,
}

/// Interface type definition.
#[derive(Debug, Clone)]
pub struct InterfaceTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub implements: Vec<Name>,
    pub directives: Vec<Directive>,
    pub fields: Vec<FieldDefinition>,
    pub span: Span,
}

/// Union type definition.
#[derive(Debug, Clone)]
pub struct UnionTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub members: Vec<Name>,
    pub span: Span,
}

/// Enum type definition.
#[derive(Debug, Clone)]
pub struct EnumTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub values: Vec<EnumValueDefinition>,
    pub span: Span,
}

/// Enum value definition.
#[derive(Debug, Clone)]
pub struct EnumValueDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// Input object type definition.
#[derive(Debug, Clone)]
pub struct InputObjectTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub fields: Vec<InputValueDefinition>,
    pub span: Span,
}

/// Field definition.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub arguments: Vec<InputValueDefinition>,
    pub ty: Type,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// Input value definition (arguments, input fields).
#[derive(Debug, Clone)]
pub struct InputValueDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<Value>,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// Type reference.
#[derive(Debug, Clone)]
pub enum Type {
    /// Named type: `User`
    Named(NamedType),
    /// List type: `[User]`
    List(Box<Type>, Span),
    /// Non-null type: `User!`
    NonNull(Box<Type>, Span),
}

impl Type {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Named(named) => named.span,
            Self::List(_, span) | Self::NonNull(_, span) => *span,
        }
    }
}

/// Named type.
#[derive(Debug, Clone, Copy)]
pub struct NamedType {
    pub name: Text,
    pub span: Span,
}

/// Directive definition.
#[derive(Debug, Clone)]
pub struct DirectiveDefinitionNode {
    pub description: Option<Description>,
    pub name: Name,
    pub arguments: Vec<InputValueDefinition>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
    pub span: Span,
}

/// Directive usage.
#[derive(Debug, Clone)]
pub struct Directive {
    pub name: Name,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

/// Argument.
#[derive(Debug, Clone)]
pub struct Argument {
    pub name: Name,
    pub value: Value,
    pub span: Span,
}

/// Constant value. Variables are not allowed in type system documents.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64, Span),
    Float(f64, Span),
    String(String, Span),
    Boolean(bool, Span),
    Null(Span),
    Enum(Name),
    List(Vec<Value>, Span),
    Object(Vec<(Name, Value)>, Span),
}

/// Name with span.
#[derive(Debug, Clone, Copy)]
pub struct Name {
    pub value: Text,
    pub span: Span,
}

impl Name {
    pub fn new(value: Text, span: Span) -> Self {
        Self { value, span }
    }
}

/// Description (documentation string), already unescaped.
#[derive(Debug, Clone)]
pub struct Description {
    pub value: String,
    pub span: Span,
}

impl Description {
    pub fn new(value: impl Into<String>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }
}
