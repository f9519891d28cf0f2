//! Schema graph for sdlgen.
//!
//! This crate provides:
//! - `types`: Owned schema graph nodes (definitions, fields, type references)
//! - `schema`: The [`Schema`] graph and its mutation helpers
//! - `loader`: Source merging, extension handling and validation
//! - `printer`: Canonical SDL printing
//! - `prelude`: Builtin scalars, directives and introspection types

pub mod error;
pub mod loader;
pub mod prelude;
pub mod printer;
pub mod schema;
pub mod types;

pub use error::{SchemaLoadError, SourceContext};
pub use loader::load_schema;
pub use printer::{print_schema, print_schema_with_options, PrintOptions};
pub use schema::Schema;
pub use sdlgen_syntax::DirectiveLocation;
pub use types::{
    ArgumentDefinition, Definition, DefinitionKind, DirectiveApplication, DirectiveDefinition,
    EnumValueDefinition, FieldDefinition, Location, Source, TypeRef, Value,
};
