//! Schema loading errors.

use crate::types::{Location, Source};
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

/// An error raised while reading, parsing or validating schema sources.
#[derive(Debug, Error, Diagnostic)]
pub enum SchemaLoadError {
    #[error("unable to read schema file '{path}'")]
    #[diagnostic(code(sdlgen::schema::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    #[diagnostic(code(sdlgen::schema::syntax))]
    Syntax {
        #[source_code]
        src: NamedSource<String>,
        #[label("{label}")]
        span: SourceSpan,
        message: String,
        label: String,
    },

    #[error("{kind} '{name}' is defined more than once")]
    #[diagnostic(code(sdlgen::schema::duplicate))]
    Duplicate {
        #[source_code]
        src: NamedSource<String>,
        #[label("redefined here")]
        span: Option<SourceSpan>,
        kind: &'static str,
        name: String,
    },

    #[error("undefined type '{name}' referenced by {referenced_by}")]
    #[diagnostic(
        code(sdlgen::schema::undefined_type),
        help("declare '{name}' in one of the schema files")
    )]
    UndefinedType {
        #[source_code]
        src: NamedSource<String>,
        #[label("referenced here")]
        span: Option<SourceSpan>,
        name: String,
        referenced_by: String,
    },

    #[error("cannot extend '{name}': {reason}")]
    #[diagnostic(code(sdlgen::schema::invalid_extension))]
    InvalidExtension {
        #[source_code]
        src: NamedSource<String>,
        #[label("extension here")]
        span: Option<SourceSpan>,
        name: String,
        reason: String,
    },

    #[error("union '{union}' member '{member}' is not an object type")]
    #[diagnostic(code(sdlgen::schema::invalid_union_member))]
    InvalidUnionMember {
        #[source_code]
        src: NamedSource<String>,
        #[label("declared here")]
        span: Option<SourceSpan>,
        union: String,
        member: String,
    },

    #[error("'{name}' implements '{interface}', which is not an interface")]
    #[diagnostic(code(sdlgen::schema::invalid_implements))]
    InvalidImplements {
        #[source_code]
        src: NamedSource<String>,
        #[label("declared here")]
        span: Option<SourceSpan>,
        name: String,
        interface: String,
    },

    #[error("invalid schema root: {message}")]
    #[diagnostic(code(sdlgen::schema::invalid_root))]
    InvalidRoot {
        #[source_code]
        src: NamedSource<String>,
        #[label("declared here")]
        span: Option<SourceSpan>,
        message: String,
    },
}

/// Source context for error reporting, one per loaded source.
#[derive(Debug, Clone, Copy)]
pub struct SourceContext<'a> {
    sources: &'a [Source],
}

impl<'a> SourceContext<'a> {
    pub fn new(sources: &'a [Source]) -> Self {
        Self { sources }
    }

    /// Creates a `NamedSource` for the source a location points into.
    #[must_use]
    pub fn named_source(&self, location: Option<&Location>) -> NamedSource<String> {
        match location.and_then(|loc| self.sources.get(loc.source)) {
            Some(source) => NamedSource::new(&source.name, source.input.clone()),
            None => NamedSource::new("<generated>", String::new()),
        }
    }

    #[must_use]
    pub fn span(location: Option<&Location>) -> Option<SourceSpan> {
        location.map(|loc| loc.span.into())
    }

    pub fn duplicate(
        &self,
        kind: &'static str,
        name: impl Into<String>,
        location: Option<&Location>,
    ) -> SchemaLoadError {
        SchemaLoadError::Duplicate {
            src: self.named_source(location),
            span: Self::span(location),
            kind,
            name: name.into(),
        }
    }

    pub fn undefined_type(
        &self,
        name: impl Into<String>,
        referenced_by: impl Into<String>,
        location: Option<&Location>,
    ) -> SchemaLoadError {
        SchemaLoadError::UndefinedType {
            src: self.named_source(location),
            span: Self::span(location),
            name: name.into(),
            referenced_by: referenced_by.into(),
        }
    }

    pub fn invalid_extension(
        &self,
        name: impl Into<String>,
        reason: impl Into<String>,
        location: Option<&Location>,
    ) -> SchemaLoadError {
        SchemaLoadError::InvalidExtension {
            src: self.named_source(location),
            span: Self::span(location),
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_union_member(
        &self,
        union: impl Into<String>,
        member: impl Into<String>,
        location: Option<&Location>,
    ) -> SchemaLoadError {
        SchemaLoadError::InvalidUnionMember {
            src: self.named_source(location),
            span: Self::span(location),
            union: union.into(),
            member: member.into(),
        }
    }

    pub fn invalid_implements(
        &self,
        name: impl Into<String>,
        interface: impl Into<String>,
        location: Option<&Location>,
    ) -> SchemaLoadError {
        SchemaLoadError::InvalidImplements {
            src: self.named_source(location),
            span: Self::span(location),
            name: name.into(),
            interface: interface.into(),
        }
    }

    pub fn invalid_root(
        &self,
        message: impl Into<String>,
        location: Option<&Location>,
    ) -> SchemaLoadError {
        SchemaLoadError::InvalidRoot {
            src: self.named_source(location),
            span: Self::span(location),
            message: message.into(),
        }
    }
}
