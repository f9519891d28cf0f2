//! Code generation errors.

use miette::{Diagnostic, NamedSource, SourceSpan};
use sdlgen_schema::SchemaLoadError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for code generation.
pub type Result<T, E = CodegenError> = std::result::Result<T, E>;

/// An error that aborts a generation run.
#[derive(Debug, Error, Diagnostic)]
pub enum CodegenError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    SchemaLoad(#[from] SchemaLoadError),

    #[error("invalid config: {message}")]
    #[diagnostic(code(sdlgen::config::validation))]
    ConfigValidation { message: String },

    #[error("unable to read config '{path}'")]
    #[diagnostic(
        code(sdlgen::config::read),
        help("pass --config or create an sdlgen.toml in the working directory")
    )]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    #[diagnostic(code(sdlgen::config::parse))]
    ConfigParse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        #[source]
        source: toml::de::Error,
    },

    #[error("unable to autobind '{type_name}': {reason}")]
    #[diagnostic(
        code(sdlgen::config::autobind),
        help("add a [models.{type_name}] entry with a model path")
    )]
    Autobind { type_name: String, reason: String },

    #[error("invalid directive @{directive} on {target}: {reason}")]
    #[diagnostic(code(sdlgen::build::directive))]
    DirectiveBuild {
        directive: String,
        target: String,
        reason: String,
    },

    #[error("unable to bind type '{type_name}' used by {target}: {reason}")]
    #[diagnostic(code(sdlgen::build::type_binding))]
    TypeBuild {
        type_name: String,
        target: String,
        reason: String,
    },

    #[error("query entry point missing")]
    #[diagnostic(
        code(sdlgen::build::missing_query),
        help("define a `Query` type or name one in a `schema {{ query: ... }}` block")
    )]
    MissingQueryRoot,

    #[error("only single fields are supported in @key on '{type_name}', found \"{fields}\"")]
    #[diagnostic(code(sdlgen::federation::unsupported_key))]
    UnsupportedKey { type_name: String, fields: String },

    #[error("@key field '{type_name}.{field}' has list type {ty}")]
    #[diagnostic(
        code(sdlgen::federation::list_key),
        help("key on a scalar, enum or object field instead")
    )]
    ListKeyField {
        type_name: String,
        field: String,
        ty: String,
    },

    #[error("@key on '{type_name}' names field '{field}', which '{type_name}' does not declare")]
    #[diagnostic(code(sdlgen::federation::key_field))]
    KeyFieldNotFound { type_name: String, field: String },

    #[error("failed to render template '{template}'")]
    #[diagnostic(code(sdlgen::render))]
    Render {
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("failed to write '{path}'")]
    #[diagnostic(code(sdlgen::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodegenError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    pub(crate) fn directive(
        directive: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::DirectiveBuild {
            directive: directive.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Rewrites the target of a `TypeBuild` error, leaving others untouched.
    #[must_use]
    pub(crate) fn in_target(self, target: impl Into<String>) -> Self {
        match self {
            Self::TypeBuild {
                type_name, reason, ..
            } => Self::TypeBuild {
                type_name,
                target: target.into(),
                reason,
            },
            other => other,
        }
    }
}
