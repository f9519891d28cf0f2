//! Schema-driven code generation for sdlgen.
//!
//! This crate provides:
//! - `config`: The `sdlgen.toml` configuration, type map and autobinding
//! - `builder`: Lowering a loaded [`Schema`](sdlgen_schema::Schema) into [`Data`]
//! - `plugin`: Plugin hooks and the generation [`Pipeline`]
//! - `templates`: Tera rendering with import collection
//! - `federation`: The federation plugin and its entity dispatch runtime
//!
//! # Example
//!
//! ```ignore
//! use sdlgen_codegen::{Config, Pipeline};
//!
//! let config = Config::load("sdlgen.toml")?;
//! let generation = Pipeline::for_config(&config).run(config)?;
//! generation.write()?;
//! ```

pub mod builder;
pub mod config;
pub mod data;
pub mod error;
pub mod federation;
pub mod plugin;
pub mod templates;

pub use builder::build;
pub use config::{Binder, Config, TypeBinder, TypeMap, TypeMapEntry, CONFIG_FILENAME};
pub use data::{Data, Entity, Field, Interface, Object, Objects};
pub use error::{CodegenError, Result};
pub use federation::{Federation, FederationRuntime};
pub use plugin::{
    CodeGenerator, ConfigMutator, Generation, Pipeline, Plugin, SchemaMutator, SourceInjector,
};
pub use templates::Renderer;
