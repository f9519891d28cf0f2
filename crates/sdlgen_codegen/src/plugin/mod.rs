//! Plugin hooks.
//!
//! A plugin opts into any of four hooks by returning itself from the
//! matching accessor:
//!
//! | Hook | Runs | May change |
//! |------|------|------------|
//! | [`ConfigMutator`] | first | the config |
//! | [`SourceInjector`] | before the schema loads | config and sources |
//! | [`SchemaMutator`] | after the schema loads | the schema graph |
//! | [`CodeGenerator`] | after the IR is built | only the renderer |
//!
//! ```ignore
//! struct Stamp;
//!
//! impl Plugin for Stamp {
//!     fn name(&self) -> &'static str { "stamp" }
//!     fn as_code_generator(&mut self) -> Option<&mut dyn CodeGenerator> { Some(self) }
//! }
//! ```

mod pipeline;

pub use pipeline::{Generation, Pipeline};

use crate::config::Config;
use crate::data::Data;
use crate::error::Result;
use crate::templates::Renderer;
use sdlgen_schema::Schema;

/// A pipeline extension.
pub trait Plugin {
    /// The name of this plugin, used in logs.
    fn name(&self) -> &'static str;

    fn as_config_mutator(&mut self) -> Option<&mut dyn ConfigMutator> {
        None
    }

    fn as_source_injector(&mut self) -> Option<&mut dyn SourceInjector> {
        None
    }

    fn as_schema_mutator(&mut self) -> Option<&mut dyn SchemaMutator> {
        None
    }

    fn as_code_generator(&mut self) -> Option<&mut dyn CodeGenerator> {
        None
    }
}

/// Adjusts the config before anything is loaded.
pub trait ConfigMutator {
    fn mutate_config(&mut self, config: &mut Config) -> Result<()>;
}

/// Adds schema sources before the schema loads.
pub trait SourceInjector {
    fn inject_sources(&mut self, config: &mut Config) -> Result<()>;
}

/// Rewrites the loaded schema graph.
pub trait SchemaMutator {
    fn mutate_schema(&mut self, schema: &mut Schema) -> Result<()>;
}

/// Renders files from the finished IR.
pub trait CodeGenerator {
    fn generate_code(&mut self, data: &Data, renderer: &mut Renderer) -> Result<()>;
}
