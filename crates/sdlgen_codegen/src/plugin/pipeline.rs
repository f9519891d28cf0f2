//! Pipeline orchestrator.

use super::Plugin;
use crate::builder::build;
use crate::config::{Binder, Config};
use crate::data::Data;
use crate::error::Result;
use crate::federation::Federation;
use crate::templates::Renderer;
use std::path::PathBuf;
use tracing::{debug, info};

/// Runs the plugin hooks around schema loading and IR construction.
///
/// Stages, in order:
/// 1. read schema files
/// 2. config mutators, then config validation
/// 3. source injectors
/// 4. schema load, then schema mutators
/// 5. config validation again, over whatever the injectors changed
/// 6. autobind and builtin injection
/// 7. IR build
/// 8. code generators
///
/// The first error aborts the run.
pub struct Pipeline {
    plugins: Vec<Box<dyn Plugin>>,
}

/// The result of a successful run.
#[derive(Debug)]
pub struct Generation {
    pub data: Data,
    pub renderer: Renderer,
}

impl Generation {
    /// Writes every rendered file relative to the config's directory.
    pub fn write(&self) -> Result<Vec<PathBuf>> {
        self.renderer.write_all(&self.data.config.base_dir)
    }
}

impl Pipeline {
    /// Creates a pipeline with no plugins.
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Creates a pipeline with the plugins the config enables.
    #[must_use]
    pub fn for_config(config: &Config) -> Self {
        let pipeline = Self::new();
        if config.federated {
            pipeline.plugin(Federation::new())
        } else {
            pipeline
        }
    }

    /// Adds a plugin. Hooks run in registration order.
    #[must_use]
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn run(mut self, mut config: Config) -> Result<Generation> {
        config.read_sources()?;

        for plugin in &mut self.plugins {
            let name = plugin.name();
            if let Some(mutator) = plugin.as_config_mutator() {
                debug!(plugin = name, "mutate config");
                mutator.mutate_config(&mut config)?;
            }
        }
        config.check()?;

        for plugin in &mut self.plugins {
            let name = plugin.name();
            if let Some(injector) = plugin.as_source_injector() {
                debug!(plugin = name, "inject sources");
                injector.inject_sources(&mut config)?;
            }
        }

        let mut schema = config.load_schema()?;
        for plugin in &mut self.plugins {
            let name = plugin.name();
            if let Some(mutator) = plugin.as_schema_mutator() {
                debug!(plugin = name, "mutate schema");
                mutator.mutate_schema(&mut schema)?;
            }
        }

        // Source injectors hold `&mut Config` too.
        config.check()?;
        config.autobind(&schema)?;
        config.inject_builtins();
        let data = build(&config, schema, &Binder::new(&config.models))?;

        let mut renderer = Renderer::new();
        for plugin in &mut self.plugins {
            let name = plugin.name();
            if let Some(generator) = plugin.as_code_generator() {
                debug!(plugin = name, "generate code");
                generator.generate_code(&data, &mut renderer)?;
            }
        }

        info!(
            objects = data.objects.len(),
            entities = data.entities.len(),
            "generation finished"
        );
        Ok(Generation { data, renderer })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
