//! Command-line interface for sdlgen.
//!
//! # Usage
//!
//! ```bash
//! # Generate code for the project in the current directory
//! sdlgen generate
//!
//! # Use another config file
//! sdlgen --config services/products/sdlgen.toml generate
//!
//! # Print the schema after every plugin has run
//! sdlgen print-schema
//!
//! # Validate config and schema without writing anything
//! sdlgen check
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use sdlgen_codegen::builder::SCHEMA_SOURCE_NAME;
use sdlgen_codegen::{Config, Generation, Pipeline, CONFIG_FILENAME};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "sdlgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline and write generated files
    Generate,

    /// Print the schema after all plugin mutation
    PrintSchema {
        /// Include federation types and fields
        #[arg(long)]
        internal: bool,
    },

    /// Run through IR construction without writing files
    Check,
}

pub fn run(cli: &Cli) -> miette::Result<()> {
    let generation = pipeline(cli)?;
    match &cli.command {
        Commands::Generate => {
            let written = generation.write()?;
            if !cli.quiet {
                for path in &written {
                    println!("  {} {}", "wrote".green(), path.display());
                }
                println!(
                    "{} generated {} file(s)",
                    "✓".green().bold(),
                    written.len()
                );
            }
        }
        Commands::PrintSchema { internal } => {
            let sdl = if *internal {
                generation
                    .data
                    .schema_str
                    .get(SCHEMA_SOURCE_NAME)
                    .unwrap_or(&generation.data.sdl)
            } else {
                &generation.data.sdl
            };
            print!("{sdl}");
        }
        Commands::Check => {
            if !cli.quiet {
                let data = &generation.data;
                println!(
                    "{} {}: {} objects, {} inputs, {} interfaces, {} entities",
                    "✓".green().bold(),
                    cli.config.display(),
                    data.objects.len(),
                    data.inputs.len(),
                    data.interfaces.len(),
                    data.entities.len()
                );
            }
        }
    }
    Ok(())
}

fn pipeline(cli: &Cli) -> miette::Result<Generation> {
    debug!(config = %cli.config.display(), "loading config");
    let config = Config::load(&cli.config)?;
    let generation = Pipeline::for_config(&config).run(config)?;
    Ok(generation)
}
