//! Main entry point for the sdlgen CLI.

use clap::Parser;
use sdlgen_cli::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("sdlgen=debug,sdlgen_codegen=debug,sdlgen_schema=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "sdlgen=info,sdlgen_codegen=info,sdlgen_schema=info".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(report) = sdlgen_cli::run(&cli) {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}
