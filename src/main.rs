mod cli;
mod commands;
mod error;
mod model;
mod ocr;
mod pdf;
mod toc;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ocr(args) => commands::ocr::run(args),
        Commands::Indent(args) => commands::indent::run(args),
        Commands::Offset(args) => commands::pages::run_offset(args),
        Commands::FillPages(args) => commands::pages::run_fill(args),
        Commands::Apply(args) => commands::apply::run(args),
        Commands::Export(args) => commands::export::run(args),
        Commands::Run(args) => commands::run::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
