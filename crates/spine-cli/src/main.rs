//! Spine CLI: the `spine` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            config,
            output,
            json,
        } => commands::run::run(config, output, json),

        Commands::Check { config, json } => commands::check::run(config, json),

        Commands::Registry { json } => commands::registry::run(json),

        Commands::Inspect { records, json } => commands::inspect::run(records, json),
    }
}
