use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "spine",
    about = "Spine: name-based selection and extraction over truth/reco event records",
    version
)]
pub struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every enabled sample through every tree and write the tables
    Run {
        /// Analysis configuration (TOML)
        config: String,

        /// Output directory (overrides `general.output`)
        #[arg(long)]
        output: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compile every branch of a configuration without reading records
    Check {
        /// Analysis configuration (TOML)
        config: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every registered name, per registry
    Registry {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a spill record file
    Inspect {
        /// Spill records (JSONL)
        records: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
