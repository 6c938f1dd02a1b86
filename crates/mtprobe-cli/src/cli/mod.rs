//! CLI for the mtprobe RDAP media type prober.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use mtprobe_core::config;
use std::path::PathBuf;

use commands::{run_completions, run_probe, run_servers, run_variants};

/// Top-level CLI for mtprobe.
#[derive(Debug, Parser)]
#[command(name = "mtprobe")]
#[command(about = "mtprobe: probe RDAP servers for Accept header sensitivity", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Probe every server in the RDAP bootstrap registry and write the result file.
    Run {
        /// Read the bootstrap document from a local file instead of fetching it.
        #[arg(long, value_name = "PATH")]
        registry_file: Option<PathBuf>,
        /// Result file (semicolon-separated).
        #[arg(long, short, default_value = "rdap_help_responses.csv", value_name = "PATH")]
        output: PathBuf,
        /// Probe only the first N servers after shuffling.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
        /// Seed for the queue shuffle (random when omitted).
        #[arg(long, value_name = "SEED")]
        seed: Option<u64>,
    },

    /// List the servers in the registry and the TLDs each one serves.
    Servers {
        /// Read the bootstrap document from a local file instead of fetching it.
        #[arg(long, value_name = "PATH")]
        registry_file: Option<PathBuf>,
    },

    /// Show the configured request variants.
    Variants,

    /// Print shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                registry_file,
                output,
                limit,
                seed,
            } => run_probe(&cfg, registry_file.as_deref(), &output, limit, seed).await?,
            CliCommand::Servers { registry_file } => {
                run_servers(&cfg, registry_file.as_deref()).await?
            }
            CliCommand::Variants => run_variants(&cfg)?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
