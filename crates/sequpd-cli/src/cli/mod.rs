//! CLI for the sequpd component update checker.

mod commands;
mod context;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_check, run_components, run_status, run_update};
use context::RunContext;

/// Top-level CLI for sequpd.
#[derive(Debug, Parser)]
#[command(name = "sequpd")]
#[command(about = "sequpd: check components for updates one request at a time", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/sequpd/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log per-step checker activity (trace level).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Check components as one batch, one request per id; stops at the first failure.
    Check {
        /// Component ids to check (default: every configured component).
        ids: Vec<String>,

        /// Answer from this manifest instead of the configured one.
        #[arg(long, value_name = "PATH")]
        manifest: Option<PathBuf>,

        /// Send the check with component updates disabled.
        #[arg(long)]
        disable_updates: bool,

        /// Extra request attribute (repeatable).
        #[arg(long = "attr", value_name = "KEY=VALUE")]
        attrs: Vec<String>,
    },

    /// Check every configured component independently (failures don't stop the rest).
    Update {
        /// Answer from this manifest instead of the configured one.
        #[arg(long, value_name = "PATH")]
        manifest: Option<PathBuf>,
    },

    /// List configured components.
    Components,

    /// Show persisted per-component check history.
    Status,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            CliCommand::Check {
                ids,
                manifest,
                disable_updates,
                attrs,
            } => {
                let ctx = RunContext::load(self.config.as_deref(), manifest.as_deref(), disable_updates)?
                    .with_attributes(&attrs)?;
                run_check(&ctx, &ids).await?;
            }
            CliCommand::Update { manifest } => {
                let ctx = RunContext::load(self.config.as_deref(), manifest.as_deref(), false)?;
                run_update(&ctx).await?;
            }
            CliCommand::Components => {
                let ctx = RunContext::load(self.config.as_deref(), None, false)?;
                run_components(&ctx);
            }
            CliCommand::Status => {
                let ctx = RunContext::load(self.config.as_deref(), None, false)?;
                run_status(&ctx);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
