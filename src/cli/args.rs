//! Command-line argument parsing for minirag
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, ModelBackend};

/// Query answered when none is given on the command line
pub const DEFAULT_QUERY: &str = "Qual é a importância da energia renovável?";

/// minirag - answer a query with a language model grounded on retrieved fragments
#[derive(Parser, Debug)]
#[command(name = "minirag")]
#[command(version)]
#[command(about = "Answer a query with a language model grounded on retrieved fragments", long_about = None)]
pub struct Args {
    /// Query to answer (a built-in example query by default).
    /// A query spelled like a subcommand goes after `--`: `minirag -- config`
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model artifact path (overrides the configuration file)
    #[arg(long)]
    pub model_path: Option<String>,

    /// Model backend (overrides the configuration file)
    #[arg(long, value_enum)]
    pub backend: Option<ModelBackend>,

    /// Verbosity level: -v (info logs), -vv (debug logs)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only, no spinner)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Print the prompt that would be sent to the model, without loading it
    Prompt {
        /// Query to format (the built-in example query by default)
        #[arg(value_name = "QUERY")]
        query: Option<String>,
    },

    /// Display the effective configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Query to answer, falling back to the built-in one
    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or(DEFAULT_QUERY)
    }

    /// Reject a top-level query combined with a subcommand
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_some() && self.query.is_some() {
            return Err("Cannot specify a query together with a subcommand.".to_string());
        }
        Ok(())
    }

    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.model_path {
            config.model_path = path.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
    }
}

impl Verbosity {
    /// Default `env_logger` filter for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }

    /// Check if should show the progress spinner
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
