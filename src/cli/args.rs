//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, run::RunArgs, template::TemplateArgs, validate::ValidateArgs,
};
use crate::core::config::Config;
use crate::core::sheet::InputPaths;

#[derive(Parser)]
#[command(name = "notion-bootstrap")]
#[command(author, version, about = "Seed a Notion vendor-risk workspace from CSV files")]
#[command(long_about = "Imports questions, vendors, assessments and assessment items from CSV \
into the Notion template databases. Records that already exist are skipped, so re-running is safe.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Only print errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,
}

/// Locations of the input CSV files
#[derive(clap::Args, Clone, Debug, Default)]
pub struct InputArgs {
    /// Directory holding vendors.csv, assessments.csv and assessment_items.csv
    #[arg(long)]
    pub sample_data_dir: Option<PathBuf>,

    /// Question library CSV
    #[arg(long)]
    pub questions_csv: Option<PathBuf>,
}

impl InputArgs {
    /// Flags first, then config file, then defaults
    pub fn paths(&self, config: &Config) -> InputPaths {
        let sample_data_dir = self
            .sample_data_dir
            .clone()
            .unwrap_or_else(|| config.sample_data_dir());
        let questions_csv = self
            .questions_csv
            .clone()
            .unwrap_or_else(|| config.questions_csv());
        InputPaths::new(&sample_data_dir, &questions_csv)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import the CSV files (dry run unless --apply)
    Run(RunArgs),

    /// Check the CSV files offline
    Validate(ValidateArgs),

    /// Print the CSV header and an example row for a collection
    Template(TemplateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
