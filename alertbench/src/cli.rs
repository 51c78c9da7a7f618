//! Command-line interface for alertbench.

use crate::config::Config;
use alertbench_core::Implementation;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "alertbench")]
#[command(about = "Collect and chart create-alert timings across interactivity approaches")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file [default: .alertbench.toml if present]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalize raw capture files into the results table
    Collect(CollectArgs),
    /// Summarize the results table and render comparison charts
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct CollectArgs {
    /// JSON capture files, each holding one capture set or an array of them
    #[arg(required = true, value_name = "CAPTURE")]
    pub captures: Vec<PathBuf>,

    /// Results table to write (replaced atomically)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Results table to read
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for the chart images
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Implementation that must be present (repeatable; replaces the configured set)
    #[arg(long = "expect", value_name = "LABEL")]
    pub expect: Vec<Implementation>,

    /// Allowed relative deviation of request count and bytes within an implementation
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Disable colored terminal output
    #[arg(long)]
    pub no_color: bool,

    /// Print summary statistics as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values.
    /// Only values given on the command line override the config.
    pub fn apply_to_config(&self, config: &mut Config) {
        match &self.command {
            Command::Collect(args) => {
                if let Some(output) = &args.output {
                    config.collect.output = output.clone();
                }
            }
            Command::Report(args) => {
                if let Some(input) = &args.input {
                    config.report.input = input.clone();
                }

                if let Some(output_dir) = &args.output_dir {
                    config.report.output_dir = output_dir.clone();
                }

                if !args.expect.is_empty() {
                    config.report.expected_implementations = args.expect.clone();
                }

                if let Some(tolerance) = args.tolerance {
                    config.report.consistency_tolerance = tolerance;
                }

                if args.no_color {
                    config.report.color = false;
                }
            }
        }
    }
}
