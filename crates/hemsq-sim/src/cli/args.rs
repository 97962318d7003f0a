// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of HemsQ.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hemsq")]
#[command(author, version, about = "HemsQ rolling-horizon energy scheduler")]
#[command(
    long_about = "Schedules grid purchase, export, battery charging and solar use for a home.\n\
    \nEach window is formulated as a QUBO and solved with a local simulated-annealing\n\
    solver, retrying over a grid of penalty weights until the schedule is feasible.\n\
    \nExamples:\n  \
    hemsq run                                   # Default parameters\n  \
    hemsq run --config params.toml --output both --csv-path schedule.csv\n  \
    hemsq example-config > params.toml          # Starting point for a parameter file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the rolling-horizon scheduler
    #[command(
        long_about = "Run the scheduler for the configured horizon and print the schedule.\n\
        \nWithout --config the built-in default parameters are used.\n\
        \nExamples:\n  \
        hemsq run\n  \
        hemsq run --config params.toml --seed 42\n  \
        hemsq run --config params.toml --output csv --csv-path schedule.csv --json-path schedule.json"
    )]
    Run(RunArgs),

    /// Print an example parameter file
    ExampleConfig(ExampleConfigArgs),
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Parameter file (TOML)
    #[arg(
        long,
        value_name = "PATH",
        help = "TOML parameter file",
        long_help = "TOML file with situation parameters.\n\
          Omitted fields take their default values.\n\
          \nExample: --config params.toml"
    )]
    pub config: Option<String>,

    /// Output format: table, csv, or both
    #[arg(long, default_value = "table",
          value_parser = ["table", "csv", "both"],
          help = "How to display results")]
    pub output: String,

    /// CSV file path (required when output is csv or both)
    #[arg(
        long,
        value_name = "PATH",
        help = "Where to save the schedule as CSV",
        long_help = "Path for CSV export with slot-by-slot details.\n\
          Required when --output is 'csv' or 'both'.\n\
          \nExample: --csv-path schedule.csv"
    )]
    pub csv_path: Option<String>,

    /// Full result as JSON
    #[arg(long, value_name = "PATH", help = "Where to save the full result as JSON")]
    pub json_path: Option<String>,

    /// Annealing restarts per solver call
    #[arg(long, default_value_t = 16, help = "Samples returned per solver call (must be > 0)")]
    pub reads: usize,

    /// Metropolis sweeps per restart
    #[arg(long, default_value_t = 1000, help = "Sweeps per sample (must be > 0)")]
    pub sweeps: usize,

    /// Random seed for reproducible schedules
    #[arg(long, help = "Seed for the annealer; random when omitted")]
    pub seed: Option<u64>,

    /// Timeout of a single solver call in seconds
    #[arg(long, default_value_t = 60, help = "Seconds before a solver call counts as failed")]
    pub timeout_secs: u64,
}

#[derive(Debug, Parser)]
pub struct ExampleConfigArgs {
    /// Write to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["hemsq", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.output, "table");
        assert_eq!(args.reads, 16);
        assert_eq!(args.timeout_secs, 60);
        assert!(args.config.is_none());
        assert!(args.seed.is_none());
    }

    #[test]
    fn test_run_with_options() {
        let cli = Cli::try_parse_from([
            "hemsq",
            "run",
            "--config",
            "params.toml",
            "--output",
            "both",
            "--csv-path",
            "out.csv",
            "--seed",
            "42",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config.as_deref(), Some("params.toml"));
        assert_eq!(args.output, "both");
        assert_eq!(args.csv_path.as_deref(), Some("out.csv"));
        assert_eq!(args.seed, Some(42));
    }

    #[test]
    fn test_unknown_output_format_is_rejected() {
        assert!(Cli::try_parse_from(["hemsq", "run", "--output", "xml"]).is_err());
    }

    #[test]
    fn test_example_config_subcommand() {
        let cli = Cli::try_parse_from(["hemsq", "example-config"]).unwrap();
        assert!(matches!(cli.command, Commands::ExampleConfig(ExampleConfigArgs { output: None })));
    }
}
