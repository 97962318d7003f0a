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

//! CLI entry point for the HemsQ scheduler

use anyhow::{Context, Result};
use clap::Parser;
use hemsq_core::{RollingScheduler, SearchConfig};
use hemsq_sim::SimulatedAnnealingSolver;
use hemsq_sim::cli::{
    Cli, Commands, CsvFormatter, ExampleConfigArgs, RunArgs, TableFormatter,
};
use hemsq_types::SituationParams;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_command(args).await,
        Commands::ExampleConfig(args) => example_config_command(&args),
    }
}

async fn run_command(args: RunArgs) -> Result<()> {
    validate_run_args(&args)?;

    let params = match &args.config {
        Some(path) => SituationParams::from_file(path)?,
        None => {
            info!("No parameter file given, using defaults");
            SituationParams::default()
        }
    };
    for issue in &params.validate_detailed().warnings {
        warn!("{}: {}", issue.field, issue.message);
    }

    let mut solver = SimulatedAnnealingSolver::new(args.reads, args.sweeps);
    if let Some(seed) = args.seed {
        solver = solver.with_seed(seed);
    }
    let config = SearchConfig {
        attempt_timeout: Duration::from_secs(args.timeout_secs),
        ..SearchConfig::default()
    };

    info!(
        "Scheduling {} slots from {:02}:00 (window {}, span {})",
        params.output_len, params.start_time, params.step, params.reschedule_span
    );
    let mut scheduler = RollingScheduler::with_search_config(Arc::new(solver), config);
    let result = scheduler
        .solve(&params)
        .await
        .context("Scheduling failed")?;

    let output_mode = args.output.as_str();
    if output_mode == "table" || output_mode == "both" {
        println!("{}", TableFormatter::format_schedule(&result));
        println!("{}", TableFormatter::format_windows(&result));
        println!("{}", TableFormatter::format_cost(&result));
    }

    if let Some(csv_path) = &args.csv_path {
        CsvFormatter::write_schedule(&result, csv_path)?;
        println!("Schedule exported to: {csv_path}");
    }

    if let Some(json_path) = &args.json_path {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        fs::write(json_path, json)
            .with_context(|| format!("Failed to write JSON file {json_path}"))?;
        println!("Result exported to: {json_path}");
    }

    Ok(())
}

fn validate_run_args(args: &RunArgs) -> Result<()> {
    if (args.output == "csv" || args.output == "both") && args.csv_path.is_none() {
        anyhow::bail!(
            "--csv-path is required when --output is '{}'.\n\n            Example: hemsq run --output {} --csv-path schedule.csv",
            args.output,
            args.output
        );
    }

    if args.reads == 0 {
        anyhow::bail!("Invalid --reads: must be greater than 0.");
    }

    if args.sweeps == 0 {
        anyhow::bail!("Invalid --sweeps: must be greater than 0.");
    }

    if args.timeout_secs == 0 {
        anyhow::bail!("Invalid --timeout-secs: must be greater than 0.");
    }

    Ok(())
}

fn example_config_command(args: &ExampleConfigArgs) -> Result<()> {
    let toml = SituationParams::example_toml();
    match &args.output {
        Some(path) => {
            fs::write(path, &toml)
                .with_context(|| format!("Failed to write example config to {path}"))?;
            println!("Example parameters written to: {path}");
        }
        None => print!("{toml}"),
    }
    Ok(())
}
