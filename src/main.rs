//! storagebench CLI entry point

use anyhow::{Context, Result};
use storagebench::config::cli::Cli;
use storagebench::config::toml::build_config;
use storagebench::config::validator::validate_config;
use storagebench::output::{csv, json, text};
use storagebench::RunController;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    cli.validate()?;

    println!("storagebench v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config = build_config(&cli)?;
    validate_config(&config).context("Configuration validation failed")?;

    text::print_configuration(&config, cli.runs);

    if cli.dry_run {
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    let mut results = Vec::with_capacity(cli.runs);
    for run in 1..=cli.runs {
        println!();
        println!("Starting run {} of {}...", run, cli.runs);
        info!(run, path = %config.path.display(), test = %config.test_type, "starting run");

        let mut controller = RunController::new(config.clone());
        if !cli.no_live {
            controller = controller.with_observer(move |point| text::print_live_point(run, point));
        }

        let result = controller
            .run()
            .with_context(|| format!("Run {} failed", run))?;

        println!();
        text::print_results(run, &config, &result);
        results.push(result);
    }

    text::print_summary(&config, &results);

    if let Some(path) = &cli.json_output {
        let report = json::JsonReport::new(&config, &results);
        json::write_json_output(path, &report, true)?;
        println!("JSON results written to {}", path.display());
    }

    if let Some(path) = &cli.csv_output {
        csv::write_csv_output(path, &results)?;
        println!("CSV series written to {}", path.display());
    }

    Ok(())
}
