//! Calculate XIRR for every portfolio in a grouped cash-flow table
//!
//! Input columns: `portfolio`, `date`, `amount`. Portfolios are solved in
//! parallel. Supports JSON output via --json.

use anyhow::{Context, Result};
use clap::Parser;
use portfolio_irr::cashflow::load_grouped;
use portfolio_irr::irr::SolverConfig;
use portfolio_irr::BatchSolver;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "batch_irr", version, about = "XIRR for each portfolio in a grouped table")]
struct Args {
    /// Grouped cash-flow table (.tsv or .csv)
    input: PathBuf,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct PortfolioRate {
    portfolio: String,
    cash_flow_count: usize,
    irr: Option<f64>,
}

#[derive(Serialize)]
struct BatchResponse {
    portfolios: Vec<PortfolioRate>,
    execution_time_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let start = Instant::now();

    let runner = BatchSolver::new(SolverConfig::from_env()).context("invalid solver configuration")?;
    let grouped = load_grouped(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    let portfolios: Vec<PortfolioRate> = runner
        .run_named(&grouped)
        .into_iter()
        .map(|(portfolio, irr)| PortfolioRate {
            cash_flow_count: grouped.get(&portfolio).map_or(0, |set| set.len()),
            portfolio,
            irr,
        })
        .collect();

    if args.json {
        let response = BatchResponse {
            portfolios,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        println!("{}", serde_json::to_string(&response)?);
        return Ok(());
    }

    println!("{:<24} {:>6} {:>10}", "Portfolio", "Flows", "IRR");
    println!("{}", "-".repeat(42));
    for row in &portfolios {
        let irr = row
            .irr
            .map(|r| format!("{:.2}%", r * 100.0))
            .unwrap_or_else(|| "N/A".to_string());
        println!("{:<24} {:>6} {:>10}", row.portfolio, row.cash_flow_count, irr);
    }
    println!("\nSolved {} portfolios in {:?}", portfolios.len(), start.elapsed());

    Ok(())
}
