//! Portfolio IRR CLI
//!
//! Computes the annualized XIRR of a portfolio from its transaction table and,
//! optionally, a holdings table whose current values form a terminal inflow.
//! Solver settings come from `IRR_*` environment variables; flags override them.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use portfolio_irr::cashflow::{
    load_holdings_value, load_transactions, parse_date, portfolio_cash_flows,
};
use portfolio_irr::irr::{BracketPolicy, SolverConfig, XirrSolver};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "portfolio_irr", version, about = "Annualized IRR for a portfolio's dated cash flows")]
struct Args {
    /// Transaction table with `date` and `amount` columns (.tsv or .csv)
    #[arg(short, long)]
    transactions: PathBuf,

    /// Holdings table with a `current_value` column
    #[arg(long)]
    holdings: Option<PathBuf>,

    /// Valuation date for the terminal holdings value (default: today)
    #[arg(long, value_parser = parse_as_of)]
    as_of: Option<NaiveDate>,

    /// Starting guess for the Newton stage
    #[arg(long)]
    guess: Option<f64>,

    /// Skip the bracket sign check before bisection
    #[arg(long)]
    unchecked_bracket: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_as_of(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct IrrResponse {
    irr: Option<f64>,
    irr_pct: Option<f64>,
    cash_flow_count: usize,
    total_contributed: f64,
    terminal_value: f64,
    as_of: NaiveDate,
    undefined_reason: Option<String>,
}

fn format_percent(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.1}%", r * 100.0),
        None => "N/A".to_string(),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut config = SolverConfig::from_env();
    if let Some(guess) = args.guess {
        config = config.with_initial_guess(guess);
    }
    if args.unchecked_bracket {
        config = config.with_bracket_policy(BracketPolicy::Unchecked);
    }
    let solver = XirrSolver::new(config).context("invalid solver configuration")?;

    let transactions = load_transactions(&args.transactions)
        .with_context(|| format!("failed to load {}", args.transactions.display()))?;
    let total_contributed: f64 = transactions
        .iter()
        .map(|cf| cf.amount())
        .filter(|a| *a < 0.0)
        .sum::<f64>()
        .abs();

    let terminal_value = match &args.holdings {
        Some(path) => load_holdings_value(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => 0.0,
    };

    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let flows = portfolio_cash_flows(transactions, terminal_value, as_of);

    let outcome = solver.try_solve(&flows);
    let irr = outcome.as_ref().ok().copied();

    if args.json {
        let response = IrrResponse {
            irr,
            irr_pct: irr.map(|r| r * 100.0),
            cash_flow_count: flows.len(),
            total_contributed,
            terminal_value,
            as_of,
            undefined_reason: outcome.err().map(|e| e.to_string()),
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("Cash flows:        {}", flows.len());
        println!("Total contributed: ${:.2}", total_contributed);
        if terminal_value > 0.0 {
            println!("Terminal value:    ${:.2} (as of {})", terminal_value, as_of);
        }
        println!("IRR:               {}", format_percent(irr));
        if let Err(err) = outcome {
            println!("  ({})", err);
        }
    }

    Ok(())
}
