//! Load cash flows from transaction and holdings tables
//!
//! Tables are the tab-separated exports of the portfolio spreadsheet (or plain
//! CSV). Header cells are normalized to lowercase snake case, so a column
//! titled `Current Value` is looked up as `current_value`.

use super::{CashFlow, CashFlowSet};
use chrono::NaiveDate;
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading input tables
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read table: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("unrecognised date `{0}`")]
    InvalidDate(String),
}

/// Field delimiter of an input table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Tsv,
    Csv,
}

impl TableFormat {
    /// Pick the format from a file extension; anything but `.csv` is tab-separated
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => TableFormat::Csv,
            _ => TableFormat::Tsv,
        }
    }

    fn builder(self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder.flexible(true).trim(Trim::All);
        match self {
            TableFormat::Tsv => {
                builder.delimiter(b'\t').quoting(false);
            }
            TableFormat::Csv => {
                builder.delimiter(b',');
            }
        }
        builder
    }
}

/// Header row with normalized names
struct Columns {
    names: Vec<String>,
}

impl Columns {
    fn from_reader<R: Read>(reader: &mut Reader<R>) -> Result<Self, LoadError> {
        let names = reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();
        Ok(Self { names })
    }

    fn require(&self, name: &'static str) -> Result<usize, LoadError> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or(LoadError::MissingColumn(name))
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

/// Parse a numeric cell, stripping `$` and thousands separators from currency values
///
/// Returns `None` for blank or non-numeric cells.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let value = raw.trim();
    let cleaned = if value.starts_with('$') || value.starts_with("-$") {
        value.replace(['$', ','], "")
    } else {
        value.to_string()
    };

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date cell
///
/// Accepts `MM/DD/YYYY`, `M-D-YYYY` (leading segment of one or two digits)
/// and `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, LoadError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(LoadError::InvalidDate(raw.to_string()));
    }

    let format = if value.contains('/') {
        "%m/%d/%Y"
    } else if value.split('-').next().map_or(false, |head| head.len() <= 2) {
        "%m-%d-%Y"
    } else {
        "%Y-%m-%d"
    };

    NaiveDate::parse_from_str(value, format).map_err(|_| LoadError::InvalidDate(raw.to_string()))
}

fn read_transactions<R: Read>(mut reader: Reader<R>) -> Result<Vec<CashFlow>, LoadError> {
    let columns = Columns::from_reader(&mut reader)?;
    let date_idx = columns.require("date")?;
    let amount_idx = columns.require("amount")?;

    let mut flows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;

        let Some(amount) = parse_amount(cell(&record, amount_idx)) else {
            debug!("skipping row {}: non-numeric amount {:?}", line + 2, cell(&record, amount_idx));
            continue;
        };

        match parse_date(cell(&record, date_idx)) {
            Ok(date) => flows.push(CashFlow::on_date(date, amount)),
            Err(err) => warn!("skipping row {}: {}", line + 2, err),
        }
    }

    Ok(flows)
}

/// Load transaction cash flows (`date`, `amount` columns) from a file
pub fn load_transactions<P: AsRef<Path>>(path: P) -> Result<Vec<CashFlow>, LoadError> {
    let format = TableFormat::from_path(&path);
    read_transactions(format.builder().from_path(path)?)
}

/// Load transaction cash flows from any reader
pub fn load_transactions_from_reader<R: Read>(
    reader: R,
    format: TableFormat,
) -> Result<Vec<CashFlow>, LoadError> {
    read_transactions(format.builder().from_reader(reader))
}

fn read_holdings_value<R: Read>(mut reader: Reader<R>) -> Result<f64, LoadError> {
    let columns = Columns::from_reader(&mut reader)?;
    let value_idx = columns.require("current_value")?;

    let mut total = 0.0;
    for result in reader.records() {
        let record = result?;
        total += parse_amount(cell(&record, value_idx)).unwrap_or(0.0);
    }

    Ok(total)
}

/// Total `current_value` across a holdings file
pub fn load_holdings_value<P: AsRef<Path>>(path: P) -> Result<f64, LoadError> {
    let format = TableFormat::from_path(&path);
    read_holdings_value(format.builder().from_path(path)?)
}

/// Total `current_value` across holdings read from any reader
pub fn load_holdings_value_from_reader<R: Read>(
    reader: R,
    format: TableFormat,
) -> Result<f64, LoadError> {
    read_holdings_value(format.builder().from_reader(reader))
}

fn read_grouped<R: Read>(mut reader: Reader<R>) -> Result<BTreeMap<String, CashFlowSet>, LoadError> {
    let columns = Columns::from_reader(&mut reader)?;
    let portfolio_idx = columns.require("portfolio")?;
    let date_idx = columns.require("date")?;
    let amount_idx = columns.require("amount")?;

    let mut grouped: BTreeMap<String, Vec<CashFlow>> = BTreeMap::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let portfolio = cell(&record, portfolio_idx);
        if portfolio.is_empty() {
            warn!("skipping row {}: no portfolio name", line + 2);
            continue;
        }

        let Some(amount) = parse_amount(cell(&record, amount_idx)) else {
            debug!("skipping row {}: non-numeric amount", line + 2);
            continue;
        };

        match parse_date(cell(&record, date_idx)) {
            Ok(date) => grouped
                .entry(portfolio.to_string())
                .or_default()
                .push(CashFlow::on_date(date, amount)),
            Err(err) => warn!("skipping row {}: {}", line + 2, err),
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(name, flows)| (name, CashFlowSet::new(flows)))
        .collect())
}

/// Load a `portfolio`, `date`, `amount` table into one cash-flow set per portfolio
pub fn load_grouped<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, CashFlowSet>, LoadError> {
    let format = TableFormat::from_path(&path);
    read_grouped(format.builder().from_path(path)?)
}

/// Grouped cash flows from any reader
pub fn load_grouped_from_reader<R: Read>(
    reader: R,
    format: TableFormat,
) -> Result<BTreeMap<String, CashFlowSet>, LoadError> {
    read_grouped(format.builder().from_reader(reader))
}

/// Combine transactions with the current portfolio value as a terminal inflow
///
/// The terminal flow is only added when `terminal_value` is positive.
pub fn portfolio_cash_flows(
    transactions: Vec<CashFlow>,
    terminal_value: f64,
    as_of: NaiveDate,
) -> CashFlowSet {
    let mut flows = transactions;
    if terminal_value > 0.0 {
        flows.push(CashFlow::on_date(as_of, terminal_value));
    }
    CashFlowSet::new(flows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2023-01-15").unwrap(), date(2023, 1, 15));
        assert_eq!(parse_date("01/15/2023").unwrap(), date(2023, 1, 15));
        assert_eq!(parse_date("2-2-2026").unwrap(), date(2026, 2, 2));
        assert_eq!(parse_date(" 12/31/2024 ").unwrap(), date(2024, 12, 31));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(parse_date(""), Err(LoadError::InvalidDate(_))));
        assert!(matches!(parse_date("yesterday"), Err(LoadError::InvalidDate(_))));
        assert!(matches!(parse_date("2023-02-30"), Err(LoadError::InvalidDate(_))));
    }

    #[test]
    fn test_parse_amount_currency() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.5));
        assert_eq!(parse_amount("-$10,000"), Some(-10000.0));
        assert_eq!(parse_amount("250.25"), Some(250.25));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_load_transactions_tsv() {
        let tsv = "Date\tAmount\tType\tNotes\n\
                   2023-01-01\t-$10,000\tBuy\tInitial\n\
                   06/01/2023\t$500\tDividend\t\n\
                   2023-07-01\tpending\tBuy\tskipped\n\
                   \t100\tBuy\tno date\n";

        let flows = load_transactions_from_reader(tsv.as_bytes(), TableFormat::Tsv).unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].amount(), -10000.0);
        assert_eq!(flows[1].timestamp().date(), date(2023, 6, 1));
    }

    #[test]
    fn test_load_transactions_missing_column() {
        let tsv = "Date\tValue\n2023-01-01\t100\n";
        let err = load_transactions_from_reader(tsv.as_bytes(), TableFormat::Tsv).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("amount")));
    }

    #[test]
    fn test_load_holdings_value_sums_numeric_cells() {
        let tsv = "Name\tCategory\tCost Basis\tCurrent Value\n\
                   Fund A\tEquity\t$1,000\t$1,250.00\n\
                   Fund B\tBond\t$500\t\n\
                   Fund C\tCash\t$200\t200\n";

        let total = load_holdings_value_from_reader(tsv.as_bytes(), TableFormat::Tsv).unwrap();
        assert!((total - 1450.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_grouped_csv() {
        let csv = "portfolio,date,amount\n\
                   alpha,2023-01-01,-1000\n\
                   beta,2023-01-01,-500\n\
                   alpha,2024-01-01,1100\n\
                   ,2024-01-01,1\n";

        let grouped = load_grouped_from_reader(csv.as_bytes(), TableFormat::Csv).unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["alpha"].len(), 2);
        assert_eq!(grouped["beta"].len(), 1);
    }

    #[test]
    fn test_portfolio_cash_flows_adds_terminal_value() {
        let tx = vec![CashFlow::on_date(date(2023, 1, 1), -1000.0)];
        let set = portfolio_cash_flows(tx.clone(), 1100.0, date(2024, 1, 1));
        assert_eq!(set.len(), 2);

        let without = portfolio_cash_flows(tx, 0.0, date(2024, 1, 1));
        assert_eq!(without.len(), 1);
    }

    #[test]
    fn test_table_format_from_extension() {
        assert_eq!(TableFormat::from_path("tx.csv"), TableFormat::Csv);
        assert_eq!(TableFormat::from_path("tx.CSV"), TableFormat::Csv);
        assert_eq!(TableFormat::from_path("tx.tsv"), TableFormat::Tsv);
        assert_eq!(TableFormat::from_path("export"), TableFormat::Tsv);
    }
}
