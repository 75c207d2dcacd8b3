//! Cash-flow records and transaction table loading

mod data;
pub mod loader;

pub use data::{CashFlow, CashFlowSet, NormalizedFlow, DAYS_PER_YEAR};
pub use loader::{
    load_transactions, load_transactions_from_reader, load_holdings_value,
    load_holdings_value_from_reader, load_grouped, load_grouped_from_reader,
    portfolio_cash_flows, parse_date, parse_amount, LoadError, TableFormat,
};
