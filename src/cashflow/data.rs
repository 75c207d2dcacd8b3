//! Cash-flow data structures and time normalization

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::irr::IrrError;

/// Fixed year length used to convert elapsed time into years
pub const DAYS_PER_YEAR: f64 = 365.25;

const MILLIS_PER_YEAR: f64 = DAYS_PER_YEAR * 24.0 * 60.0 * 60.0 * 1000.0;

/// A single dated cash flow
///
/// Negative amounts are outflows (investments), positive amounts are
/// inflows (returns, terminal value).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    timestamp: NaiveDateTime,
    amount: f64,
}

impl CashFlow {
    pub fn new(timestamp: NaiveDateTime, amount: f64) -> Self {
        Self { timestamp, amount }
    }

    /// Cash flow stamped at midnight of `date`
    pub fn on_date(date: NaiveDate, amount: f64) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN), amount)
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

/// A cash flow expressed as years elapsed since the earliest flow in its set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFlow {
    pub years_from_start: f64,
    pub amount: f64,
}

impl NormalizedFlow {
    pub fn new(years_from_start: f64, amount: f64) -> Self {
        Self { years_from_start, amount }
    }
}

/// Collection of cash flows for one IRR calculation
///
/// Insertion order carries no meaning; [`CashFlowSet::normalize`] sorts a copy
/// by timestamp and never touches the stored flows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSet {
    flows: Vec<CashFlow>,
}

impl CashFlowSet {
    pub fn new(flows: Vec<CashFlow>) -> Self {
        Self { flows }
    }

    /// Build a set from `(date, amount)` pairs
    pub fn from_dated<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::new(
            entries
                .into_iter()
                .map(|(date, amount)| CashFlow::on_date(date, amount))
                .collect(),
        )
    }

    /// Return a new set with `flow` appended
    pub fn with_flow(&self, flow: CashFlow) -> Self {
        let mut flows = self.flows.clone();
        flows.push(flow);
        Self { flows }
    }

    pub fn flows(&self) -> &[CashFlow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Sum of all amounts, undiscounted
    pub fn total(&self) -> f64 {
        self.flows.iter().map(|cf| cf.amount).sum()
    }

    /// Flows ordered by ascending timestamp (stable for equal timestamps)
    pub fn sorted(&self) -> Vec<CashFlow> {
        let mut sorted = self.flows.clone();
        sorted.sort_by_key(|cf| cf.timestamp);
        sorted
    }

    /// Convert to year offsets from the earliest flow
    ///
    /// Fails with [`IrrError::InsufficientData`] for fewer than two flows and
    /// [`IrrError::ZeroTimeSpan`] when every flow shares one instant.
    pub fn normalize(&self) -> Result<Vec<NormalizedFlow>, IrrError> {
        if self.flows.len() < 2 {
            return Err(IrrError::InsufficientData { count: self.flows.len() });
        }

        let sorted = self.sorted();
        let first = sorted[0].timestamp;
        let last = sorted[sorted.len() - 1].timestamp;
        if first == last {
            return Err(IrrError::ZeroTimeSpan);
        }

        Ok(sorted
            .iter()
            .map(|cf| {
                let elapsed = (cf.timestamp - first).num_milliseconds() as f64;
                NormalizedFlow::new(elapsed / MILLIS_PER_YEAR, cf.amount)
            })
            .collect())
    }
}

impl FromIterator<CashFlow> for CashFlowSet {
    fn from_iter<I: IntoIterator<Item = CashFlow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
