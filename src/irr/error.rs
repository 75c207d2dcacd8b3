//! IRR solver error types
//!
//! None of these escape [`crate::irr::xirr`]; they collapse to `None` there.
//! [`crate::irr::XirrSolver::try_solve`] exposes them for diagnostics.

use thiserror::Error;

/// A specialized Result type for IRR calculations.
pub type IrrResult<T> = Result<T, IrrError>;

/// Reasons a rate could not be produced
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IrrError {
    /// Fewer than two cash flows
    #[error("insufficient data: need at least 2 cash flows, got {count}")]
    InsufficientData { count: usize },

    /// Every cash flow falls on the same instant
    #[error("insufficient data: all cash flows share one timestamp")]
    ZeroTimeSpan,

    /// NPV has the same sign at both ends of the bisection bracket
    #[error("no sign change on [{low}, {high}]: NPV(low) = {npv_low:.2e}, NPV(high) = {npv_high:.2e}")]
    NoSignChange {
        low: f64,
        high: f64,
        npv_low: f64,
        npv_high: f64,
    },

    /// Bisection used its whole iteration budget
    #[error("bisection did not converge after {iterations} iterations")]
    FallbackExhausted { iterations: usize },

    /// The solved rate was NaN or infinite
    #[error("solver produced a non-finite rate")]
    NonFiniteRate,

    #[error("invalid solver configuration: `{field}` = {value}")]
    InvalidConfig { field: &'static str, value: f64 },
}
