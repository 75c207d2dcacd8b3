//! Portfolio IRR - XIRR engine for irregular, dated cash flows
//!
//! This library provides:
//! - Cash-flow model with time normalization (365.25-day years)
//! - Newton-Raphson rate solver with domain clamping
//! - Bisection fallback for flows where Newton diverges or stalls
//! - Transaction/holdings table loading
//! - Batch solving across many independent portfolios

pub mod cashflow;
pub mod irr;
pub mod batch;

// Re-export commonly used types
pub use cashflow::{CashFlow, CashFlowSet, NormalizedFlow};
pub use irr::{xirr, xirr_with_guess, IrrError, SolverConfig, XirrSolver};
pub use batch::BatchSolver;
