//! Internal Rate of Return (XIRR) for dated cash flows
//!
//! Newton-Raphson runs first; if it does not converge within its budget the
//! same normalized flows go to a bisection search. Callers only ever see a
//! rate or `None`.

mod bisection;
mod config;
mod error;
mod newton;
mod npv;

pub use bisection::BisectionFallback;
pub use config::{
    BracketPolicy, SolverConfig, DEFAULT_BISECTION_MAX_ITERATIONS, DEFAULT_BISECTION_TOLERANCE,
    DEFAULT_INITIAL_GUESS, DEFAULT_NEWTON_MAX_ITERATIONS, DEFAULT_NEWTON_TOLERANCE,
    DEFAULT_RATE_CEILING, DEFAULT_RATE_FLOOR,
};
pub use error::{IrrError, IrrResult};
pub use newton::{NewtonOutcome, RateSolver};
pub use npv::{npv, npv_and_derivative, npv_derivative};

use crate::cashflow::CashFlowSet;
use log::debug;

/// Calculate the annualized XIRR with the default configuration
///
/// # Returns
/// * `Option<f64>` - Annual rate as a decimal (0.05 for 5%), or None when the
///   input is insufficient or neither solver stage converges
pub fn xirr(flows: &CashFlowSet) -> Option<f64> {
    XirrSolver::default().solve(flows)
}

/// Calculate the annualized XIRR starting Newton from `guess`
pub fn xirr_with_guess(flows: &CashFlowSet, guess: f64) -> Option<f64> {
    let config = SolverConfig::default().with_initial_guess(guess);
    XirrSolver::new(config).ok()?.solve(flows)
}

/// Two-stage XIRR solver holding a validated [`SolverConfig`]
#[derive(Debug, Clone, Default)]
pub struct XirrSolver {
    config: SolverConfig,
}

impl XirrSolver {
    pub fn new(config: SolverConfig) -> IrrResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve for the rate, collapsing every failure to `None`
    pub fn solve(&self, flows: &CashFlowSet) -> Option<f64> {
        match self.try_solve(flows) {
            Ok(rate) => Some(rate),
            Err(err) => {
                debug!("xirr undefined: {}", err);
                None
            }
        }
    }

    /// Solve for the rate, reporting why no rate was produced
    pub fn try_solve(&self, flows: &CashFlowSet) -> IrrResult<f64> {
        let normalized = flows.normalize()?;

        let rate = match RateSolver::new(&self.config).solve(&normalized) {
            NewtonOutcome::Converged { rate, iterations } => {
                debug!("newton converged to {} in {} iterations", rate, iterations);
                rate
            }
            NewtonOutcome::NotConverged { last_rate, iterations } => {
                debug!(
                    "newton did not converge after {} iterations (last rate {}), falling back to bisection",
                    iterations, last_rate
                );
                BisectionFallback::new(&self.config).solve(&normalized)?
            }
        };

        if rate.is_finite() {
            Ok(rate)
        } else {
            Err(IrrError::NonFiniteRate)
        }
    }
}
