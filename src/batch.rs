//! Batch runner for solving many independent cash-flow sets
//!
//! Holds one validated solver configuration and fans sets out across the
//! rayon thread pool. Each set is still solved sequentially on one thread.

use crate::cashflow::CashFlowSet;
use crate::irr::{IrrResult, SolverConfig, XirrSolver};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Pre-configured XIRR runner for batches of portfolios
///
/// # Example
/// ```ignore
/// let runner = BatchSolver::new(SolverConfig::from_env())?;
/// let rates = runner.run_batch(&sets);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BatchSolver {
    solver: XirrSolver,
}

impl BatchSolver {
    pub fn new(config: SolverConfig) -> IrrResult<Self> {
        Ok(Self {
            solver: XirrSolver::new(config)?,
        })
    }

    pub fn with_solver(solver: XirrSolver) -> Self {
        Self { solver }
    }

    /// Solve a single set
    pub fn run(&self, flows: &CashFlowSet) -> Option<f64> {
        self.solver.solve(flows)
    }

    /// Solve every set in parallel; output order matches input order
    pub fn run_batch(&self, sets: &[CashFlowSet]) -> Vec<Option<f64>> {
        sets.par_iter().map(|set| self.solver.solve(set)).collect()
    }

    /// Solve named sets in parallel, keeping the names sorted
    pub fn run_named(&self, sets: &BTreeMap<String, CashFlowSet>) -> Vec<(String, Option<f64>)> {
        sets.par_iter()
            .map(|(name, set)| (name.clone(), self.solver.solve(set)))
            .collect()
    }

    /// Solve one set from several starting guesses
    ///
    /// Useful for flows with more than one sign change, where different guesses
    /// can land on different roots.
    pub fn run_guesses(&self, flows: &CashFlowSet, guesses: &[f64]) -> Vec<Option<f64>> {
        guesses
            .par_iter()
            .map(|&guess| {
                let config = self.solver.config().clone().with_initial_guess(guess);
                XirrSolver::new(config).ok().and_then(|s| s.solve(flows))
            })
            .collect()
    }

    pub fn solver(&self) -> &XirrSolver {
        &self.solver
    }
}
