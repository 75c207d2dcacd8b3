//! Bisection fallback for the XIRR solver

use super::config::{BracketPolicy, SolverConfig};
use super::error::{IrrError, IrrResult};
use super::npv::npv;
use crate::cashflow::NormalizedFlow;
use log::{debug, trace};

/// Derivative-free search over the fixed bracket `[rate_floor, rate_ceiling]`
///
/// Stops at the first midpoint where |NPV| or the half-width falls under
/// `bisection_tolerance`.
pub struct BisectionFallback<'a> {
    config: &'a SolverConfig,
}

impl<'a> BisectionFallback<'a> {
    pub fn new(config: &'a SolverConfig) -> Self {
        Self { config }
    }

    pub fn solve(&self, flows: &[NormalizedFlow]) -> IrrResult<f64> {
        let cfg = self.config;
        let tolerance = cfg.bisection_tolerance;
        let mut low = cfg.rate_floor;
        let mut high = cfg.rate_ceiling;

        if cfg.bracket_policy == BracketPolicy::RequireSignChange {
            let npv_low = npv(flows, low);
            let npv_high = npv(flows, high);
            if npv_low * npv_high > 0.0 {
                debug!("bisection: no sign change, NPV({}) = {:.3e}, NPV({}) = {:.3e}", low, npv_low, high, npv_high);
                return Err(IrrError::NoSignChange { low, high, npv_low, npv_high });
            }
        }

        for i in 0..cfg.bisection_max_iterations {
            let mid = (low + high) / 2.0;
            let npv_mid = npv(flows, mid);

            if npv_mid.abs() < tolerance || (high - low) / 2.0 < tolerance {
                trace!("bisection {}: converged at {}", i, mid);
                return Ok(mid);
            }

            if npv(flows, low) * npv_mid < 0.0 {
                high = mid;
            } else {
                low = mid;
            }
        }

        Err(IrrError::FallbackExhausted {
            iterations: cfg.bisection_max_iterations,
        })
    }
}
