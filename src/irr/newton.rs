//! Newton-Raphson stage of the XIRR solver

use super::config::SolverConfig;
use super::npv::npv_and_derivative;
use crate::cashflow::NormalizedFlow;
use log::trace;

/// Result of the Newton stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NewtonOutcome {
    /// Successive rates differed by less than the tolerance
    Converged { rate: f64, iterations: usize },
    /// Budget exhausted or a non-finite step; the caller falls back to bisection
    NotConverged { last_rate: f64, iterations: usize },
}

impl NewtonOutcome {
    pub fn rate(&self) -> Option<f64> {
        match self {
            NewtonOutcome::Converged { rate, .. } => Some(*rate),
            NewtonOutcome::NotConverged { .. } => None,
        }
    }

    pub fn iterations(&self) -> usize {
        match self {
            NewtonOutcome::Converged { iterations, .. }
            | NewtonOutcome::NotConverged { iterations, .. } => *iterations,
        }
    }
}

/// Derivative-based rate search with domain clamping
///
/// Each working rate is held inside `[rate_floor, rate_ceiling]`. At a flat
/// slope the rate is nudged upward instead of dividing by the derivative.
pub struct RateSolver<'a> {
    config: &'a SolverConfig,
}

impl<'a> RateSolver<'a> {
    pub fn new(config: &'a SolverConfig) -> Self {
        Self { config }
    }

    pub fn solve(&self, flows: &[NormalizedFlow]) -> NewtonOutcome {
        self.solve_observed(flows, |_| {})
    }

    /// Run the Newton stage, reporting every working rate to `observer`
    ///
    /// The observer sees the clamped starting rate and each clamped iterate,
    /// but not the final converged rate.
    pub fn solve_observed<F>(&self, flows: &[NormalizedFlow], mut observer: F) -> NewtonOutcome
    where
        F: FnMut(f64),
    {
        let cfg = self.config;
        let mut rate = cfg.clamp(cfg.initial_guess);
        observer(rate);

        for i in 0..cfg.newton_max_iterations {
            let (npv, dnpv) = npv_and_derivative(flows, rate);

            if dnpv.abs() < cfg.degenerate_slope {
                rate = cfg.clamp(rate + cfg.slope_nudge);
                trace!("newton {}: flat slope {:.3e}, nudged to {}", i, dnpv, rate);
                observer(rate);
                continue;
            }

            let next = rate - npv / dnpv;
            if !next.is_finite() {
                trace!("newton {}: non-finite step at rate {}", i, rate);
                return NewtonOutcome::NotConverged { last_rate: rate, iterations: i + 1 };
            }

            if (next - rate).abs() < cfg.newton_tolerance {
                return NewtonOutcome::Converged { rate: next, iterations: i + 1 };
            }

            rate = cfg.clamp(next);
            trace!("newton {}: npv {:.6e}, rate {}", i, npv, rate);
            observer(rate);
        }

        NewtonOutcome::NotConverged {
            last_rate: rate,
            iterations: cfg.newton_max_iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irr::npv::npv;
    use approx::assert_abs_diff_eq;

    fn flows(points: &[(f64, f64)]) -> Vec<NormalizedFlow> {
        points.iter().map(|&(y, a)| NormalizedFlow::new(y, a)).collect()
    }

    #[test]
    fn test_converges_on_simple_investment() {
        let config = SolverConfig::default();
        let f = flows(&[(0.0, -1000.0), (1.0, 1100.0)]);

        let outcome = RateSolver::new(&config).solve(&f);
        let rate = outcome.rate().expect("newton should converge");
        assert_abs_diff_eq!(rate, 0.10, epsilon = 1e-7);
        assert!(outcome.iterations() <= config.newton_max_iterations);
    }

    #[test]
    fn test_converges_on_multi_period_flows() {
        let config = SolverConfig::default();
        let f = flows(&[(0.0, -5000.0), (0.5, 300.0), (1.25, 300.0), (2.0, 5200.0)]);

        let rate = RateSolver::new(&config).solve(&f).rate().unwrap();
        assert!(npv(&f, rate).abs() < 1e-5);
    }

    #[test]
    fn test_flat_slope_nudges_rate_upward() {
        let config = SolverConfig::default().with_newton_max_iterations(5);
        // Amounts so small that the derivative never clears the flat-slope threshold
        let f = flows(&[(0.0, -1e-13), (1.0, 1e-13)]);

        let mut trace = Vec::new();
        let outcome = RateSolver::new(&config).solve_observed(&f, |r| trace.push(r));

        assert!(matches!(outcome, NewtonOutcome::NotConverged { iterations: 5, .. }));
        assert_eq!(trace.len(), 6);
        for pair in trace.windows(2) {
            assert_abs_diff_eq!(pair[1] - pair[0], 0.01, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_nudge_never_exceeds_ceiling() {
        let config = SolverConfig::default().with_initial_guess(9.97);
        let f = flows(&[(0.0, 0.0), (2.0, 0.0)]);

        let mut max_seen = f64::MIN;
        let outcome = RateSolver::new(&config).solve_observed(&f, |r| max_seen = max_seen.max(r));

        assert!(outcome.rate().is_none());
        assert_eq!(max_seen, 10.0);
    }

    #[test]
    fn test_budget_exhaustion_reports_not_converged() {
        let config = SolverConfig::default()
            .with_initial_guess(9.0)
            .with_newton_max_iterations(2);
        let f = flows(&[(0.0, -1000.0), (1.0, 1100.0)]);

        let outcome = RateSolver::new(&config).solve(&f);
        assert!(matches!(outcome, NewtonOutcome::NotConverged { iterations: 2, .. }));
    }

    #[test]
    fn test_zero_budget_skips_iteration() {
        let config = SolverConfig::default().with_newton_max_iterations(0);
        let f = flows(&[(0.0, -1000.0), (1.0, 1100.0)]);

        let outcome = RateSolver::new(&config).solve(&f);
        assert_eq!(outcome, NewtonOutcome::NotConverged { last_rate: 0.10, iterations: 0 });
    }

    #[test]
    fn test_initial_guess_is_clamped() {
        let config = SolverConfig::default().with_initial_guess(-3.0);
        let f = flows(&[(0.0, -1000.0), (1.0, 1100.0)]);

        let mut first = None;
        let _ = RateSolver::new(&config).solve_observed(&f, |r| {
            first.get_or_insert(r);
        });
        assert_eq!(first, Some(-0.99));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn flow_strategy() -> impl Strategy<Value = Vec<NormalizedFlow>> {
            prop::collection::vec((0.0f64..30.0, -1e6f64..1e6), 2..10)
                .prop_map(|points| {
                    points
                        .into_iter()
                        .map(|(y, a)| NormalizedFlow::new(y, a))
                        .collect()
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            #[test]
            fn test_iterates_stay_in_domain(
                f in flow_strategy(),
                guess in -2.0f64..15.0,
            ) {
                let config = SolverConfig::default().with_initial_guess(guess);
                let mut steps = 0usize;
                let outcome = RateSolver::new(&config).solve_observed(&f, |r| {
                    steps += 1;
                    assert!(
                        (config.rate_floor..=config.rate_ceiling).contains(&r),
                        "iterate {} left the domain", r
                    );
                });

                prop_assert!(outcome.iterations() <= config.newton_max_iterations);
                prop_assert!(steps <= config.newton_max_iterations + 1);
            }
        }
    }
}
