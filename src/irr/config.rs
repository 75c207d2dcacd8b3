//! Solver configuration
//!
//! All tolerances, iteration budgets and domain bounds live in [`SolverConfig`].
//! The defaults reproduce the portfolio page's IRR behaviour; tests and the
//! binaries override individual fields.

use super::error::{IrrError, IrrResult};
use std::str::FromStr;

/// Starting rate for the Newton stage (10%)
pub const DEFAULT_INITIAL_GUESS: f64 = 0.10;
pub const DEFAULT_NEWTON_MAX_ITERATIONS: usize = 100;
/// Convergence threshold on the difference between successive Newton rates
pub const DEFAULT_NEWTON_TOLERANCE: f64 = 1e-7;
/// Slopes smaller than this are treated as flat
pub const DEFAULT_DEGENERATE_SLOPE: f64 = 1e-10;
/// Rate step applied instead of a Newton update at a flat slope
pub const DEFAULT_SLOPE_NUDGE: f64 = 0.01;
/// Lower domain bound (-99%)
pub const DEFAULT_RATE_FLOOR: f64 = -0.99;
/// Upper domain bound (1000%)
pub const DEFAULT_RATE_CEILING: f64 = 10.0;
pub const DEFAULT_BISECTION_MAX_ITERATIONS: usize = 100;
/// Threshold on |NPV(mid)| and on the bracket half-width
pub const DEFAULT_BISECTION_TOLERANCE: f64 = 1e-6;

/// How the bisection stage treats a bracket whose endpoints share an NPV sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BracketPolicy {
    /// Return undefined when NPV(floor) and NPV(ceiling) have the same sign
    #[default]
    RequireSignChange,
    /// Iterate regardless; may settle on a bracket endpoint that is not a root
    Unchecked,
}

impl FromStr for BracketPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" | "require-sign-change" => Ok(BracketPolicy::RequireSignChange),
            "unchecked" | "reference" => Ok(BracketPolicy::Unchecked),
            other => Err(format!("unknown bracket policy: {}", other)),
        }
    }
}

/// Configuration for [`crate::irr::XirrSolver`]
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Newton starting rate; clamped into the domain before use
    pub initial_guess: f64,

    pub newton_max_iterations: usize,
    pub newton_tolerance: f64,
    pub degenerate_slope: f64,
    pub slope_nudge: f64,

    /// Domain bounds, shared by the Newton clamp and the bisection bracket
    pub rate_floor: f64,
    pub rate_ceiling: f64,

    pub bisection_max_iterations: usize,
    pub bisection_tolerance: f64,
    pub bracket_policy: BracketPolicy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            initial_guess: DEFAULT_INITIAL_GUESS,
            newton_max_iterations: DEFAULT_NEWTON_MAX_ITERATIONS,
            newton_tolerance: DEFAULT_NEWTON_TOLERANCE,
            degenerate_slope: DEFAULT_DEGENERATE_SLOPE,
            slope_nudge: DEFAULT_SLOPE_NUDGE,
            rate_floor: DEFAULT_RATE_FLOOR,
            rate_ceiling: DEFAULT_RATE_CEILING,
            bisection_max_iterations: DEFAULT_BISECTION_MAX_ITERATIONS,
            bisection_tolerance: DEFAULT_BISECTION_TOLERANCE,
            bracket_policy: BracketPolicy::default(),
        }
    }
}

impl SolverConfig {
    pub fn with_initial_guess(mut self, v: f64) -> Self { self.initial_guess = v; self }
    pub fn with_newton_max_iterations(mut self, v: usize) -> Self { self.newton_max_iterations = v; self }
    pub fn with_newton_tolerance(mut self, v: f64) -> Self { self.newton_tolerance = v; self }
    pub fn with_bisection_max_iterations(mut self, v: usize) -> Self { self.bisection_max_iterations = v; self }
    pub fn with_bisection_tolerance(mut self, v: f64) -> Self { self.bisection_tolerance = v; self }
    pub fn with_bracket_policy(mut self, v: BracketPolicy) -> Self { self.bracket_policy = v; self }

    pub fn with_domain(mut self, floor: f64, ceiling: f64) -> Self {
        self.rate_floor = floor;
        self.rate_ceiling = ceiling;
        self
    }

    /// Load overrides from `IRR_*` environment variables, falling back to defaults
    ///
    /// Recognised: `IRR_INITIAL_GUESS`, `IRR_NEWTON_MAX_ITERATIONS`,
    /// `IRR_NEWTON_TOLERANCE`, `IRR_BISECTION_MAX_ITERATIONS`,
    /// `IRR_BISECTION_TOLERANCE`, `IRR_BRACKET_POLICY`. Unparseable values are
    /// ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            initial_guess: lookup("IRR_INITIAL_GUESS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.initial_guess),
            newton_max_iterations: lookup("IRR_NEWTON_MAX_ITERATIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.newton_max_iterations),
            newton_tolerance: lookup("IRR_NEWTON_TOLERANCE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.newton_tolerance),
            bisection_max_iterations: lookup("IRR_BISECTION_MAX_ITERATIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.bisection_max_iterations),
            bisection_tolerance: lookup("IRR_BISECTION_TOLERANCE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.bisection_tolerance),
            bracket_policy: lookup("IRR_BRACKET_POLICY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.bracket_policy),
            ..defaults
        }
    }

    /// Check that tolerances are positive and the domain is a proper interval above -1
    pub fn validate(&self) -> IrrResult<()> {
        fn positive(field: &'static str, value: f64) -> IrrResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(IrrError::InvalidConfig { field, value })
            }
        }

        if !self.initial_guess.is_finite() {
            return Err(IrrError::InvalidConfig { field: "initial_guess", value: self.initial_guess });
        }
        positive("newton_tolerance", self.newton_tolerance)?;
        positive("bisection_tolerance", self.bisection_tolerance)?;
        if !self.degenerate_slope.is_finite() || self.degenerate_slope < 0.0 {
            return Err(IrrError::InvalidConfig { field: "degenerate_slope", value: self.degenerate_slope });
        }
        if !self.slope_nudge.is_finite() {
            return Err(IrrError::InvalidConfig { field: "slope_nudge", value: self.slope_nudge });
        }
        if !self.rate_floor.is_finite() || self.rate_floor <= -1.0 {
            return Err(IrrError::InvalidConfig { field: "rate_floor", value: self.rate_floor });
        }
        if !self.rate_ceiling.is_finite() || self.rate_ceiling <= self.rate_floor {
            return Err(IrrError::InvalidConfig { field: "rate_ceiling", value: self.rate_ceiling });
        }

        Ok(())
    }

    /// Clamp a rate into `[rate_floor, rate_ceiling]`
    pub(crate) fn clamp(&self, rate: f64) -> f64 {
        rate.max(self.rate_floor).min(self.rate_ceiling)
    }
}
