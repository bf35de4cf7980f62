//! Optimization strategies for the squared-distance [`Objective`].
//!
//! Every strategy implements [`Optimizer`]: start from an initial parameter
//! vector, iterate until its own convergence test passes or the iteration
//! cap is hit, and return the last iterate. Running out of iterations is
//! not an error; unreachable targets still produce a closest attempt.
//!
//! | strategy                         | derivatives used  |
//! |----------------------------------|-------------------|
//! | [`Newton`]                       | gradient, Hessian |
//! | [`SteepestDescent`]              | gradient          |
//! | [`ConjugateGradient`]            | gradient, Hessian |
//! | [`Minimizer`] (BFGS / L-BFGS-B)  | gradient          |

mod conjugate;
mod minimize;
mod newton;
mod steepest;

use std::fmt;

use nalgebra::{DVector, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, IkError};
use crate::objective::Objective;

pub use conjugate::ConjugateGradient;
pub use minimize::{DEFAULT_SMOOTH_FACTOR, Method, Minimizer, MinimizerConfig, SmoothFactor};
pub use newton::Newton;
pub use steepest::{SteepestDescent, SteepestDescentConfig};

/// Default convergence tolerance shared by every strategy.
pub const DEFAULT_TOLERANCE: f64 = 1.48e-8;

/// Default iteration cap shared by every strategy.
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;

const fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

const fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

/// Termination settings common to all iterative strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationConfig {
    /// Convergence threshold; its meaning is strategy specific.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Hard cap on iterations.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl IterationConfig {
    pub const fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Reject non-positive tolerances and a zero iteration cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tolerance <= 0.0 || !self.tolerance.is_finite() {
            return Err(ConfigError::invalid(
                "tolerance",
                format!("must be positive and finite, got {}", self.tolerance),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::invalid("max_iterations", "must be at least 1"));
        }
        Ok(())
    }
}

/// Outcome of one minimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Final iterate.
    pub angles: DVector<f64>,
    /// Iterations performed.
    pub iterations: u32,
    /// Whether the strategy's convergence test passed.
    pub converged: bool,
}

/// A strategy that minimizes an [`Objective`] for a fixed target.
pub trait Optimizer: fmt::Debug + Send + Sync {
    /// Short strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Minimize `objective` over the parameter vector starting at `initial`.
    ///
    /// # Errors
    ///
    /// [`IkError::Dimension`] when `initial` does not match the chain, plus
    /// any strategy-specific failure such as [`IkError::SingularSystem`].
    fn minimize(
        &self,
        objective: &Objective<'_>,
        initial: &DVector<f64>,
        target: &Vector3<f64>,
    ) -> Result<Minimum, IkError>;
}

fn all_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
