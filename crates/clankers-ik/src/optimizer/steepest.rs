//! Fixed-step gradient descent.

use nalgebra::{DVector, Vector3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{IterationConfig, Minimum, Optimizer};
use crate::error::{ConfigError, IkError};
use crate::objective::Objective;

const fn default_alpha() -> f64 {
    1.0
}

/// Termination settings plus the fixed step size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteepestDescentConfig {
    #[serde(flatten)]
    pub iteration: IterationConfig,
    /// Step size applied to the raw gradient.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for SteepestDescentConfig {
    fn default() -> Self {
        Self {
            iteration: IterationConfig::default(),
            alpha: default_alpha(),
        }
    }
}

impl SteepestDescentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.iteration.validate()?;
        if self.alpha <= 0.0 || !self.alpha.is_finite() {
            return Err(ConfigError::invalid(
                "alpha",
                format!("must be positive and finite, got {}", self.alpha),
            ));
        }
        Ok(())
    }
}

/// `x -= α ∇f(x)` until the step is shorter than the tolerance.
///
/// Sensitive to `alpha`: too large overshoots, too small needs many
/// iterations. No line search is performed.
#[derive(Debug, Clone, Default)]
pub struct SteepestDescent {
    config: SteepestDescentConfig,
}

impl SteepestDescent {
    pub const fn new(config: SteepestDescentConfig) -> Self {
        Self { config }
    }

    /// Default termination settings with the given step size.
    pub fn with_alpha(alpha: f64) -> Self {
        Self::new(SteepestDescentConfig {
            alpha,
            ..SteepestDescentConfig::default()
        })
    }

    pub const fn config(&self) -> &SteepestDescentConfig {
        &self.config
    }
}

impl Optimizer for SteepestDescent {
    fn name(&self) -> &'static str {
        "steepest_descent"
    }

    fn minimize(
        &self,
        objective: &Objective<'_>,
        initial: &DVector<f64>,
        target: &Vector3<f64>,
    ) -> Result<Minimum, IkError> {
        let IterationConfig {
            tolerance,
            max_iterations,
        } = self.config.iteration;
        let mut x = initial.clone();
        let mut iterations = 0;

        while iterations < max_iterations {
            iterations += 1;
            let (f, g) = objective.value_and_gradient(x.as_slice(), target)?;
            let delta = g * self.config.alpha;
            x -= &delta;

            let step = delta.norm();
            trace!(iteration = iterations, objective = f, step, "steepest descent step");
            if step < tolerance {
                return Ok(Minimum {
                    angles: x,
                    iterations,
                    converged: true,
                });
            }
        }

        Ok(Minimum {
            angles: x,
            iterations,
            converged: false,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
