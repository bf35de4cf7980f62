//! Newton's method on the squared-distance objective.

use nalgebra::{DVector, Vector3};
use tracing::trace;

use super::{IterationConfig, Minimum, Optimizer, all_finite};
use crate::error::IkError;
use crate::objective::Objective;

/// Solves `H δ = -g` each iteration and stops once `|δ| < tolerance`.
#[derive(Debug, Clone, Default)]
pub struct Newton {
    config: IterationConfig,
}

impl Newton {
    pub const fn new(config: IterationConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &IterationConfig {
        &self.config
    }
}

impl Optimizer for Newton {
    fn name(&self) -> &'static str {
        "newton"
    }

    fn minimize(
        &self,
        objective: &Objective<'_>,
        initial: &DVector<f64>,
        target: &Vector3<f64>,
    ) -> Result<Minimum, IkError> {
        let mut x = initial.clone();
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            iterations += 1;
            let (f, g, h) = objective.derivatives(x.as_slice(), target)?;
            // Already stationary; the solve below would only reproduce δ = 0.
            if g.iter().all(|v| *v == 0.0) {
                return Ok(Minimum {
                    angles: x,
                    iterations,
                    converged: true,
                });
            }

            let delta = h
                .lu()
                .solve(&-g)
                .filter(all_finite)
                .ok_or(IkError::SingularSystem("Newton Hessian is not invertible"))?;
            x += &delta;

            let step = delta.norm();
            trace!(iteration = iterations, objective = f, step, "newton step");
            if step < self.config.tolerance {
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
