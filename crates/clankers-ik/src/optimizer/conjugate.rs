//! Conjugate gradient with an exact quadratic line search along each
//! direction, using the Hessian for both the conjugacy coefficient and the
//! step length.

use nalgebra::{DVector, Vector3};
use tracing::trace;

use super::{IterationConfig, Minimum, Optimizer};
use crate::error::IkError;
use crate::objective::Objective;

/// Conjugate gradient on the squared-distance objective. Stops once
/// `|δ| < tolerance`; zero curvature along a direction is an error.
#[derive(Debug, Clone, Default)]
pub struct ConjugateGradient {
    config: IterationConfig,
}

impl ConjugateGradient {
    pub const fn new(config: IterationConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &IterationConfig {
        &self.config
    }
}

/// `mᵀ H m`, rejected when it cannot be divided by.
fn curvature(m: &DVector<f64>, hm: &DVector<f64>) -> Result<f64, IkError> {
    let c = m.dot(hm);
    if c == 0.0 || !c.is_finite() {
        return Err(IkError::SingularSystem(
            "zero curvature along conjugate direction",
        ));
    }
    Ok(c)
}

impl Optimizer for ConjugateGradient {
    fn name(&self) -> &'static str {
        "conjugate_gradient"
    }

    fn minimize(
        &self,
        objective: &Objective<'_>,
        initial: &DVector<f64>,
        target: &Vector3<f64>,
    ) -> Result<Minimum, IkError> {
        let mut x = initial.clone();
        let mut m = DVector::zeros(x.len());
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            let (f, g, h) = objective.derivatives(x.as_slice(), target)?;
            if g.iter().all(|v| *v == 0.0) {
                return Ok(Minimum {
                    angles: x,
                    iterations: iterations + 1,
                    converged: true,
                });
            }

            if iterations == 0 {
                m.copy_from(&g);
            } else {
                let hm = &h * &m;
                let beta = -hm.dot(&g) / curvature(&m, &hm)?;
                m = &g + &m * beta;
            }
            iterations += 1;

            let hm = &h * &m;
            let t = -m.dot(&g) / curvature(&m, &hm)?;
            let delta = &m * t;
            x += &delta;

            let step = delta.norm();
            trace!(iteration = iterations, objective = f, step, "conjugate gradient step");
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
