//! Inverse kinematics strategies.
//!
//! An [`IkSolver`] maps an initial parameter vector and a target tip
//! position to a new parameter vector. Every call is a pure function of its
//! inputs and the chain topology; the stored joint angles are never read.
//!
//! Two families implement it:
//!
//! - [`OptimizationSolver`] minimizes the squared-distance
//!   [`Objective`] with any [`Optimizer`].
//! - [`CcdSolver`](crate::ccd::CcdSolver) rotates one joint at a time.

use std::fmt;

use nalgebra::{DVector, Vector3};
use tracing::debug;

use crate::error::IkError;
use crate::forward::ForwardSolver;
use crate::objective::Objective;
use crate::optimizer::{ConjugateGradient, Minimizer, Newton, Optimizer, SteepestDescent};

/// Result of an IK solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Solved joint angles, chain order.
    pub angles: DVector<f64>,
    /// Iterations used.
    pub iterations: u32,
    /// Whether the strategy's own convergence test passed.
    pub converged: bool,
    /// Tip-to-target distance at `angles`.
    pub distance: f64,
}

/// A strategy that solves for joint angles reaching a target position.
pub trait IkSolver: fmt::Debug + Send + Sync {
    /// Short strategy name used in logs.
    fn name(&self) -> &'static str;

    /// Solve starting from `initial`, reporting iteration statistics.
    ///
    /// Running out of iterations is not an error; the last iterate is
    /// returned with `converged == false`.
    ///
    /// # Errors
    ///
    /// [`IkError::Dimension`] if `initial` does not have one angle per
    /// joint, or any failure of the underlying strategy.
    fn solve_detailed(
        &self,
        fk: &ForwardSolver,
        initial: &[f64],
        target: &Vector3<f64>,
    ) -> Result<Solution, IkError>;

    /// Solve starting from `initial` and return only the angles.
    fn solve(
        &self,
        fk: &ForwardSolver,
        initial: &[f64],
        target: &Vector3<f64>,
    ) -> Result<DVector<f64>, IkError> {
        self.solve_detailed(fk, initial, target).map(|s| s.angles)
    }
}

/// IK by minimizing `|target - fk(q)|²`.
#[derive(Debug)]
pub struct OptimizationSolver {
    optimizer: Box<dyn Optimizer>,
}

impl OptimizationSolver {
    pub fn new(optimizer: impl Optimizer + 'static) -> Self {
        Self::from_boxed(Box::new(optimizer))
    }

    pub fn from_boxed(optimizer: Box<dyn Optimizer>) -> Self {
        Self { optimizer }
    }

    pub fn newton() -> Self {
        Self::new(Newton::default())
    }

    pub fn steepest_descent() -> Self {
        Self::new(SteepestDescent::default())
    }

    pub fn conjugate_gradient() -> Self {
        Self::new(ConjugateGradient::default())
    }

    /// The generic minimizer with default settings.
    pub fn minimizer() -> Self {
        Self::new(Minimizer::default())
    }

    pub fn optimizer(&self) -> &dyn Optimizer {
        self.optimizer.as_ref()
    }
}

impl Default for OptimizationSolver {
    fn default() -> Self {
        Self::minimizer()
    }
}

impl IkSolver for OptimizationSolver {
    fn name(&self) -> &'static str {
        self.optimizer.name()
    }

    fn solve_detailed(
        &self,
        fk: &ForwardSolver,
        initial: &[f64],
        target: &Vector3<f64>,
    ) -> Result<Solution, IkError> {
        fk.chain().check_dimension(initial.len())?;
        let objective = Objective::new(fk);
        let minimum = self.optimizer.minimize(
            &objective,
            &DVector::from_column_slice(initial),
            target,
        )?;
        let distance = objective.distance(minimum.angles.as_slice(), target)?;

        debug!(
            strategy = self.optimizer.name(),
            iterations = minimum.iterations,
            converged = minimum.converged,
            distance,
            "ik solve finished"
        );

        Ok(Solution {
            angles: minimum.angles,
            iterations: minimum.iterations,
            converged: minimum.converged,
            distance,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_6;

    use approx::assert_relative_eq;

    use super::*;
    use crate::chain::KinematicChain;
    use crate::optimizer::{IterationConfig, SteepestDescentConfig};

    fn planar_arm() -> ForwardSolver {
        ForwardSolver::new(KinematicChain::parse("z 1 y 1").unwrap())
    }

    fn strategies() -> Vec<OptimizationSolver> {
        vec![
            OptimizationSolver::newton(),
            OptimizationSolver::new(SteepestDescent::new(SteepestDescentConfig {
                iteration: IterationConfig::new(1.48e-8, 100),
                alpha: 0.1,
            })),
            OptimizationSolver::conjugate_gradient(),
            OptimizationSolver::minimizer(),
        ]
    }

    #[test]
    fn every_strategy_straightens_the_arm() {
        let fk = planar_arm();
        for solver in strategies() {
            let solution = solver
                .solve_detailed(&fk, &[FRAC_PI_6, FRAC_PI_6], &Vector3::new(2.0, 0.0, 0.0))
                .unwrap();
            assert_relative_eq!(solution.angles, DVector::zeros(2), epsilon = 1e-5);
            assert!(solution.distance < 1e-5, "{}: {}", solver.name(), solution.distance);
        }
    }

    #[test]
    fn solve_returns_detailed_angles() {
        let fk = planar_arm();
        let solver = OptimizationSolver::default();
        let target = Vector3::new(1.5, 0.5, 0.2);
        let detailed = solver.solve_detailed(&fk, &[0.1, 0.1], &target).unwrap();
        let plain = solver.solve(&fk, &[0.1, 0.1], &target).unwrap();
        assert_eq!(detailed.angles, plain);
    }

    #[test]
    fn distance_matches_forward_solve() {
        let fk = planar_arm();
        let target = Vector3::new(4.0, 0.0, 0.0);
        let solution = OptimizationSolver::default()
            .solve_detailed(&fk, &[0.3, 0.3], &target)
            .unwrap();
        let tip = fk.solve(solution.angles.as_slice()).unwrap();
        assert_relative_eq!(solution.distance, (target - tip).norm(), epsilon = 1e-12);
        assert!(solution.distance >= 2.0 - 1e-9);
    }

    #[test]
    fn dimension_checked_before_solving() {
        let fk = planar_arm();
        for solver in strategies() {
            assert!(matches!(
                solver.solve(&fk, &[0.0], &Vector3::zeros()),
                Err(IkError::Dimension {
                    expected: 2,
                    got: 1
                })
            ));
        }
    }

    #[test]
    fn default_is_the_generic_minimizer() {
        assert_eq!(OptimizationSolver::default().name(), "l-bfgs-b");
        assert_eq!(OptimizationSolver::newton().name(), "newton");
    }
}
