//! The [`Actuator`] facade: a chain, its current joint angles, and the IK
//! strategy used to move its end-effector.
//!
//! The actuator is the only place angle state persists between solves.
//! Reading [`Actuator::ee`] forward-solves the stored angles; writing it with
//! [`Actuator::set_ee`] runs the bound [`IkSolver`] from the stored angles and
//! stores whatever it returns, converged or not, so repeated small target
//! nudges keep refining the pose.

use nalgebra::{DVector, Matrix4, Vector3, Vector4};

use crate::chain::KinematicChain;
use crate::component::Component;
use crate::error::IkError;
use crate::forward::ForwardSolver;
use crate::solver::{IkSolver, OptimizationSolver, Solution};
use crate::token::IntoToken;

/// A kinematic chain with mutable joint angles and an IK strategy.
#[derive(Debug)]
pub struct Actuator {
    fk: ForwardSolver,
    solver: Box<dyn IkSolver>,
}

impl Actuator {
    /// Actuator over `chain` using the default generic minimizer.
    pub fn new(chain: KinematicChain) -> Self {
        Self {
            fk: ForwardSolver::new(chain),
            solver: Box::new(OptimizationSolver::default()),
        }
    }

    /// Build from chain tokens, base first.
    ///
    /// ```
    /// use clankers_ik::Actuator;
    ///
    /// let arm = Actuator::from_tokens(["z", "1", "y", "1"]).unwrap();
    /// assert_eq!(arm.dof(), 2);
    /// assert_eq!(arm.ee().x, 2.0);
    /// ```
    pub fn from_tokens<I, T>(tokens: I) -> Result<Self, IkError>
    where
        I: IntoIterator<Item = T>,
        T: IntoToken,
    {
        KinematicChain::from_tokens(tokens).map(Self::new)
    }

    /// Build from a whitespace- or comma-separated token string.
    pub fn parse(description: &str) -> Result<Self, IkError> {
        KinematicChain::parse(description).map(Self::new)
    }

    /// Replace the IK strategy.
    #[must_use]
    pub fn with_solver(mut self, solver: impl IkSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn set_solver(&mut self, solver: Box<dyn IkSolver>) {
        self.solver = solver;
    }

    pub fn solver(&self) -> &dyn IkSolver {
        self.solver.as_ref()
    }

    pub const fn forward(&self) -> &ForwardSolver {
        &self.fk
    }

    pub const fn chain(&self) -> &KinematicChain {
        self.fk.chain()
    }

    /// Components base to tip, for rebuilding per-joint geometry.
    pub fn components(&self) -> &[Component] {
        self.fk.chain().components()
    }

    pub fn dof(&self) -> usize {
        self.fk.dof()
    }

    /// Current joint angles in chain order.
    pub fn angles(&self) -> DVector<f64> {
        self.fk.chain().angles()
    }

    /// Overwrite the joint angles; restricted joints clamp.
    pub fn set_angles(&mut self, angles: &[f64]) -> Result<(), IkError> {
        self.fk.chain_mut().set_angles(angles)
    }

    /// Per-component transforms at the current angles.
    pub fn transforms(&self) -> Vec<Matrix4<f64>> {
        self.components().iter().map(|c| c.transform(None)).collect()
    }

    /// End-effector position at the current angles.
    pub fn ee(&self) -> Vector3<f64> {
        self.transforms()
            .iter()
            .rev()
            .fold(Vector4::new(0.0, 0.0, 0.0, 1.0), |acc, m| m * acc)
            .xyz()
    }

    /// Move the end-effector toward `target` and keep the result.
    pub fn set_ee(&mut self, target: &Vector3<f64>) -> Result<(), IkError> {
        self.set_ee_detailed(target).map(|_| ())
    }

    /// Like [`set_ee`](Self::set_ee), returning the solve statistics. The
    /// stored angles are the solution after joint clamping.
    pub fn set_ee_detailed(&mut self, target: &Vector3<f64>) -> Result<Solution, IkError> {
        let initial = self.angles();
        let solution = self
            .solver
            .solve_detailed(&self.fk, initial.as_slice(), target)?;
        self.set_angles(solution.angles.as_slice())?;
        Ok(solution)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
