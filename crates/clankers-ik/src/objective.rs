//! The squared-distance objective minimized by every optimization-based IK
//! strategy, with analytic first and second derivatives.
//!
//! For tip position `p(q)` and target `t`, with joint `k` having world axis
//! `a_k` and world origin `o_k`:
//!
//! ```text
//! f(q)        = |t - p(q)|²
//! ∂p/∂q_k     = a_k × (p - o_k)
//! ∂²p/∂q_i∂q_j = a_i × (a_j × (p - o_j))     for i proximal to (or equal) j
//! ∇f          = -2 Jᵀ r                       r = t - p
//! ∇²f         = 2 JᵀJ - 2 Σ_c r_c ∇²p_c
//! ```

use nalgebra::{DMatrix, DVector, Matrix3xX, Vector3};

use crate::error::IkError;
use crate::forward::{ForwardSolver, JointFrames};

/// `distance_squared(angles, target)` over a fixed chain.
#[derive(Debug, Clone, Copy)]
pub struct Objective<'a> {
    fk: &'a ForwardSolver,
}

impl<'a> Objective<'a> {
    pub const fn new(fk: &'a ForwardSolver) -> Self {
        Self { fk }
    }

    pub const fn forward(&self) -> &'a ForwardSolver {
        self.fk
    }

    pub fn dof(&self) -> usize {
        self.fk.dof()
    }

    /// Squared distance between the tip at `angles` and `target`.
    pub fn value(&self, angles: &[f64], target: &Vector3<f64>) -> Result<f64, IkError> {
        Ok((target - self.fk.solve(angles)?).norm_squared())
    }

    /// Objective value and gradient in one pass.
    pub fn value_and_gradient(
        &self,
        angles: &[f64],
        target: &Vector3<f64>,
    ) -> Result<(f64, DVector<f64>), IkError> {
        let frames = self.fk.joint_frames(angles)?;
        let r = target - frames.tip;
        let jacobian = jacobian(&frames);
        Ok((r.norm_squared(), jacobian.tr_mul(&r) * -2.0))
    }

    /// `∂f/∂q`, one entry per joint.
    pub fn gradient(&self, angles: &[f64], target: &Vector3<f64>) -> Result<DVector<f64>, IkError> {
        self.value_and_gradient(angles, target).map(|(_, g)| g)
    }

    /// Exact second derivatives, including the residual term.
    pub fn hessian(&self, angles: &[f64], target: &Vector3<f64>) -> Result<DMatrix<f64>, IkError> {
        self.derivatives(angles, target).map(|(_, _, h)| h)
    }

    /// Value, gradient and Hessian from a single forward pass.
    pub fn derivatives(
        &self,
        angles: &[f64],
        target: &Vector3<f64>,
    ) -> Result<(f64, DVector<f64>, DMatrix<f64>), IkError> {
        let frames = self.fk.joint_frames(angles)?;
        let n = frames.axes.len();
        let r = target - frames.tip;
        let jacobian = jacobian(&frames);

        let mut hessian = jacobian.tr_mul(&jacobian) * 2.0;
        for j in 0..n {
            let lever = frames.axes[j].cross(&(frames.tip - frames.origins[j]));
            for i in 0..=j {
                let second = frames.axes[i].cross(&lever);
                let h = -2.0 * r.dot(&second);
                hessian[(i, j)] += h;
                if i != j {
                    hessian[(j, i)] += h;
                }
            }
        }

        Ok((r.norm_squared(), jacobian.tr_mul(&r) * -2.0, hessian))
    }

    /// Euclidean distance `|t - p(q)|`.
    pub fn distance(&self, angles: &[f64], target: &Vector3<f64>) -> Result<f64, IkError> {
        self.value(angles, target).map(f64::sqrt)
    }
}

/// Positional Jacobian `∂p/∂q`, one column per joint.
pub fn jacobian(frames: &JointFrames) -> Matrix3xX<f64> {
    Matrix3xX::from_iterator(
        frames.axes.len(),
        frames
            .axes
            .iter()
            .zip(&frames.origins)
            .flat_map(|(a, o)| {
                let c = a.cross(&(frames.tip - o));
                [c.x, c.y, c.z]
            }),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
