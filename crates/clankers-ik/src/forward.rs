//! Forward kinematics: joint angles to tip (or intermediate frame) position.

use nalgebra::{Matrix4, Vector3, Vector4};

use crate::chain::KinematicChain;
use crate::error::IkError;

/// World-frame data of every joint at one configuration.
///
/// Joint origins and axes are recorded before the joint's own rotation is
/// applied; the rotation leaves both unchanged.
#[derive(Debug, Clone)]
pub struct JointFrames {
    /// Joint origins in the base frame, chain order.
    pub origins: Vec<Vector3<f64>>,
    /// Unit joint axes in the base frame, chain order.
    pub axes: Vec<Vector3<f64>>,
    /// Tip position in the base frame.
    pub tip: Vector3<f64>,
}

/// Forward kinematics solver bound to a chain.
///
/// Every solve is a pure function of the chain topology and the supplied
/// parameter vector; the chain's stored angles are never consulted.
#[derive(Debug, Clone)]
pub struct ForwardSolver {
    chain: KinematicChain,
}

impl ForwardSolver {
    /// Solver over `chain`. Only its topology is used.
    pub const fn new(chain: KinematicChain) -> Self {
        Self { chain }
    }

    /// The chain being solved.
    pub const fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    pub(crate) fn chain_mut(&mut self) -> &mut KinematicChain {
        &mut self.chain
    }

    /// Number of joint angles every call expects.
    pub fn dof(&self) -> usize {
        self.chain.dof()
    }

    /// One homogeneous transform per component. Joints consume the next
    /// angle in chain order; links ignore it.
    pub fn transforms(&self, angles: &[f64]) -> Result<Vec<Matrix4<f64>>, IkError> {
        self.chain.check_dimension(angles.len())?;
        let mut params = angles.iter().copied();
        Ok(self
            .chain
            .components()
            .iter()
            .map(|c| {
                let param = if c.is_rotational() { params.next() } else { None };
                c.transform(param)
            })
            .collect())
    }

    /// Tip position for `angles`.
    pub fn solve(&self, angles: &[f64]) -> Result<Vector3<f64>, IkError> {
        self.solve_to(angles, self.chain.len() - 1)
    }

    /// Position of the frame after component `index` (inclusive).
    pub fn solve_to(&self, angles: &[f64], index: usize) -> Result<Vector3<f64>, IkError> {
        self.solve_point(angles, &Vector4::new(0.0, 0.0, 0.0, 1.0), index)
    }

    /// Map a homogeneous `point` expressed in the frame after component
    /// `index` into the base frame. A direction (w = 0) picks up rotations
    /// only.
    pub fn solve_point(
        &self,
        angles: &[f64],
        point: &Vector4<f64>,
        index: usize,
    ) -> Result<Vector3<f64>, IkError> {
        if index >= self.chain.len() {
            return Err(IkError::IndexOutOfRange {
                index,
                len: self.chain.len(),
            });
        }
        let transforms = self.transforms(angles)?;
        let p = transforms[..=index]
            .iter()
            .rev()
            .fold(*point, |acc, m| m * acc);
        Ok(p.xyz())
    }

    /// World origins and axes of every joint plus the tip position.
    pub fn joint_frames(&self, angles: &[f64]) -> Result<JointFrames, IkError> {
        self.chain.check_dimension(angles.len())?;
        let dof = self.chain.dof();
        let mut origins = Vec::with_capacity(dof);
        let mut axes = Vec::with_capacity(dof);
        let mut params = angles.iter().copied();

        let mut transform = Matrix4::identity();
        for component in self.chain.components() {
            let param = if let Some(joint) = component.as_joint() {
                origins.push(transform.fixed_view::<3, 1>(0, 3).into_owned());
                axes.push(transform.fixed_view::<3, 3>(0, 0) * joint.axis().into_inner());
                params.next()
            } else {
                None
            };
            transform *= component.transform(param);
        }

        Ok(JointFrames {
            origins,
            axes,
            tip: transform.fixed_view::<3, 1>(0, 3).into_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
