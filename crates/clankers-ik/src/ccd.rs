//! Cyclic coordinate descent.
//!
//! Each outer iteration walks the joints from the tip toward the base and
//! turns every joint so that the tip, seen from the joint and projected onto
//! the joint's rotation plane, points at the equally projected target. No
//! derivatives are needed.
//!
//! The outer loop stops once an iteration improves the tip distance by less
//! than the tolerance. This is an improvement test, not an absolute distance
//! test: a stalled solve far from the target also terminates.

use nalgebra::{DVector, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::component::Joint;
use crate::error::{ConfigError, IkError};
use crate::forward::ForwardSolver;
use crate::optimizer::IterationConfig;
use crate::solver::{IkSolver, Solution};

/// Projected vectors shorter than this are treated as lying on the axis.
const DEGENERATE_LENGTH: f64 = 1e-12;

/// CCD settings. `tolerance` bounds the per-sweep improvement in tip
/// distance, not the distance itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CcdConfig {
    #[serde(flatten)]
    pub iteration: IterationConfig,
}

impl CcdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.iteration.validate()
    }
}

/// Derivative-free IK that turns one joint at a time, tip to base.
#[derive(Debug, Clone, Default)]
pub struct CcdSolver {
    config: CcdConfig,
}

/// Project `p` onto the plane through `origin` perpendicular to unit `axis`.
pub fn project_on_rotation_plane(
    p: &Vector3<f64>,
    origin: &Vector3<f64>,
    axis: &Vector3<f64>,
) -> Vector3<f64> {
    p - axis * (p - origin).dot(axis)
}

impl CcdSolver {
    pub const fn new(config: CcdConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &CcdConfig {
        &self.config
    }

    /// Signed angle turning the tip toward the target about one joint, or
    /// `None` when either projection collapses onto the axis.
    fn joint_correction(
        origin: &Vector3<f64>,
        axis: &Vector3<f64>,
        tip: &Vector3<f64>,
        target: &Vector3<f64>,
    ) -> Option<f64> {
        let ve = (project_on_rotation_plane(tip, origin, axis) - origin)
            .try_normalize(DEGENERATE_LENGTH)?;
        let vt = (project_on_rotation_plane(target, origin, axis) - origin)
            .try_normalize(DEGENERATE_LENGTH)?;
        let angle = ve.dot(&vt).clamp(-1.0, 1.0).acos();
        if axis.dot(&ve.cross(&vt)) > 0.0 {
            Some(angle)
        } else {
            Some(-angle)
        }
    }
}

impl IkSolver for CcdSolver {
    fn name(&self) -> &'static str {
        "ccd"
    }

    fn solve_detailed(
        &self,
        fk: &ForwardSolver,
        initial: &[f64],
        target: &Vector3<f64>,
    ) -> Result<Solution, IkError> {
        fk.chain().check_dimension(initial.len())?;
        let IterationConfig {
            tolerance,
            max_iterations,
        } = self.config.iteration;
        let joints: Vec<&Joint> = fk.chain().joints().collect();
        let mut angles = initial.to_vec();
        let mut previous = f64::MAX;
        let mut distance = (target - fk.solve(&angles)?).norm();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < max_iterations {
            iterations += 1;
            for k in (0..joints.len()).rev() {
                let frames = fk.joint_frames(&angles)?;
                let Some(correction) =
                    Self::joint_correction(&frames.origins[k], &frames.axes[k], &frames.tip, target)
                else {
                    warn!(joint = k, "tip or target lies on the joint axis; skipping update");
                    continue;
                };
                angles[k] = joints[k].clamp(angles[k] + correction);
            }

            distance = (target - fk.solve(&angles)?).norm();
            trace!(iteration = iterations, distance, "ccd sweep");
            if previous - distance < tolerance {
                converged = true;
                break;
            }
            previous = distance;
        }

        debug!(
            strategy = "ccd",
            iterations,
            converged,
            distance,
            "ik solve finished"
        );

        Ok(Solution {
            angles: DVector::from_vec(angles),
            iterations,
            converged,
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
    use crate::token::Token;

    fn planar_arm() -> ForwardSolver {
        ForwardSolver::new(KinematicChain::parse("z 1 y 1").unwrap())
    }

    #[test]
    fn projection_removes_axial_component() {
        let p = project_on_rotation_plane(
            &Vector3::new(1.0, 2.0, 3.0),
            &Vector3::new(0.0, 0.0, 1.0),
            &Vector3::z(),
        );
        assert_relative_eq!(p, Vector3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn correction_sign_follows_axis() {
        let origin = Vector3::zeros();
        let tip = Vector3::new(1.0, 0.0, 0.0);
        let target = Vector3::new(0.0, 1.0, 0.0);
        let up = CcdSolver::joint_correction(&origin, &Vector3::z(), &tip, &target).unwrap();
        let down = CcdSolver::joint_correction(&origin, &-Vector3::z(), &tip, &target).unwrap();
        assert_relative_eq!(up, std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(down, -std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn straightens_planar_arm() {
        let fk = planar_arm();
        let solution = CcdSolver::default()
            .solve_detailed(&fk, &[FRAC_PI_6, FRAC_PI_6], &Vector3::new(2.0, 0.0, 0.0))
            .unwrap();
        assert!(solution.converged);
        assert_relative_eq!(solution.angles, DVector::zeros(2), epsilon = 1e-5);
    }

    #[test]
    fn reaches_bent_target() {
        let fk = planar_arm();
        let target = fk.solve(&[FRAC_PI_6, FRAC_PI_6]).unwrap();
        let solution = CcdSolver::default()
            .solve_detailed(&fk, &[0.0, 0.0], &target)
            .unwrap();
        assert!(solution.distance < 1e-3, "distance {}", solution.distance);
        assert_relative_eq!(
            solution.angles,
            DVector::from_vec(vec![FRAC_PI_6, FRAC_PI_6]),
            epsilon = 1e-1
        );
    }

    #[test]
    fn target_on_axis_skips_joint() {
        let fk = ForwardSolver::new(KinematicChain::parse("z 1").unwrap());
        let solution = CcdSolver::default()
            .solve_detailed(&fk, &[0.4], &Vector3::new(0.0, 0.0, 1.0))
            .unwrap();
        assert_relative_eq!(solution.angles[0], 0.4);
        assert!(solution.iterations <= 2);
    }

    #[test]
    fn restricted_joints_stay_in_range() {
        let chain = KinematicChain::from_tokens([
            Token::restricted("z", -0.1, 0.1).unwrap(),
            Token::from(1.0),
            Token::axis("y").unwrap(),
            Token::from(1.0),
        ])
        .unwrap();
        let fk = ForwardSolver::new(chain);
        let target = Vector3::new(1.0, 1.0, -0.5);
        let solution = CcdSolver::default()
            .solve_detailed(&fk, &[0.0, 0.0], &target)
            .unwrap();
        assert!((-0.1..=0.1).contains(&solution.angles[0]));
        assert!(solution.angles.iter().all(|a| a.is_finite()));
    }

    #[test]
    fn unreachable_target_stays_finite() {
        let fk = planar_arm();
        let solution = CcdSolver::default()
            .solve_detailed(&fk, &[0.3, -0.2], &Vector3::new(4.0, 0.0, 0.0))
            .unwrap();
        assert!(solution.angles.iter().all(|a| a.is_finite()));
        assert!(solution.iterations <= 50);
        assert_relative_eq!(solution.distance, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn iteration_cap_is_respected() {
        let fk = planar_arm();
        let solver = CcdSolver::new(CcdConfig {
            iteration: IterationConfig::new(1e-300, 2),
        });
        let solution = solver
            .solve_detailed(&fk, &[0.0, 0.0], &Vector3::new(1.0, 1.0, -0.5))
            .unwrap();
        assert!(solution.iterations <= 2);
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        assert!(matches!(
            CcdSolver::default().solve(&planar_arm(), &[0.0; 3], &Vector3::zeros()),
            Err(IkError::Dimension { .. })
        ));
    }
}
