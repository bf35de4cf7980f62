//! Forward kinematics properties over generated chains.

use std::f64::consts::FRAC_PI_6;

use approx::assert_relative_eq;
use clankers_ik::{ForwardSolver, IkError, KinematicChain, Token};
use clankers_test_utils::{planar_arm, planar_tip_at_sixth_pi, random_angles, seeded_rng};
use nalgebra::{Vector3, Vector4};
use rand::Rng;

const AXES: [&str; 6] = ["x", "y", "z", "-x", "-y", "-z"];

/// Random alternating chain plus the sum of its link offsets.
fn random_chain(rng: &mut impl Rng, joints: usize) -> (KinematicChain, Vector3<f64>) {
    let mut tokens = Vec::new();
    let mut sum = Vector3::zeros();
    for _ in 0..joints {
        tokens.push(Token::axis(AXES[rng.gen_range(0..AXES.len())]).unwrap());
        let offset = [
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        ];
        sum += Vector3::from(offset);
        tokens.push(Token::from(offset));
    }
    (KinematicChain::from_tokens(tokens).unwrap(), sum)
}

#[test]
fn zero_angles_sum_link_offsets() {
    let mut rng = seeded_rng(11);
    for joints in 1..=6 {
        let (chain, sum) = random_chain(&mut rng, joints);
        let fk = ForwardSolver::new(chain);
        let tip = fk.solve(&vec![0.0; joints]).unwrap();
        assert_relative_eq!(tip, sum, epsilon = 1e-12);
    }
}

#[test]
fn planar_arm_scenarios() {
    let fk = planar_arm();
    assert_relative_eq!(fk.solve(&[0.0, 0.0]).unwrap(), Vector3::new(2.0, 0.0, 0.0));

    let e = planar_tip_at_sixth_pi();
    assert_relative_eq!(fk.solve(&[FRAC_PI_6, FRAC_PI_6]).unwrap(), e, epsilon = 1e-5);
    assert_relative_eq!(
        fk.solve(&[-FRAC_PI_6, -FRAC_PI_6]).unwrap(),
        Vector3::new(e.x, -e.y, -e.z),
        epsilon = 1e-5
    );
}

#[test]
fn rotations_preserve_link_lengths() {
    let mut rng = seeded_rng(23);
    let fk = ForwardSolver::new(KinematicChain::parse("z 1.5 y 1").unwrap());
    for _ in 0..20 {
        let q = random_angles(&mut rng, 2, std::f64::consts::PI);
        let elbow = fk.solve_to(&q, 2).unwrap();
        let tip = fk.solve(&q).unwrap();
        assert_relative_eq!(elbow.norm(), 1.5, epsilon = 1e-12);
        assert_relative_eq!((tip - elbow).norm(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn transforms_compose_to_tip() {
    let mut rng = seeded_rng(5);
    let (chain, _) = random_chain(&mut rng, 4);
    let fk = ForwardSolver::new(chain);
    let q = random_angles(&mut rng, 4, 2.0);
    let composed = fk
        .transforms(&q)
        .unwrap()
        .iter()
        .fold(nalgebra::Matrix4::identity(), |acc, m| acc * m);
    let tip = composed * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert_relative_eq!(tip.xyz(), fk.solve(&q).unwrap(), epsilon = 1e-12);
}

#[test]
fn dimension_errors_are_reported() {
    let fk = planar_arm();
    for bad in [&[][..], &[0.0][..], &[0.0, 0.0, 0.0][..]] {
        assert!(matches!(
            fk.solve(bad),
            Err(IkError::Dimension { expected: 2, .. })
        ));
    }
}
