//! Canonical chains shared by the kinematics tests.

use clankers_ik::{Actuator, ForwardSolver, KinematicChain, Token};
use nalgebra::Vector3;

/// `[Joint(z), Link(1,0,0), Joint(y), Link(1,0,0)]`.
pub const PLANAR_ARM: &str = "z 1 y 1";

pub fn planar_arm() -> ForwardSolver {
    ForwardSolver::new(chain(PLANAR_ARM))
}

/// Tip of [`planar_arm`] at angles `[π/6, π/6]`.
pub fn planar_tip_at_sixth_pi() -> Vector3<f64> {
    let s3 = 3.0_f64.sqrt();
    Vector3::new((3.0 + 2.0 * s3) / 4.0, (2.0 + s3) / 4.0, -0.5)
}

/// Three joints about x, y and z with unit links; tip at `[3, 0, 0]` at rest.
pub fn spatial_arm() -> ForwardSolver {
    ForwardSolver::new(chain("x 1 y 1 z 1"))
}

/// Shoulder-elbow-wrist arm with vertical link offsets.
pub fn vertical_arm() -> Actuator {
    tokens_actuator(vec![
        axis("y"),
        Token::from([0.0, 0.0, 0.01]),
        axis("x"),
        Token::from([0.0, 0.0, 1.11]),
        axis("x"),
        Token::from([0.0, 0.0, 1.225]),
    ])
}

/// Companion to [`vertical_arm`] with three parallel x joints.
pub fn parallel_arm() -> Actuator {
    tokens_actuator(vec![
        axis("x"),
        Token::from([0.0, 0.0, 1.175]),
        axis("x"),
        Token::from([0.0, 0.0, 1.225]),
        axis("x"),
        Token::from([0.0, 0.0, 0.1]),
    ])
}

/// Sum of link lengths; no target farther than this from the base is
/// reachable.
pub fn reach(fk: &ForwardSolver) -> f64 {
    fk.chain()
        .components()
        .iter()
        .filter_map(|c| c.as_link())
        .map(|l| l.offset().norm())
        .sum()
}

fn chain(description: &str) -> KinematicChain {
    KinematicChain::parse(description).expect("fixture chain must parse")
}

fn axis(name: &str) -> Token {
    Token::axis(name).expect("fixture axis must parse")
}

fn tokens_actuator(tokens: Vec<Token>) -> Actuator {
    Actuator::from_tokens(tokens).expect("fixture chain must build")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
