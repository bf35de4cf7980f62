//! Inverse kinematics across every strategy.

use std::f64::consts::FRAC_PI_6;

use approx::assert_relative_eq;
use clankers_ik::{
    CcdSolver, ForwardSolver, IkSolver, IterationConfig, Method, Minimizer, MinimizerConfig,
    OptimizationSolver, SteepestDescent, SteepestDescentConfig,
};
use clankers_test_utils::chains::reach;
use clankers_test_utils::{
    init_tracing, planar_arm, planar_tip_at_sixth_pi, random_angles, seeded_rng, spatial_arm,
};
use nalgebra::{DVector, Vector3};
use rand::Rng;

fn optimization_strategies() -> Vec<Box<dyn IkSolver>> {
    vec![
        Box::new(OptimizationSolver::newton()),
        Box::new(OptimizationSolver::new(SteepestDescent::new(
            SteepestDescentConfig {
                iteration: IterationConfig::new(1.48e-8, 100),
                alpha: 0.1,
            },
        ))),
        Box::new(OptimizationSolver::conjugate_gradient()),
        Box::new(OptimizationSolver::minimizer()),
        Box::new(OptimizationSolver::new(Minimizer::new(MinimizerConfig {
            method: Method::Bfgs,
            ..MinimizerConfig::default()
        }))),
    ]
}

fn all_strategies() -> Vec<Box<dyn IkSolver>> {
    let mut strategies = optimization_strategies();
    strategies.push(Box::new(CcdSolver::default()));
    strategies
}

fn sixth_pi(sign: f64) -> DVector<f64> {
    DVector::from_element(2, sign * FRAC_PI_6)
}

#[test]
fn every_strategy_solves_planar_scenarios() {
    init_tracing();
    let fk = planar_arm();
    let e = planar_tip_at_sixth_pi();

    for solver in all_strategies() {
        let name = solver.name();
        let q = solver
            .solve(&fk, &[FRAC_PI_6, FRAC_PI_6], &Vector3::new(2.0, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(q, DVector::zeros(2), epsilon = 1e-5);

        let q = solver.solve(&fk, &[0.0, 0.0], &e).unwrap();
        assert_relative_eq!(q, sixth_pi(1.0), epsilon = 1e-5);

        let q = solver
            .solve(&fk, &[0.0, 0.0], &Vector3::new(e.x, -e.y, e.z))
            .unwrap();
        assert_relative_eq!(q, sixth_pi(-1.0), epsilon = 1e-5);

        let tip = fk.solve(q.as_slice()).unwrap();
        assert!((tip - Vector3::new(e.x, -e.y, e.z)).norm() < 1e-5, "{name}");
    }
}

#[test]
fn smoothing_keeps_rough_agreement() {
    let fk = planar_arm();
    let e = planar_tip_at_sixth_pi();
    let smooth = OptimizationSolver::new(Minimizer::smooth());

    let q = smooth
        .solve(&fk, &[FRAC_PI_6, FRAC_PI_6], &Vector3::new(2.0, 0.0, 0.0))
        .unwrap();
    assert_relative_eq!(q, DVector::zeros(2), epsilon = 0.1);

    let q = smooth.solve(&fk, &[0.0, 0.0], &e).unwrap();
    assert_relative_eq!(q, sixth_pi(1.0), epsilon = 0.1);

    let q = smooth
        .solve(&fk, &[0.0, 0.0], &Vector3::new(e.x, -e.y, e.z))
        .unwrap();
    assert_relative_eq!(q, sixth_pi(-1.0), epsilon = 0.1);
}

#[test]
fn ccd_agrees_with_optimizers() {
    let fk = planar_arm();
    let targets = [
        Vector3::new(2.0, 0.0, 0.0),
        planar_tip_at_sixth_pi(),
        fk.solve(&[-0.4, 0.7]).unwrap(),
    ];
    let ccd = CcdSolver::default();
    for target in &targets {
        let reference = ccd.solve(&fk, &[0.1, 0.1], target).unwrap();
        for solver in optimization_strategies() {
            let q = solver.solve(&fk, &[0.1, 0.1], target).unwrap();
            assert_relative_eq!(q, reference, epsilon = 1e-1);
        }
    }
}

#[test]
fn unreachable_targets_terminate_finite() {
    let fk = planar_arm();
    let far = reach(&fk) * 2.0;
    let targets = [
        Vector3::new(far, 0.0, 0.0),
        Vector3::new(0.0, far, far),
        Vector3::new(-far, 0.5, -1.0),
    ];
    for solver in all_strategies() {
        for target in &targets {
            let solution = solver
                .solve_detailed(&fk, &[0.3, 0.3], target)
                .unwrap_or_else(|e| panic!("{} failed on {target:?}: {e}", solver.name()));
            assert!(
                solution.angles.iter().all(|a| a.is_finite()),
                "{} diverged",
                solver.name()
            );
            assert!(solution.iterations <= 100);
            assert!(solution.distance >= far - reach(&fk) - 1e-9);
        }
    }
}

#[test]
fn random_round_trips_on_spatial_arm() {
    let fk = spatial_arm();
    let mut rng = seeded_rng(2024);
    let solvers: Vec<(Box<dyn IkSolver>, f64)> = vec![
        (Box::new(OptimizationSolver::newton()), 1e-6),
        (
            Box::new(OptimizationSolver::new(SteepestDescent::new(
                SteepestDescentConfig {
                    iteration: IterationConfig::new(1.48e-8, 500),
                    alpha: 0.1,
                },
            ))),
            1e-4,
        ),
        (Box::new(OptimizationSolver::minimizer()), 1e-6),
        (
            Box::new(OptimizationSolver::new(Minimizer::new(MinimizerConfig {
                method: Method::Bfgs,
                ..MinimizerConfig::default()
            }))),
            1e-6,
        ),
        (Box::new(OptimizationSolver::conjugate_gradient()), 1e-3),
        (Box::new(CcdSolver::default()), 1e-1),
    ];

    for _ in 0..25 {
        // Keep away from the straight-arm singularities.
        let truth: Vec<f64> = random_angles(&mut rng, 3, 0.45)
            .into_iter()
            .map(|a| a.signum() * (a.abs() + 0.75))
            .collect();
        let target = fk.solve(&truth).unwrap();
        let seed: Vec<f64> = truth
            .iter()
            .map(|a| a + rng.gen_range(-0.05..0.05))
            .collect();

        for (solver, tolerance) in &solvers {
            let solution = solver.solve_detailed(&fk, &seed, &target).unwrap();
            assert!(
                solution.distance < *tolerance,
                "{}: distance {} for target {target:?}",
                solver.name(),
                solution.distance
            );
        }
    }
}

#[test]
fn solves_are_pure() {
    let fk: ForwardSolver = planar_arm();
    let target = Vector3::new(1.2, 0.4, -0.9);
    for solver in all_strategies() {
        let first = solver.solve(&fk, &[0.2, 0.2], &target);
        let second = solver.solve(&fk, &[0.2, 0.2], &target);
        match (first, second) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(_), Err(_)) => {}
            _ => panic!("{} is not deterministic", solver.name()),
        }
    }
}
