//! General-purpose quasi-Newton minimizer with optional box bounds and a
//! smoothing term that biases solutions toward the starting pose.
//!
//! The minimized function is
//!
//! ```text
//! F(q) = |t - p(q)|² + Σ_k w_k (q_k - q0_k)²
//! ```
//!
//! where `w` comes from [`SmoothFactor`] (zero when smoothing is off). The
//! iteration itself is delegated to `argmin`: [`Method::Bfgs`] runs its
//! `BFGS` solver and [`Method::LBfgsB`] its `LBFGS` solver, both with a
//! More-Thuente line search.
//!
//! `argmin` searches an unconstrained space, so L-BFGS-B reaches its box
//! through a per-joint change of variables `q = φ(z)`:
//!
//! ```text
//! [lo, hi]   q = lo + (hi - lo)(sin z + 1)/2
//! [lo, ∞)    q = lo - 1 + √(z² + 1)
//! (-∞, hi]   q = hi + 1 - √(z² + 1)
//! ```
//!
//! Without explicit bounds the chain's joint limits form the box.

use argmin::core::{CostFunction, Executor, Gradient, State, TerminationReason, TerminationStatus};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::{BFGS, LBFGS};
use nalgebra::{DVector, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::{IterationConfig, Minimum, Optimizer};
use crate::error::{ConfigError, IkError};
use crate::objective::Objective;

/// Smoothing weight used by [`MinimizerConfig::smooth`].
pub const DEFAULT_SMOOTH_FACTOR: f64 = 0.1;

/// Correction pairs kept by L-BFGS.
const HISTORY: usize = 10;
/// How far inside a two-sided box a starting angle is kept, as a fraction
/// of the half-width, so that `φ'(z0)` is not zero.
const EDGE: f64 = 1e-6;
/// Cost changes below this many ulps of the cost scale end the run.
const COST_NOISE: f64 = 16.0;

type Line = MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64>;

/// Quasi-Newton variant used by [`Minimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Method {
    /// Dense inverse-Hessian BFGS. Unconstrained.
    #[serde(rename = "bfgs")]
    Bfgs,
    /// Limited-memory BFGS, kept inside the box by a change of variables.
    #[default]
    #[serde(rename = "lbfgsb", alias = "l-bfgs-b")]
    LBfgsB,
}

impl Method {
    /// Whether per-joint bounds are honored.
    pub const fn supports_bounds(self) -> bool {
        matches!(self, Self::LBfgsB)
    }
}

/// Weight of the `(q - q0)²` penalty: one value for every joint or one per
/// joint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SmoothFactor {
    /// Same weight on every joint.
    Uniform(f64),
    /// One weight per joint, in chain order.
    PerJoint(Vec<f64>),
}

impl SmoothFactor {
    /// Expand to one weight per joint.
    ///
    /// # Errors
    ///
    /// [`IkError::Shape`] if a per-joint vector does not have `dof` entries.
    pub fn weights(&self, dof: usize) -> Result<DVector<f64>, IkError> {
        match self {
            Self::Uniform(w) => Ok(DVector::from_element(dof, *w)),
            Self::PerJoint(w) if w.len() == dof => Ok(DVector::from_column_slice(w)),
            Self::PerJoint(w) => Err(IkError::Shape {
                what: "smooth_factor",
                expected: dof,
                got: w.len(),
            }),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ok = |w: f64| w >= 0.0 && w.is_finite();
        let valid = match self {
            Self::Uniform(w) => ok(*w),
            Self::PerJoint(ws) => ws.iter().all(|w| ok(*w)),
        };
        if valid {
            Ok(())
        } else {
            Err(ConfigError::invalid(
                "smooth_factor",
                "weights must be finite and non-negative",
            ))
        }
    }
}

impl From<f64> for SmoothFactor {
    fn from(w: f64) -> Self {
        Self::Uniform(w)
    }
}

impl From<Vec<f64>> for SmoothFactor {
    fn from(w: Vec<f64>) -> Self {
        Self::PerJoint(w)
    }
}

/// Settings for [`Minimizer`]. Every field may be omitted in TOML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MinimizerConfig {
    #[serde(flatten)]
    pub iteration: IterationConfig,
    #[serde(default)]
    pub method: Method,
    /// Per-joint `[lower, upper]`. Overrides the chain's joint limits.
    #[serde(default)]
    pub bounds: Option<Vec<[f64; 2]>>,
    /// Penalty pulling the solution toward the initial angles.
    #[serde(default)]
    pub smooth_factor: Option<SmoothFactor>,
}

impl MinimizerConfig {
    /// Default settings with [`DEFAULT_SMOOTH_FACTOR`] smoothing.
    pub fn smooth() -> Self {
        Self {
            smooth_factor: Some(SmoothFactor::Uniform(DEFAULT_SMOOTH_FACTOR)),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.iteration.validate()?;
        if let Some(bounds) = &self.bounds {
            for (i, [lower, upper]) in bounds.iter().enumerate() {
                if lower.is_nan() || upper.is_nan() || lower > upper {
                    return Err(ConfigError::invalid(
                        "bounds",
                        format!("entry {i} is not an ordered pair: [{lower}, {upper}]"),
                    ));
                }
            }
        }
        if let Some(smooth) = &self.smooth_factor {
            smooth.validate()?;
        }
        Ok(())
    }
}

/// Change of variables for one joint.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Free,
    Lower(f64),
    Upper(f64),
    Both(f64, f64),
}

impl Side {
    fn new(lower: f64, upper: f64) -> Self {
        match (lower.is_finite(), upper.is_finite()) {
            (true, true) => Self::Both(lower, upper),
            (true, false) => Self::Lower(lower),
            (false, true) => Self::Upper(upper),
            (false, false) => Self::Free,
        }
    }

    /// `(φ(z), φ'(z))`.
    fn angle(self, z: f64) -> (f64, f64) {
        match self {
            Self::Free => (z, 1.0),
            Self::Lower(lo) => {
                let r = z.hypot(1.0);
                (lo - 1.0 + r, z / r)
            }
            Self::Upper(hi) => {
                let r = z.hypot(1.0);
                (hi + 1.0 - r, -z / r)
            }
            Self::Both(lo, hi) => {
                let half = 0.5 * (hi - lo);
                let q = lo + half * (z.sin() + 1.0);
                (q.max(lo).min(hi), half * z.cos())
            }
        }
    }

    /// A `z` with `φ(z) = q`, after moving `q` into the box.
    fn parameter(self, q: f64) -> f64 {
        match self {
            Self::Free => q,
            Self::Lower(lo) => {
                let d = (q - lo).max(0.0);
                (d * (d + 2.0)).sqrt().max(EDGE)
            }
            Self::Upper(hi) => {
                let d = (hi - q).max(0.0);
                (d * (d + 2.0)).sqrt().max(EDGE)
            }
            Self::Both(lo, hi) if hi > lo => {
                let u = 2.0 * (q - lo) / (hi - lo) - 1.0;
                u.max(EDGE - 1.0).min(1.0 - EDGE).asin()
            }
            Self::Both(..) => 0.0,
        }
    }
}

fn angles(sides: &[Side], z: &[f64]) -> DVector<f64> {
    DVector::from_iterator(z.len(), sides.iter().zip(z).map(|(s, z)| s.angle(*z).0))
}

/// The smoothed objective in `z` coordinates, as `argmin` sees it.
struct Problem<'a, 'o> {
    objective: &'a Objective<'o>,
    target: &'a Vector3<f64>,
    anchor: &'a DVector<f64>,
    weights: Option<DVector<f64>>,
    sides: &'a [Side],
}

impl Problem<'_, '_> {
    fn evaluate(&self, z: &[f64]) -> Result<(f64, Vec<f64>), IkError> {
        let (q, dq): (Vec<f64>, Vec<f64>) =
            self.sides.iter().zip(z).map(|(s, z)| s.angle(*z)).unzip();
        let (mut f, mut g) = self.objective.value_and_gradient(&q, self.target)?;
        if let Some(w) = &self.weights {
            let d = DVector::from_vec(q) - self.anchor;
            f += w.dot(&d.component_mul(&d));
            g += w.component_mul(&d) * 2.0;
        }
        Ok((f, g.iter().zip(&dq).map(|(g, d)| g * d).collect()))
    }
}

impl CostFunction for Problem<'_, '_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.evaluate(param)?.0)
    }
}

impl Gradient for Problem<'_, '_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, argmin::core::Error> {
        Ok(self.evaluate(param)?.1)
    }
}

/// Best point, iteration count and convergence flag of a finished run.
fn outcome<S>(state: &S) -> (Option<Vec<f64>>, u64, bool)
where
    S: State<Param = Vec<f64>>,
{
    let converged = matches!(
        state.get_termination_status(),
        TerminationStatus::Terminated(TerminationReason::SolverConverged)
    );
    (state.get_best_param().cloned(), state.get_iter(), converged)
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect()
}

/// Quasi-Newton minimizer over the (optionally smoothed) objective.
#[derive(Debug, Clone, Default)]
pub struct Minimizer {
    config: MinimizerConfig,
}

impl Minimizer {
    /// Minimizer with the given settings. Call
    /// [`MinimizerConfig::validate`] first for user-supplied values.
    pub const fn new(config: MinimizerConfig) -> Self {
        Self { config }
    }

    /// Minimizer with [`DEFAULT_SMOOTH_FACTOR`] smoothing.
    pub fn smooth() -> Self {
        Self::new(MinimizerConfig::smooth())
    }

    pub const fn config(&self) -> &MinimizerConfig {
        &self.config
    }

    fn sides(&self, objective: &Objective<'_>, n: usize) -> Result<Vec<Side>, IkError> {
        if !self.config.method.supports_bounds() {
            if self.config.bounds.is_some() {
                warn!(
                    method = self.name(),
                    "bounds are not supported by this method; ignoring them"
                );
            }
            return Ok(vec![Side::Free; n]);
        }

        if let Some(explicit) = &self.config.bounds {
            if explicit.len() != n {
                return Err(IkError::Shape {
                    what: "bounds",
                    expected: n,
                    got: explicit.len(),
                });
            }
            return Ok(explicit.iter().map(|[lo, hi]| Side::new(*lo, *hi)).collect());
        }

        Ok(objective
            .forward()
            .chain()
            .joint_limits()
            .into_iter()
            .map(|limits| limits.map_or(Side::Free, |l| Side::new(l.lower, l.upper)))
            .collect())
    }
}

impl Optimizer for Minimizer {
    fn name(&self) -> &'static str {
        match self.config.method {
            Method::Bfgs => "bfgs",
            Method::LBfgsB => "l-bfgs-b",
        }
    }

    fn minimize(
        &self,
        objective: &Objective<'_>,
        initial: &DVector<f64>,
        target: &Vector3<f64>,
    ) -> Result<Minimum, IkError> {
        let n = initial.len();
        objective.forward().chain().check_dimension(n)?;
        if n == 0 {
            return Ok(Minimum {
                angles: initial.clone(),
                iterations: 0,
                converged: true,
            });
        }

        let weights = self
            .config
            .smooth_factor
            .as_ref()
            .map(|s| s.weights(n))
            .transpose()?;
        let sides = self.sides(objective, n)?;
        let z0: Vec<f64> = sides
            .iter()
            .zip(initial.iter())
            .map(|(s, q)| s.parameter(*q))
            .collect();
        let problem = Problem {
            objective,
            target,
            anchor: initial,
            weights,
            sides: &sides,
        };

        let IterationConfig {
            tolerance,
            max_iterations,
        } = self.config.iteration;
        let (f0, g0) = problem.evaluate(&z0)?;
        // A zero gradient is not a descent direction for the line search.
        if g0.iter().map(|g| g * g).sum::<f64>().sqrt() < tolerance {
            return Ok(Minimum {
                angles: angles(&sides, &z0),
                iterations: 0,
                converged: true,
            });
        }

        let tol_cost = COST_NOISE * f64::EPSILON * f0.max(1.0);
        let max_iters = u64::from(max_iterations);
        let line = Line::new();
        let start = z0.clone();
        let (best, iterations, converged) = match self.config.method {
            Method::LBfgsB => {
                let solver = LBFGS::new(line, HISTORY)
                    .with_tolerance_grad(tolerance)?
                    .with_tolerance_cost(tol_cost)?;
                let result = Executor::new(problem, solver)
                    .configure(|state| state.param(start).max_iters(max_iters))
                    .run()?;
                outcome(result.state())
            }
            Method::Bfgs => {
                let solver = BFGS::new(line)
                    .with_tolerance_grad(tolerance)?
                    .with_tolerance_cost(tol_cost)?;
                let result = Executor::new(problem, solver)
                    .configure(|state| {
                        state
                            .param(start)
                            .inv_hessian(identity(n))
                            .max_iters(max_iters)
                    })
                    .run()?;
                outcome(result.state())
            }
        };

        let iterations = u32::try_from(iterations).unwrap_or(u32::MAX);
        trace!(method = self.name(), iterations, converged, "quasi-newton run finished");
        Ok(Minimum {
            angles: angles(&sides, best.as_deref().unwrap_or(z0.as_slice())),
            iterations,
            converged,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
