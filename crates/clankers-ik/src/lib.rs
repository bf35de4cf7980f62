//! Forward and inverse kinematics for serial chains of links and revolute
//! joints.
//!
//! A chain is an ordered list of [`Component`]s from the base to the
//! end-effector. Links translate, joints rotate about a unit axis by one
//! angle each. Forward kinematics composes the per-component homogeneous
//! transforms; inverse kinematics searches for joint angles that place the
//! tip at a target position.
//!
//! # Architecture
//!
//! ```text
//! tokens ──► KinematicChain ──► ForwardSolver ──► Objective ──► Optimizer ─┐
//!                                     │                                   ├─► IkSolver ──► Actuator
//!                                     └──────────────► CcdSolver ─────────┘
//! ```
//!
//! Every solve takes its parameter vector explicitly and is a pure function
//! of the chain topology and its inputs. The [`Actuator`] is the only place
//! joint angles persist between solves.
//!
//! ```
//! use clankers_ik::{Actuator, CcdSolver, IkSolver};
//! use nalgebra::Vector3;
//!
//! let mut arm = Actuator::parse("z 1 y 1").unwrap();
//! arm.set_ee(&Vector3::new(1.08, 1.44, -0.6)).unwrap();
//! assert!((arm.ee() - Vector3::new(1.08, 1.44, -0.6)).norm() < 1e-5);
//!
//! let arm = arm.with_solver(CcdSolver::default());
//! assert_eq!(arm.solver().name(), "ccd");
//! ```

pub mod actuator;
pub mod ccd;
pub mod chain;
pub mod component;
pub mod config;
pub mod error;
pub mod forward;
pub mod objective;
pub mod optimizer;
pub mod solver;
pub mod token;

pub use actuator::Actuator;
pub use ccd::{CcdConfig, CcdSolver};
pub use chain::KinematicChain;
pub use component::{Component, Joint, JointLimits, Link};
pub use config::{ActuatorConfig, SolverConfig};
pub use error::{ConfigError, IkError};
pub use forward::{ForwardSolver, JointFrames};
pub use objective::Objective;
pub use optimizer::{
    ConjugateGradient, IterationConfig, Method, Minimizer, MinimizerConfig, Minimum, Newton,
    Optimizer, SmoothFactor, SteepestDescent, SteepestDescentConfig,
};
pub use solver::{IkSolver, OptimizationSolver, Solution};
pub use token::{IntoToken, RawToken, Token};
