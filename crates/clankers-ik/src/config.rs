//! TOML description of an actuator: its chain tokens and IK strategy.
//!
//! ```toml
//! chain = ["z", 1.0, { axis = "y", limits = [-1.5, 1.5] }, [1.0, 0.0, 0.0]]
//!
//! [solver]
//! kind = "minimize"
//! method = "lbfgsb"
//! smooth_factor = 0.1
//! ```
//!
//! Omitted solver fields fall back to the strategy defaults; an omitted
//! `[solver]` table selects the generic minimizer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actuator::Actuator;
use crate::ccd::{CcdConfig, CcdSolver};
use crate::chain::KinematicChain;
use crate::error::{ConfigError, IkError};
use crate::optimizer::{
    ConjugateGradient, IterationConfig, Minimizer, MinimizerConfig, Newton, SteepestDescent,
    SteepestDescentConfig,
};
use crate::solver::{IkSolver, OptimizationSolver};
use crate::token::RawToken;

/// IK strategy selection, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SolverConfig {
    Newton(IterationConfig),
    SteepestDescent(SteepestDescentConfig),
    ConjugateGradient(IterationConfig),
    Minimize(MinimizerConfig),
    Ccd(CcdConfig),
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::Minimize(MinimizerConfig::default())
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Newton(c) | Self::ConjugateGradient(c) => c.validate(),
            Self::SteepestDescent(c) => c.validate(),
            Self::Minimize(c) => c.validate(),
            Self::Ccd(c) => c.validate(),
        }
    }

    /// Instantiate the configured strategy.
    pub fn build(&self) -> Box<dyn IkSolver> {
        match self {
            Self::Newton(c) => Box::new(OptimizationSolver::new(Newton::new(*c))),
            Self::SteepestDescent(c) => {
                Box::new(OptimizationSolver::new(SteepestDescent::new(*c)))
            }
            Self::ConjugateGradient(c) => {
                Box::new(OptimizationSolver::new(ConjugateGradient::new(*c)))
            }
            Self::Minimize(c) => Box::new(OptimizationSolver::new(Minimizer::new(c.clone()))),
            Self::Ccd(c) => Box::new(CcdSolver::new(*c)),
        }
    }
}

/// Chain tokens plus solver selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActuatorConfig {
    /// Chain tokens, base first.
    pub chain: Vec<RawToken>,
    #[serde(default)]
    pub solver: SolverConfig,
}

impl ActuatorConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.is_empty() {
            return Err(ConfigError::invalid("chain", "must contain at least one token"));
        }
        self.solver.validate()
    }

    /// Build the chain and attach the configured strategy.
    ///
    /// # Errors
    ///
    /// [`IkError::InvalidToken`] for malformed chain tokens.
    pub fn build(&self) -> Result<Actuator, IkError> {
        let chain = KinematicChain::from_tokens(self.chain.iter().cloned())?;
        let mut actuator = Actuator::new(chain);
        actuator.set_solver(self.solver.build());
        Ok(actuator)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
