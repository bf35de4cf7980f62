//! Error types for chain construction, kinematics solves, and configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for clankers-ik.
#[derive(Debug, Error)]
pub enum IkError {
    /// A chain-construction token had an unsupported shape or value.
    #[error("invalid chain token: {0}")]
    InvalidToken(String),

    /// A chain was built without any components.
    #[error("kinematic chain has no components")]
    EmptyChain,

    /// The parameter vector does not have one angle per joint.
    #[error("dimension mismatch: expected {expected} joint angles, got {got}")]
    Dimension { expected: usize, got: usize },

    /// A component index past the end of the chain was requested.
    #[error("component index {index} out of range for chain of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The Hessian system of a second-order method could not be solved.
    #[error("singular system: {0}")]
    SingularSystem(&'static str),

    /// A per-joint option has the wrong number of entries.
    #[error("shape mismatch for {what}: expected {expected} entries, got {got}")]
    Shape {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// The quasi-Newton backend gave up with an error of its own.
    #[error("minimizer failed: {0}")]
    Minimizer(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<argmin::core::Error> for IkError {
    /// Errors raised by our own cost function come back unchanged.
    fn from(e: argmin::core::Error) -> Self {
        match e.downcast::<Self>() {
            Ok(inner) => inner,
            Err(e) => Self::Minimizer(e.to_string()),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            IkError::InvalidToken("'w'".into()).to_string(),
            "invalid chain token: 'w'"
        );
        assert_eq!(
            IkError::EmptyChain.to_string(),
            "kinematic chain has no components"
        );
        assert_eq!(
            IkError::Dimension {
                expected: 2,
                got: 3
            }
            .to_string(),
            "dimension mismatch: expected 2 joint angles, got 3"
        );
        assert_eq!(
            IkError::IndexOutOfRange { index: 7, len: 4 }.to_string(),
            "component index 7 out of range for chain of length 4"
        );
        assert_eq!(
            IkError::SingularSystem("hessian not invertible").to_string(),
            "singular system: hessian not invertible"
        );
        assert_eq!(
            IkError::Shape {
                what: "smooth_factor",
                expected: 2,
                got: 5
            }
            .to_string(),
            "shape mismatch for smooth_factor: expected 2 entries, got 5"
        );
    }

    #[test]
    fn ik_error_from_config_error() {
        let err = ConfigError::invalid("tolerance", "must be > 0");
        let ik_err: IkError = err.into();
        assert!(matches!(ik_err, IkError::Config(_)));
        assert!(ik_err.to_string().contains("tolerance"));
    }

    #[test]
    fn io_error_includes_path() {
        let e = ConfigError::Io {
            path: PathBuf::from("/tmp/arm.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/arm.toml"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn argmin_error_maps_to_minimizer() {
        let ik_err = IkError::from(argmin::core::Error::msg("line search failed"));
        assert!(matches!(ik_err, IkError::Minimizer(ref m) if m == "line search failed"));
        assert_eq!(ik_err.to_string(), "minimizer failed: line search failed");
    }

    #[test]
    fn own_error_passes_through_argmin() {
        let wrapped = argmin::core::Error::from(IkError::Dimension {
            expected: 2,
            got: 1,
        });
        assert!(matches!(
            IkError::from(wrapped),
            IkError::Dimension {
                expected: 2,
                got: 1
            }
        ));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_is_send_sync() {
        assert_send_sync::<IkError>();
    }
}
