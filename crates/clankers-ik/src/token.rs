//! Chain-construction tokens.
//!
//! A chain is described as an ordered token list, base to tip:
//!
//! | token                          | component                      |
//! |--------------------------------|--------------------------------|
//! | number `l`                     | link of length `l` along x     |
//! | 3-vector `[x, y, z]`           | link with that offset          |
//! | `"x"`, `"-y"`, `"+z"`          | joint about that (signed) axis |
//! | `{ axis = .., limits = [..] }` | joint about any axis, optionally restricted |
//!
//! [`RawToken`] is the loosely-typed form read from configuration files;
//! converting it into a [`Token`] is where malformed input is rejected.

use std::str::FromStr;

use nalgebra::Vector3;
use serde::Deserialize;

use crate::component::{Component, Joint, JointLimits, Link};
use crate::error::IkError;

/// A validated chain-construction token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Link of this length along the local x-axis.
    Length(f64),
    /// Link with an arbitrary offset.
    Offset(Vector3<f64>),
    /// Revolute joint about `axis`, optionally restricted to `limits`.
    Joint {
        axis: Vector3<f64>,
        limits: Option<JointLimits>,
    },
}

impl Token {
    /// Joint token from an axis name: `x`, `y`, `z`, optionally prefixed
    /// with `-` or `+`.
    pub fn axis(name: &str) -> Result<Self, IkError> {
        Ok(Self::Joint {
            axis: parse_axis_name(name)?,
            limits: None,
        })
    }

    /// Joint token about an arbitrary axis vector.
    pub const fn axis_vector(axis: Vector3<f64>) -> Self {
        Self::Joint { axis, limits: None }
    }

    /// Restricted joint token from an axis name.
    pub fn restricted(name: &str, lower: f64, upper: f64) -> Result<Self, IkError> {
        Ok(Self::Joint {
            axis: parse_axis_name(name)?,
            limits: Some(JointLimits::new(lower, upper)?),
        })
    }

    /// Build the component this token describes.
    pub fn into_component(self) -> Result<Component, IkError> {
        match self {
            Self::Length(length) => {
                if !length.is_finite() {
                    return Err(IkError::InvalidToken(format!(
                        "link length must be finite, got {length}"
                    )));
                }
                Ok(Link::along_x(length).into())
            }
            Self::Offset(offset) => {
                if !offset.iter().all(|c| c.is_finite()) {
                    return Err(IkError::InvalidToken(format!(
                        "link offset must be finite, got [{}, {}, {}]",
                        offset.x, offset.y, offset.z
                    )));
                }
                Ok(Link::new(offset).into())
            }
            Self::Joint { axis, limits } => {
                let joint = Joint::new(axis)?;
                Ok(match limits {
                    Some(limits) => joint.with_limits(limits),
                    None => joint,
                }
                .into())
            }
        }
    }
}

/// Anything that can be turned into a [`Token`], possibly failing.
pub trait IntoToken {
    fn into_token(self) -> Result<Token, IkError>;
}

impl IntoToken for Token {
    fn into_token(self) -> Result<Token, IkError> {
        Ok(self)
    }
}

impl IntoToken for Result<Token, IkError> {
    fn into_token(self) -> Result<Token, IkError> {
        self
    }
}

impl IntoToken for RawToken {
    fn into_token(self) -> Result<Token, IkError> {
        Token::try_from(self)
    }
}

impl IntoToken for f64 {
    fn into_token(self) -> Result<Token, IkError> {
        Ok(Token::Length(self))
    }
}

impl IntoToken for [f64; 3] {
    fn into_token(self) -> Result<Token, IkError> {
        Ok(Token::from(self))
    }
}

impl IntoToken for &str {
    fn into_token(self) -> Result<Token, IkError> {
        self.parse()
    }
}

impl From<f64> for Token {
    fn from(length: f64) -> Self {
        Self::Length(length)
    }
}

impl From<[f64; 3]> for Token {
    fn from(offset: [f64; 3]) -> Self {
        Self::Offset(Vector3::from(offset))
    }
}

impl FromStr for Token {
    type Err = IkError;

    /// Parses an axis name or a link length.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(axis) = parse_axis_name(s) {
            return Ok(Self::axis_vector(axis));
        }
        s.parse::<f64>().map(Self::Length).map_err(|_| {
            IkError::InvalidToken(format!(
                "'{s}' is neither a link length nor a joint axis"
            ))
        })
    }
}

fn parse_axis_name(name: &str) -> Result<Vector3<f64>, IkError> {
    let (sign, rest) = match name.as_bytes().first() {
        Some(b'-') => (-1.0, &name[1..]),
        Some(b'+') => (1.0, &name[1..]),
        _ => (1.0, name),
    };
    let axis = match rest {
        "x" => Vector3::x(),
        "y" => Vector3::y(),
        "z" => Vector3::z(),
        _ => {
            return Err(IkError::InvalidToken(format!(
                "unknown joint axis '{name}' (expected x, y or z)"
            )));
        }
    };
    Ok(axis * sign)
}

fn vector3(values: &[f64], what: &str) -> Result<Vector3<f64>, IkError> {
    match values {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(IkError::InvalidToken(format!(
            "{what} must have 3 components, got {}",
            values.len()
        ))),
    }
}

/// Untyped token as it appears in a configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawToken {
    Length(f64),
    Vector(Vec<f64>),
    Name(String),
    Joint(RawJoint),
}

/// Table form of a joint token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawJoint {
    pub axis: RawAxis,
    #[serde(default)]
    pub limits: Option<Vec<f64>>,
}

/// Joint axis given by name or by vector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAxis {
    Name(String),
    Vector(Vec<f64>),
}

impl TryFrom<RawToken> for Token {
    type Error = IkError;

    fn try_from(raw: RawToken) -> Result<Self, Self::Error> {
        match raw {
            RawToken::Length(length) => Ok(Self::Length(length)),
            RawToken::Vector(values) => Ok(Self::Offset(vector3(&values, "link offset")?)),
            RawToken::Name(name) => name.parse(),
            RawToken::Joint(RawJoint { axis, limits }) => {
                let axis = match axis {
                    RawAxis::Name(name) => parse_axis_name(&name)?,
                    RawAxis::Vector(values) => vector3(&values, "joint axis")?,
                };
                let limits = match limits.as_deref() {
                    None => None,
                    Some([lower, upper]) => Some(JointLimits::new(*lower, *upper)?),
                    Some(other) => {
                        return Err(IkError::InvalidToken(format!(
                            "joint limits must be [lower, upper], got {} values",
                            other.len()
                        )));
                    }
                };
                Ok(Self::Joint { axis, limits })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
