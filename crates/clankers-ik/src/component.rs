//! Chain components: fixed translations ([`Link`]) and revolute joints ([`Joint`]).
//!
//! Every component maps to a 4x4 homogeneous transform. Links ignore the
//! joint parameter; joints rotate about their unit axis by either the
//! supplied parameter or their own stored angle.

use nalgebra::{Matrix3, Matrix4, Translation3, Unit, Vector3};
use tracing::debug;

use crate::error::IkError;

/// Closed interval a restricted joint's angle is confined to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimits {
    /// Lower angle limit (rad).
    pub lower: f64,
    /// Upper angle limit (rad).
    pub upper: f64,
}

impl JointLimits {
    /// Create limits, rejecting inverted or non-finite bounds.
    pub fn new(lower: f64, upper: f64) -> Result<Self, IkError> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(IkError::InvalidToken(format!(
                "joint limits must be finite, got [{lower}, {upper}]"
            )));
        }
        if lower > upper {
            return Err(IkError::InvalidToken(format!(
                "joint limits inverted: lower {lower} > upper {upper}"
            )));
        }
        Ok(Self { lower, upper })
    }

    /// Clamp `angle` into `[lower, upper]`.
    pub fn clamp(&self, angle: f64) -> f64 {
        angle.clamp(self.lower, self.upper)
    }

    /// Whether `angle` lies inside the interval.
    pub fn contains(&self, angle: f64) -> bool {
        (self.lower..=self.upper).contains(&angle)
    }
}

/// A rigid translation between two joint frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    offset: Vector3<f64>,
}

impl Link {
    /// Create a link with an arbitrary offset.
    pub const fn new(offset: Vector3<f64>) -> Self {
        Self { offset }
    }

    /// Create a link of the given length along the local x-axis.
    pub fn along_x(length: f64) -> Self {
        Self::new(Vector3::new(length, 0.0, 0.0))
    }

    /// Offset in the parent frame.
    pub const fn offset(&self) -> &Vector3<f64> {
        &self.offset
    }

    /// Euclidean length of the offset.
    pub fn length(&self) -> f64 {
        self.offset.norm()
    }

    /// Pure-translation homogeneous transform.
    pub fn transform(&self) -> Matrix4<f64> {
        Translation3::from(self.offset).to_homogeneous()
    }
}

/// A revolute joint about a fixed unit axis, optionally angle-restricted.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    axis: Unit<Vector3<f64>>,
    angle: f64,
    limits: Option<JointLimits>,
}

impl Joint {
    /// Create an unrestricted joint. The axis is normalized; a zero or
    /// non-finite axis is rejected.
    pub fn new(axis: Vector3<f64>) -> Result<Self, IkError> {
        if !axis.iter().all(|c| c.is_finite()) {
            return Err(IkError::InvalidToken(format!(
                "joint axis must be finite, got [{}, {}, {}]",
                axis.x, axis.y, axis.z
            )));
        }
        let axis = Unit::try_new(axis, f64::EPSILON).ok_or_else(|| {
            IkError::InvalidToken("joint axis must have non-zero length".into())
        })?;
        Ok(Self {
            axis,
            angle: 0.0,
            limits: None,
        })
    }

    /// Joint about the local x-axis.
    pub fn x() -> Self {
        Self::from_unit(Vector3::x_axis())
    }

    /// Joint about the local y-axis.
    pub fn y() -> Self {
        Self::from_unit(Vector3::y_axis())
    }

    /// Joint about the local z-axis.
    pub fn z() -> Self {
        Self::from_unit(Vector3::z_axis())
    }

    /// Joint about an already-normalized axis.
    pub const fn from_unit(axis: Unit<Vector3<f64>>) -> Self {
        Self {
            axis,
            angle: 0.0,
            limits: None,
        }
    }

    /// Restrict the joint to `limits`, clamping the stored angle.
    #[must_use]
    pub fn with_limits(mut self, limits: JointLimits) -> Self {
        self.limits = Some(limits);
        self.angle = limits.clamp(self.angle);
        self
    }

    /// Unit rotation axis in the joint's local frame.
    pub const fn axis(&self) -> &Unit<Vector3<f64>> {
        &self.axis
    }

    /// Stored joint angle (rad).
    pub const fn angle(&self) -> f64 {
        self.angle
    }

    /// Angle range of a restricted joint.
    pub const fn limits(&self) -> Option<JointLimits> {
        self.limits
    }

    /// True when writes to this joint are clamped.
    pub const fn is_restricted(&self) -> bool {
        self.limits.is_some()
    }

    /// Store a new angle. Restricted joints keep the clamped value.
    pub fn set_angle(&mut self, angle: f64) {
        if let Some(limits) = self.limits.filter(|l| !l.contains(angle)) {
            debug!(
                angle,
                lower = limits.lower,
                upper = limits.upper,
                "joint write clamped to limits"
            );
        }
        self.angle = self.clamp(angle);
    }

    /// The value this joint would store for `angle`.
    pub fn clamp(&self, angle: f64) -> f64 {
        match self.limits {
            Some(limits) => limits.clamp(angle),
            None => angle,
        }
    }

    /// Rotation about the axis by `angle` (Rodrigues' formula).
    pub fn rotation(&self, angle: f64) -> Matrix3<f64> {
        let (s, c) = angle.sin_cos();
        let v = 1.0 - c;
        let (x, y, z) = (self.axis.x, self.axis.y, self.axis.z);

        Matrix3::new(
            c + x * x * v,
            x * y * v - z * s,
            x * z * v + y * s,
            y * x * v + z * s,
            c + y * y * v,
            y * z * v - x * s,
            z * x * v - y * s,
            z * y * v + x * s,
            c + z * z * v,
        )
    }

    /// Pure-rotation homogeneous transform. Uses the stored angle when
    /// `angle` is `None`.
    pub fn transform(&self, angle: Option<f64>) -> Matrix4<f64> {
        self.rotation(angle.unwrap_or(self.angle)).to_homogeneous()
    }
}

/// One element of a kinematic chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// Fixed translation.
    Link(Link),
    /// Rotation about an axis; the chain's free parameters.
    Joint(Joint),
}

impl Component {
    /// Homogeneous transform of this component. `param` is ignored by links.
    pub fn transform(&self, param: Option<f64>) -> Matrix4<f64> {
        match self {
            Self::Link(link) => link.transform(),
            Self::Joint(joint) => joint.transform(param),
        }
    }

    pub const fn is_translational(&self) -> bool {
        matches!(self, Self::Link(_))
    }

    pub const fn is_rotational(&self) -> bool {
        matches!(self, Self::Joint(_))
    }

    pub const fn as_link(&self) -> Option<&Link> {
        match self {
            Self::Link(link) => Some(link),
            Self::Joint(_) => None,
        }
    }

    pub const fn as_joint(&self) -> Option<&Joint> {
        match self {
            Self::Joint(joint) => Some(joint),
            Self::Link(_) => None,
        }
    }

    pub(crate) fn as_joint_mut(&mut self) -> Option<&mut Joint> {
        match self {
            Self::Joint(joint) => Some(joint),
            Self::Link(_) => None,
        }
    }
}

impl From<Link> for Component {
    fn from(link: Link) -> Self {
        Self::Link(link)
    }
}

impl From<Joint> for Component {
    fn from(joint: Joint) -> Self {
        Self::Joint(joint)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
