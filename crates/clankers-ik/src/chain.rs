//! Ordered kinematic chain of links and joints.
//!
//! A [`KinematicChain`] lists its components from the base to the tip.
//! Its topology is fixed after construction; only the stored joint angles
//! change. The joints are the chain's free parameters and are addressed in
//! chain order everywhere a parameter vector appears.

use nalgebra::DVector;

use crate::component::{Component, Joint, JointLimits};
use crate::error::IkError;
use crate::token::{IntoToken, Token};

/// An ordered chain of components from base to end-effector.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicChain {
    components: Vec<Component>,
    /// Indices of the joint components, in chain order.
    joint_positions: Vec<usize>,
}

impl KinematicChain {
    /// Build a chain from components, base first.
    ///
    /// # Errors
    ///
    /// Returns [`IkError::EmptyChain`] if `components` is empty.
    pub fn new(components: Vec<Component>) -> Result<Self, IkError> {
        if components.is_empty() {
            return Err(IkError::EmptyChain);
        }
        let joint_positions = components
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.is_rotational().then_some(i))
            .collect();
        Ok(Self {
            components,
            joint_positions,
        })
    }

    /// Build a chain from construction tokens, base first.
    pub fn from_tokens<I, T>(tokens: I) -> Result<Self, IkError>
    where
        I: IntoIterator<Item = T>,
        T: IntoToken,
    {
        let components = tokens
            .into_iter()
            .map(|t| t.into_token()?.into_component())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(components)
    }

    /// Parse whitespace- or comma-separated string tokens, e.g. `"z 1 y 1"`.
    pub fn parse(description: &str) -> Result<Self, IkError> {
        Self::from_tokens(
            description
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .map(str::parse::<Token>),
        )
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Always false for a constructed chain.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of joints (free parameters).
    pub fn dof(&self) -> usize {
        self.joint_positions.len()
    }

    /// Components in chain order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Chain indices of the joint components.
    pub fn joint_positions(&self) -> &[usize] {
        &self.joint_positions
    }

    /// Joints in chain order.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.components.iter().filter_map(Component::as_joint)
    }

    /// Per-joint limits in chain order; `None` for unrestricted joints.
    pub fn joint_limits(&self) -> Vec<Option<JointLimits>> {
        self.joints().map(Joint::limits).collect()
    }

    /// Stored joint angles in chain order.
    pub fn angles(&self) -> DVector<f64> {
        DVector::from_iterator(self.dof(), self.joints().map(Joint::angle))
    }

    /// Write one angle per joint. Restricted joints store the clamped value.
    ///
    /// # Errors
    ///
    /// Returns [`IkError::Dimension`] if `angles.len() != self.dof()`.
    pub fn set_angles(&mut self, angles: &[f64]) -> Result<(), IkError> {
        self.check_dimension(angles.len())?;
        let joints = self.components.iter_mut().filter_map(Component::as_joint_mut);
        for (joint, &angle) in joints.zip(angles) {
            joint.set_angle(angle);
        }
        Ok(())
    }

    /// Clamp a parameter vector to the joint limits in place.
    pub fn clamp_angles(&self, angles: &mut [f64]) {
        for (joint, angle) in self.joints().zip(angles.iter_mut()) {
            *angle = joint.clamp(*angle);
        }
    }

    pub(crate) fn check_dimension(&self, got: usize) -> Result<(), IkError> {
        if got == self.joint_positions.len() {
            Ok(())
        } else {
            Err(IkError::Dimension {
                expected: self.joint_positions.len(),
                got,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
