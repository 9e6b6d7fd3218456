//! Core kinematic data types shared by the planner and the generation loop.

use serde::{Deserialize, Serialize};

/// A joint configuration: one value per controllable degree of freedom.
///
/// For the reference robot this is 9 values (7 arm joints + 2 gripper
/// fingers); the last two channels are always the gripper fingers.
pub type JointConfig = Vec<f64>;

/// The commanded gripper state associated with a keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GripperState {
    Open,
    Closed,
}

/// A named task-space pose used as an interpolation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Short label used in log and error messages ("pre-grasp", "grasp", ...).
    pub label: &'static str,
    /// End-effector position in world coordinates.
    pub position: [f64; 3],
    /// End-effector orientation as a (w, x, y, z) quaternion.
    pub orientation: [f64; 4],
    /// Gripper state to hold at this keyframe.
    pub gripper: GripperState,
}

/// An ordered, finite sequence of joint configurations.
///
/// Produced once per planning call and immutable afterwards; consumed by
/// replaying each configuration against the robot one at a time. Adjacent
/// planner segments share their boundary configuration, so the same
/// configuration appears twice at each join. Downstream consumers rely on
/// the exact step count, so the duplicates are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory(Vec<JointConfig>);

impl Trajectory {
    pub(crate) fn from_points(points: Vec<JointConfig>) -> Self {
        Self(points)
    }

    /// Number of configurations in the trajectory.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The configuration at `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<&JointConfig> {
        self.0.get(index)
    }

    /// Iterate over the configurations in replay order.
    pub fn iter(&self) -> std::slice::Iter<'_, JointConfig> {
        self.0.iter()
    }

    /// The full configuration sequence as a slice.
    pub fn points(&self) -> &[JointConfig] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a JointConfig;
    type IntoIter = std::slice::Iter<'a, JointConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Trajectory {
    type Item = JointConfig;
    type IntoIter = std::vec::IntoIter<JointConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
