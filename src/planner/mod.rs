//! Keyframe-based trajectory synthesis.
//!
//! The planner is pure orchestration over two pieces: linear joint-space
//! interpolation ([`interpolate`]) and the fixed grasp-approach-close-lift
//! policy ([`GraspPlanner`]). It owns no persistent state and performs no
//! I/O beyond the robot capability calls it is handed.

pub mod grasp;
pub mod interpolate;
pub mod types;

pub use grasp::{GraspPlanner, PlanningError};
pub use interpolate::{interpolate, DimensionMismatchError};
pub use types::{GripperState, JointConfig, Keyframe, Trajectory};
