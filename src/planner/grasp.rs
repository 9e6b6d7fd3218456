//! Keyframe-based grasp-trajectory synthesis.
//!
//! [`GraspPlanner`] turns a single 3D target position into a full joint-space
//! motion: approach from the home configuration, descend to the object, close
//! the gripper in place, and lift. The policy is fixed; there is no obstacle
//! checking, replanning, or dynamics-aware optimization.

use thiserror::Error;
use tracing;

use crate::config::PlannerConfig;
use crate::engine::RobotArm;

use super::interpolate::{interpolate, DimensionMismatchError};
use super::types::{GripperState, JointConfig, Keyframe, Trajectory};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Trajectory synthesis failed; no partial trajectory is returned.
///
/// The planner never retries internally. Whether to skip the episode or retry
/// with different inputs is the caller's decision.
#[derive(Debug, Error)]
pub enum PlanningError {
    /// The robot could not report its current configuration.
    #[error("could not read the robot's current configuration")]
    CurrentConfiguration(#[source] anyhow::Error),

    /// Inverse kinematics failed to resolve one of the keyframes.
    #[error("inverse kinematics failed for the {keyframe} keyframe")]
    Ik {
        keyframe: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The resolved keyframes disagree in dimension with each other or with
    /// the home configuration.
    #[error(transparent)]
    Dimension(#[from] DimensionMismatchError),
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Open-loop grasp planner. Stateless across calls; all constants come from
/// the [`PlannerConfig`] it was built with.
#[derive(Debug, Clone)]
pub struct GraspPlanner {
    config: PlannerConfig,
}

impl GraspPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Synthesize a grasp trajectory toward `target_position`.
    ///
    /// The trajectory is the concatenation of four interpolated segments:
    ///
    /// 1. home → pre-grasp (`approach_steps`),
    /// 2. pre-grasp → grasp (`approach_steps`),
    /// 3. grasp(open) → grasp(closed), same pose, gripper channels only
    ///    (`close_steps`),
    /// 4. grasp(closed) → lift (`approach_steps`).
    ///
    /// With the default configuration that is 50 + 50 + 20 + 50 = 170
    /// configurations. Segment boundaries are not deduplicated.
    ///
    /// Given a deterministic robot the output is fully deterministic.
    pub fn plan_grasp(
        &self,
        robot: &impl RobotArm,
        target_position: [f64; 3],
    ) -> Result<Trajectory, PlanningError> {
        let cfg = &self.config;

        let pre_grasp_position = [
            target_position[0],
            target_position[1],
            target_position[2] + cfg.pre_grasp_offset,
        ];

        // Lift shares the pre-grasp pose; it differs only in gripper state.
        let keyframes = [
            Keyframe {
                label: "pre-grasp",
                position: pre_grasp_position,
                orientation: cfg.down_orientation,
                gripper: GripperState::Open,
            },
            Keyframe {
                label: "grasp",
                position: target_position,
                orientation: cfg.down_orientation,
                gripper: GripperState::Open,
            },
            Keyframe {
                label: "lift",
                position: pre_grasp_position,
                orientation: cfg.down_orientation,
                gripper: GripperState::Closed,
            },
        ];

        let home = robot
            .current_configuration()
            .map_err(PlanningError::CurrentConfiguration)?;

        let pre_grasp_q = self.resolve(robot, &keyframes[0])?;
        let grasp_q = self.resolve(robot, &keyframes[1])?;
        let lift_q = self.resolve(robot, &keyframes[2])?;

        tracing::debug!(
            target = ?target_position,
            dof = pre_grasp_q.len(),
            "resolved grasp keyframes"
        );

        // The in-place close segment interpolates only the gripper channels.
        let grasp_q_closed = self.with_gripper(grasp_q.clone(), GripperState::Closed);

        let mut points = interpolate(&home, &pre_grasp_q, cfg.approach_steps)?;
        points.extend(interpolate(&pre_grasp_q, &grasp_q, cfg.approach_steps)?);
        points.extend(interpolate(&grasp_q, &grasp_q_closed, cfg.close_steps)?);
        points.extend(interpolate(&grasp_q_closed, &lift_q, cfg.approach_steps)?);

        Ok(Trajectory::from_points(points))
    }

    /// Resolve one keyframe to a joint configuration and apply its gripper
    /// override.
    fn resolve(
        &self,
        robot: &impl RobotArm,
        keyframe: &Keyframe,
    ) -> Result<JointConfig, PlanningError> {
        let q = robot
            .solve_ik(keyframe.position, keyframe.orientation)
            .map_err(|source| PlanningError::Ik {
                keyframe: keyframe.label,
                source,
            })?;
        Ok(self.with_gripper(q, keyframe.gripper))
    }

    /// Override the two gripper-finger channels (the last two entries) with
    /// the configured value for `state`. Configurations with fewer than two
    /// channels are returned unchanged.
    fn with_gripper(&self, mut q: JointConfig, state: GripperState) -> JointConfig {
        let value = match state {
            GripperState::Open => self.config.gripper_open,
            GripperState::Closed => self.config.gripper_closed,
        };
        let len = q.len();
        if len >= 2 {
            q[len - 2] = value;
            q[len - 1] = value;
        }
        q
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockRobot;

    const OPEN: f64 = 0.04;
    const CLOSED: f64 = 0.0;

    fn planner() -> GraspPlanner {
        GraspPlanner::new(PlannerConfig::default())
    }

    #[test]
    fn reference_trajectory_has_170_configurations() {
        let robot = MockRobot::new(9);

        let trajectory = planner().plan_grasp(&robot, [0.5, 0.0, 0.05]).unwrap();

        assert_eq!(trajectory.len(), 170);
        assert!(trajectory.iter().all(|q| q.len() == 9));
    }

    #[test]
    fn segment_boundaries_are_duplicated() {
        let robot = MockRobot::new(9);

        let trajectory = planner().plan_grasp(&robot, [0.5, 0.0, 0.05]).unwrap();

        // home→pre-grasp | pre-grasp→grasp
        assert_eq!(trajectory.get(49), trajectory.get(50));
        // pre-grasp→grasp | close-in-place
        assert_eq!(trajectory.get(99), trajectory.get(100));
        // close-in-place | grasp→lift
        assert_eq!(trajectory.get(119), trajectory.get(120));
    }

    #[test]
    fn gripper_channels_follow_the_close_schedule() {
        // Home already holds the gripper open, like a robot parked after a
        // release; the approach segment then keeps the channels constant.
        let mut home = vec![0.0; 9];
        home[7] = OPEN;
        home[8] = OPEN;
        let robot = MockRobot::with_home(home);

        let trajectory = planner().plan_grasp(&robot, [0.5, 0.0, 0.05]).unwrap();

        // Open through the approach and descend segments, up to and
        // including the first configuration of the close segment. Interior
        // points interpolate between two equal endpoints, which can land one
        // ulp off the constant.
        for i in 0..=100 {
            let q = trajectory.get(i).unwrap();
            assert!((q[7] - OPEN).abs() < 1e-12, "index {i}");
            assert!((q[8] - OPEN).abs() < 1e-12, "index {i}");
        }
        // Closed from the end of the close segment through the lift.
        for i in 119..170 {
            let q = trajectory.get(i).unwrap();
            assert_eq!(q[7], CLOSED, "index {i}");
            assert_eq!(q[8], CLOSED, "index {i}");
        }
        // Strictly between the two constants inside the close segment.
        let mid = trajectory.get(110).unwrap();
        assert!(mid[7] > CLOSED && mid[7] < OPEN);
    }

    #[test]
    fn pre_grasp_sits_above_the_target() {
        let robot = MockRobot::new(9);
        let target = [0.5, -0.1, 0.05];

        let trajectory = planner().plan_grasp(&robot, target).unwrap();

        // MockRobot embeds the requested position in the first three joints.
        let pre_grasp = trajectory.get(49).unwrap();
        assert_eq!(pre_grasp[0], target[0]);
        assert_eq!(pre_grasp[1], target[1]);
        assert!((pre_grasp[2] - (target[2] + 0.10)).abs() < 1e-12);

        let grasp = trajectory.get(99).unwrap();
        assert_eq!(grasp[2], target[2]);
    }

    #[test]
    fn output_is_deterministic() {
        let robot = MockRobot::new(9);
        let planner = planner();

        let a = planner.plan_grasp(&robot, [0.4, 0.1, 0.05]).unwrap();
        let b = planner.plan_grasp(&robot, [0.4, 0.1, 0.05]).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn ik_failure_aborts_the_whole_call() {
        let robot = MockRobot::with_failing_ik(9);

        let err = planner().plan_grasp(&robot, [0.5, 0.0, 0.05]).unwrap_err();

        assert!(matches!(
            err,
            PlanningError::Ik {
                keyframe: "pre-grasp",
                ..
            }
        ));
    }

    #[test]
    fn tiny_configurations_skip_the_gripper_override() {
        let robot = MockRobot::new(1);

        let trajectory = planner().plan_grasp(&robot, [0.5, 0.0, 0.05]).unwrap();

        assert_eq!(trajectory.len(), 170);
        assert!(trajectory.iter().all(|q| q.len() == 1));
    }
}
