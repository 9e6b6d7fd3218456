use serde::{Deserialize, Serialize};

/// Complete configuration for the demonstration-generation pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemogenConfig {
    pub planner: PlannerConfig,
    pub scene: SceneConfig,
    pub task: TaskConfig,
    pub generation: GenerationConfig,
}

/// Grasp-trajectory synthesis constants.
///
/// These are fixed per planner instance; a single planning call cannot
/// override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Vertical offset of the pre-grasp and lift keyframes above the target
    /// position, in metres (default: 0.10).
    pub pre_grasp_offset: f64,
    /// Gripper-down end-effector orientation as a (w, x, y, z) quaternion,
    /// shared by all keyframes.
    pub down_orientation: [f64; 4],
    /// Joint value commanded to both gripper fingers when open (default: 0.04).
    pub gripper_open: f64,
    /// Joint value commanded to both gripper fingers when closed (default: 0.0).
    pub gripper_closed: f64,
    /// Interpolation length of the approach, descend, and lift segments
    /// (default: 50 each).
    pub approach_steps: usize,
    /// Interpolation length of the gripper-close-in-place segment
    /// (default: 20).
    pub close_steps: usize,
}

/// Camera and lighting randomization ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Nominal camera position before jitter is applied.
    pub camera_base_position: [f64; 3],
    /// Nominal point the camera looks at (centre of the workspace).
    pub camera_look_at: [f64; 3],
    /// Uniform per-axis jitter applied to the camera position, in metres.
    pub camera_position_jitter: f64,
    /// Uniform per-axis jitter applied to the look-at target, in metres.
    pub camera_look_at_jitter: f64,
    /// Rendered image resolution as (width, height).
    pub camera_resolution: (u32, u32),
    /// Camera vertical field of view in degrees.
    pub camera_fov: f64,
    /// Lower corner of the box the light position is drawn from.
    pub light_position_low: [f64; 3],
    /// Upper corner of the box the light position is drawn from.
    pub light_position_high: [f64; 3],
    /// Light intensity range (low, high).
    pub light_intensity: (f64, f64),
}

/// Object-spawn ranges for task sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Spawn range along x, in metres.
    pub spawn_x: (f64, f64),
    /// Spawn range along y, in metres.
    pub spawn_y: (f64, f64),
    /// Fixed spawn height above the table, in metres.
    pub spawn_z: f64,
}

/// Episode-generation loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Hard cap on recorded steps per episode; longer trajectories are
    /// truncated (default: 200).
    pub max_steps: usize,
    /// Record the robot's joint configuration as the proprioceptive `state`
    /// stream (default: true).
    pub record_state: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            pre_grasp_offset: 0.10,
            down_orientation: [0.0, 1.0, 0.0, 0.0],
            gripper_open: 0.04,
            gripper_closed: 0.0,
            approach_steps: 50,
            close_steps: 20,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera_base_position: [1.0, 0.0, 0.8],
            camera_look_at: [0.5, 0.0, 0.0],
            camera_position_jitter: 0.05,
            camera_look_at_jitter: 0.02,
            camera_resolution: (640, 480),
            camera_fov: 60.0,
            light_position_low: [1.0, -1.0, 2.0],
            light_position_high: [2.0, 1.0, 3.0],
            light_intensity: (1.0, 3.0),
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            spawn_x: (0.3, 0.7),
            spawn_y: (-0.2, 0.2),
            spawn_z: 0.05,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_steps: 200,
            record_state: true,
        }
    }
}
