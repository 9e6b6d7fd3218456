//! Deterministic in-process mock engine and robot.
//!
//! Useful for tests of the planner and the generation loop, and for running
//! the CLI without a physics backend. Rendering produces a synthetic
//! gradient image that varies with the simulation tick, so recorded episodes
//! contain distinguishable frames.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};

use crate::planner::JointConfig;

use super::traits::{
    CameraPose, EntityHandle, EntitySpec, Image, LightSpec, Quaternion, RenderFrame, RobotArm,
    SimulationEngine, Vec3,
};

/// Fallback render resolution when no camera has been placed.
const DEFAULT_RESOLUTION: (u32, u32) = (64, 64);

// ---------------------------------------------------------------------------
// Mock engine
// ---------------------------------------------------------------------------

/// A kinematics-free simulation engine: entities stay where they were
/// spawned and stepping only advances a tick counter.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    entities: HashMap<u64, EntitySpec>,
    next_handle: u64,
    camera: Option<CameraPose>,
    light: Option<LightSpec>,
    ticks: u64,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently spawned entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of physics ticks taken so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The most recently placed camera, if any.
    pub fn camera(&self) -> Option<&CameraPose> {
        self.camera.as_ref()
    }

    /// The most recently placed light, if any.
    pub fn light(&self) -> Option<&LightSpec> {
        self.light.as_ref()
    }
}

impl SimulationEngine for MockEngine {
    fn step(&mut self) -> Result<()> {
        self.ticks += 1;
        Ok(())
    }

    fn render(&mut self) -> Result<RenderFrame> {
        let (width, height) = self
            .camera
            .as_ref()
            .map(|c| c.resolution)
            .unwrap_or(DEFAULT_RESOLUTION);
        let (width, height) = (width as usize, height as usize);

        let mut data = Vec::with_capacity(height * width * 3);
        let tick = (self.ticks % 256) as u8;
        for y in 0..height {
            for x in 0..width {
                data.push((x % 256) as u8);
                data.push((y % 256) as u8);
                data.push(tick);
            }
        }

        Ok(RenderFrame {
            rgb: Image::new(height, width, data),
            depth: None,
            segmentation: None,
        })
    }

    fn add_entity(&mut self, spec: &EntitySpec) -> Result<EntityHandle> {
        let handle = EntityHandle::from_raw(self.next_handle);
        self.next_handle += 1;
        self.entities.insert(handle.raw(), spec.clone());
        Ok(handle)
    }

    fn remove_entity(&mut self, handle: EntityHandle) -> Result<()> {
        self.entities
            .remove(&handle.raw())
            .with_context(|| format!("no entity with handle {}", handle.raw()))?;
        Ok(())
    }

    fn entity_position(&self, handle: EntityHandle) -> Result<Vec3> {
        let spec = self
            .entities
            .get(&handle.raw())
            .with_context(|| format!("no entity with handle {}", handle.raw()))?;
        Ok(spec.position)
    }

    fn place_camera(&mut self, pose: &CameraPose) -> Result<()> {
        self.camera = Some(pose.clone());
        Ok(())
    }

    fn place_light(&mut self, light: &LightSpec) -> Result<()> {
        self.light = Some(light.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mock robot
// ---------------------------------------------------------------------------

/// A robot whose IK is a fixed embedding of the requested pose.
///
/// `solve_ik` writes the target position into the first three joints and the
/// orientation quaternion into the next four (truncated to the configured
/// DOF count), which makes planned trajectories easy to assert against.
#[derive(Debug, Clone)]
pub struct MockRobot {
    dof: usize,
    q: JointConfig,
    fail_ik: bool,
}

impl MockRobot {
    /// A robot with `dof` joints, starting at the all-zero configuration.
    pub fn new(dof: usize) -> Self {
        Self {
            dof,
            q: vec![0.0; dof],
            fail_ik: false,
        }
    }

    /// A robot starting from the given home configuration.
    pub fn with_home(q: JointConfig) -> Self {
        Self {
            dof: q.len(),
            q,
            fail_ik: false,
        }
    }

    /// A robot whose IK always fails, for exercising planner error paths.
    pub fn with_failing_ik(dof: usize) -> Self {
        Self {
            fail_ik: true,
            ..Self::new(dof)
        }
    }
}

impl RobotArm for MockRobot {
    fn current_configuration(&self) -> Result<JointConfig> {
        Ok(self.q.clone())
    }

    fn solve_ik(&self, position: Vec3, orientation: Quaternion) -> Result<JointConfig> {
        if self.fail_ik {
            bail!("pose is unreachable");
        }
        let mut q = vec![0.0; self.dof];
        for (i, value) in position.iter().chain(orientation.iter()).enumerate() {
            if i >= self.dof {
                break;
            }
            q[i] = *value;
        }
        Ok(q)
    }

    fn command_joints(&mut self, target: &[f64]) -> Result<()> {
        if target.len() != self.dof {
            bail!(
                "commanded configuration has {} joints, robot has {}",
                target.len(),
                self.dof
            );
        }
        // Perfect tracking: the commanded target is reached immediately.
        self.q = target.to_vec();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PrimitiveShape;

    fn cube_at(position: Vec3) -> EntitySpec {
        EntitySpec {
            shape: PrimitiveShape::Cube { size: 0.04 },
            position,
            color: [1.0, 0.0, 0.0],
        }
    }

    #[test]
    fn entities_can_be_added_queried_and_removed() {
        let mut engine = MockEngine::new();

        let handle = engine.add_entity(&cube_at([0.5, 0.1, 0.05])).unwrap();
        assert_eq!(engine.entity_position(handle).unwrap(), [0.5, 0.1, 0.05]);
        assert_eq!(engine.entity_count(), 1);

        engine.remove_entity(handle).unwrap();
        assert_eq!(engine.entity_count(), 0);
        assert!(engine.remove_entity(handle).is_err());
    }

    #[test]
    fn render_follows_camera_resolution() {
        let mut engine = MockEngine::new();
        engine
            .place_camera(&CameraPose {
                position: [1.0, 0.0, 0.8],
                look_at: [0.5, 0.0, 0.0],
                fov_degrees: 60.0,
                resolution: (32, 24),
            })
            .unwrap();

        let frame = engine.render().unwrap();

        assert_eq!(frame.rgb.width, 32);
        assert_eq!(frame.rgb.height, 24);
        assert_eq!(frame.rgb.data.len(), 32 * 24 * 3);
    }

    #[test]
    fn frames_vary_with_the_tick_counter() {
        let mut engine = MockEngine::new();

        let before = engine.render().unwrap();
        engine.step().unwrap();
        let after = engine.render().unwrap();

        assert_ne!(before.rgb, after.rgb);
    }

    #[test]
    fn mock_ik_is_deterministic_and_pose_shaped() {
        let robot = MockRobot::new(9);

        let q = robot.solve_ik([0.5, -0.1, 0.05], [0.0, 1.0, 0.0, 0.0]).unwrap();

        assert_eq!(q.len(), 9);
        assert_eq!(&q[..3], &[0.5, -0.1, 0.05]);
        assert_eq!(&q[3..7], &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(
            q,
            robot.solve_ik([0.5, -0.1, 0.05], [0.0, 1.0, 0.0, 0.0]).unwrap()
        );
    }

    #[test]
    fn commanded_joints_become_the_current_configuration() {
        let mut robot = MockRobot::new(3);

        robot.command_joints(&[0.1, 0.2, 0.3]).unwrap();

        assert_eq!(robot.current_configuration().unwrap(), vec![0.1, 0.2, 0.3]);
        assert!(robot.command_joints(&[0.1]).is_err());
    }
}
