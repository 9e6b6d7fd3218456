//! Capability traits for the external physics/rendering engine.
//!
//! The crate ships no physics backend. Anything that honors these two traits
//! can drive episode generation; the core never probes for optional methods
//! on engine objects, it only calls the fixed capability set below.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::planner::JointConfig;

/// A 3D position or direction in world coordinates.
pub type Vec3 = [f64; 3];

/// An orientation as a (w, x, y, z) quaternion.
pub type Quaternion = [f64; 4];

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Opaque identifier for an entity the engine has spawned.
///
/// The core holds on to handles only to read an entity's position and to
/// remove it again; everything else about the entity stays inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Wrap a raw engine-assigned id. Intended for engine implementations.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Geometric primitive for a spawnable object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveShape {
    Cube { size: f64 },
    Sphere { radius: f64 },
    Cylinder { radius: f64, height: f64 },
}

/// Everything the engine needs to spawn an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub shape: PrimitiveShape,
    pub position: Vec3,
    /// RGB in [0, 1].
    pub color: [f32; 3],
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// A row-major H×W×3 RGB image with 8-bit channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub height: usize,
    pub width: usize,
    /// Exactly `height * width * 3` bytes.
    pub data: Vec<u8>,
}

impl Image {
    /// Build an image from raw bytes.
    ///
    /// # Panics
    /// Panics if `data` is not exactly `height * width * 3` bytes long.
    pub fn new(height: usize, width: usize, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            height * width * 3,
            "image data must be height * width * 3 bytes"
        );
        Self {
            height,
            width,
            data,
        }
    }

    /// An all-black image.
    pub fn zeros(height: usize, width: usize) -> Self {
        Self::new(height, width, vec![0; height * width * 3])
    }

    /// An image with every channel set to `value`.
    pub fn filled(height: usize, width: usize, value: u8) -> Self {
        Self::new(height, width, vec![value; height * width * 3])
    }
}

/// One rendered frame. Depth and segmentation are optional engine outputs;
/// only the RGB image is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub rgb: Image,
    /// Per-pixel depth in metres, row-major, when the engine provides it.
    pub depth: Option<Vec<f32>>,
    /// Per-pixel entity id, row-major, when the engine provides it.
    pub segmentation: Option<Vec<u32>>,
}

/// A camera placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f64,
    /// (width, height) of the rendered image.
    pub resolution: (u32, u32),
}

/// A light placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSpec {
    pub position: Vec3,
    /// RGB in [0, 1].
    pub color: [f32; 3],
    pub intensity: f64,
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// The robot-arm capabilities the planner and the generation loop rely on.
pub trait RobotArm {
    /// The robot's current joint configuration.
    fn current_configuration(&self) -> Result<JointConfig>;

    /// Resolve a desired end-effector pose to a joint configuration.
    ///
    /// May fail for unreachable poses; the failure surfaces to the caller
    /// unchanged (there is no silent fallback configuration).
    fn solve_ik(&self, position: Vec3, orientation: Quaternion) -> Result<JointConfig>;

    /// Command the joint controllers toward `target`.
    fn command_joints(&mut self, target: &[f64]) -> Result<()>;
}

/// The simulation-engine capabilities the generation loop relies on.
pub trait SimulationEngine {
    /// Advance the physics simulation by one tick.
    fn step(&mut self) -> Result<()>;

    /// Render the current frame from the placed camera.
    fn render(&mut self) -> Result<RenderFrame>;

    /// Spawn an object and return its handle.
    fn add_entity(&mut self, spec: &EntitySpec) -> Result<EntityHandle>;

    /// Remove a previously spawned object.
    fn remove_entity(&mut self, handle: EntityHandle) -> Result<()>;

    /// Current world position of a spawned object.
    fn entity_position(&self, handle: EntityHandle) -> Result<Vec3>;

    /// Place (or re-place) the scene camera.
    fn place_camera(&mut self, pose: &CameraPose) -> Result<()>;

    /// Place (or re-place) the scene light.
    fn place_light(&mut self, light: &LightSpec) -> Result<()>;
}
