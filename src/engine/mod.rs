//! External-engine capability boundary.

pub mod mock;
pub mod traits;

pub use mock::{MockEngine, MockRobot};
pub use traits::{
    CameraPose, EntityHandle, EntitySpec, Image, LightSpec, PrimitiveShape, Quaternion,
    RenderFrame, RobotArm, SimulationEngine, Vec3,
};
