//! Seeded camera and lighting randomization.
//!
//! Domain randomization for the recorded observations: each episode the
//! camera is jittered around its nominal pose and the light is redrawn from
//! the configured ranges. All draws come from the injected rng, so a fixed
//! seed reproduces the same scene sequence.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::SceneConfig;
use crate::engine::{CameraPose, LightSpec, SimulationEngine};

/// Applies per-episode scene randomization through the engine capabilities.
#[derive(Debug)]
pub struct SceneController {
    config: SceneConfig,
    rng: StdRng,
}

impl SceneController {
    pub fn new(config: SceneConfig, rng: StdRng) -> Self {
        Self { config, rng }
    }

    /// Place the camera near its nominal pose with uniform jitter on both
    /// the position and the look-at target. Returns the placed pose.
    pub fn randomize_camera(&mut self, engine: &mut impl SimulationEngine) -> Result<CameraPose> {
        let cfg = &self.config;

        let mut position = cfg.camera_base_position;
        let mut look_at = cfg.camera_look_at;
        for axis in 0..3 {
            position[axis] +=
                self.rng.gen_range(-cfg.camera_position_jitter..cfg.camera_position_jitter);
            look_at[axis] +=
                self.rng.gen_range(-cfg.camera_look_at_jitter..cfg.camera_look_at_jitter);
        }

        let pose = CameraPose {
            position,
            look_at,
            fov_degrees: cfg.camera_fov,
            resolution: cfg.camera_resolution,
        };
        engine.place_camera(&pose)?;
        Ok(pose)
    }

    /// Draw a fresh light position and intensity and place it. Returns the
    /// placed light.
    pub fn randomize_lighting(&mut self, engine: &mut impl SimulationEngine) -> Result<LightSpec> {
        let cfg = &self.config;

        let mut position = [0.0; 3];
        for axis in 0..3 {
            position[axis] = self
                .rng
                .gen_range(cfg.light_position_low[axis]..cfg.light_position_high[axis]);
        }
        let (low, high) = cfg.light_intensity;

        let light = LightSpec {
            position,
            color: [1.0, 1.0, 1.0],
            intensity: self.rng.gen_range(low..high),
        };
        engine.place_light(&light)?;
        Ok(light)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use rand::SeedableRng;

    fn controller(seed: u64) -> SceneController {
        SceneController::new(SceneConfig::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn camera_stays_within_the_jitter_box() {
        let mut engine = MockEngine::new();
        let mut scene = controller(0);

        for _ in 0..50 {
            let pose = scene.randomize_camera(&mut engine).unwrap();
            for axis in 0..3 {
                assert!((pose.position[axis] - [1.0, 0.0, 0.8][axis]).abs() <= 0.05);
                assert!((pose.look_at[axis] - [0.5, 0.0, 0.0][axis]).abs() <= 0.02);
            }
            assert_eq!(pose.resolution, (640, 480));
        }
        assert_eq!(engine.camera().unwrap().fov_degrees, 60.0);
    }

    #[test]
    fn light_respects_the_configured_ranges() {
        let mut engine = MockEngine::new();
        let mut scene = controller(1);

        for _ in 0..50 {
            let light = scene.randomize_lighting(&mut engine).unwrap();
            assert!((1.0..2.0).contains(&light.position[0]));
            assert!((-1.0..1.0).contains(&light.position[1]));
            assert!((2.0..3.0).contains(&light.position[2]));
            assert!((1.0..3.0).contains(&light.intensity));
        }
        assert!(engine.light().is_some());
    }

    #[test]
    fn randomization_is_reproducible_per_seed() {
        let mut engine_a = MockEngine::new();
        let mut engine_b = MockEngine::new();
        let mut a = controller(7);
        let mut b = controller(7);

        for _ in 0..10 {
            assert_eq!(
                a.randomize_camera(&mut engine_a).unwrap(),
                b.randomize_camera(&mut engine_b).unwrap()
            );
            assert_eq!(
                a.randomize_lighting(&mut engine_a).unwrap(),
                b.randomize_lighting(&mut engine_b).unwrap()
            );
        }
    }
}
