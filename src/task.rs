//! Randomized pick-task sampling and instruction generation.
//!
//! Each episode gets a freshly spawned target object (shape, color, and
//! position drawn from a seeded rng) and a templated natural-language
//! instruction describing it. The previous episode's object is removed
//! through the engine before the next one is spawned.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing;

use crate::config::TaskConfig;
use crate::engine::{EntityHandle, EntitySpec, PrimitiveShape, SimulationEngine, Vec3};

// ---------------------------------------------------------------------------
// Object and color tables
// ---------------------------------------------------------------------------

/// The spawnable object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Cube,
    Sphere,
    Mug,
}

impl ObjectKind {
    const ALL: [ObjectKind; 3] = [Self::Cube, Self::Sphere, Self::Mug];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Sphere => "sphere",
            Self::Mug => "mug",
        }
    }

    /// The primitive the engine spawns for this kind. The mug is
    /// approximated by a cylinder.
    pub fn primitive(&self) -> PrimitiveShape {
        match self {
            Self::Cube => PrimitiveShape::Cube { size: 0.04 },
            Self::Sphere => PrimitiveShape::Sphere { radius: 0.03 },
            Self::Mug => PrimitiveShape::Cylinder {
                radius: 0.04,
                height: 0.08,
            },
        }
    }
}

const COLORS: [(&str, [f32; 3]); 8] = [
    ("red", [1.0, 0.0, 0.0]),
    ("green", [0.0, 1.0, 0.0]),
    ("blue", [0.0, 0.0, 1.0]),
    ("yellow", [1.0, 1.0, 0.0]),
    ("cyan", [0.0, 1.0, 1.0]),
    ("magenta", [1.0, 0.0, 1.0]),
    ("white", [1.0, 1.0, 1.0]),
    ("black", [0.0, 0.0, 0.0]),
];

const TEMPLATES: [&str; 4] = [
    "Pick up the {color} {object}",
    "Grasp the {color} item",
    "Move the {object}",
    "Retrieve the {color} {object}",
];

// ---------------------------------------------------------------------------
// Sampler
// ---------------------------------------------------------------------------

/// A sampled task: what was spawned, where, and how it is described.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTask {
    pub object: ObjectKind,
    pub color_name: &'static str,
    pub spawn_position: Vec3,
    pub instruction: String,
    pub handle: EntityHandle,
}

/// Seeded task sampler. Given the same seed and engine behavior it produces
/// the same sequence of tasks.
#[derive(Debug)]
pub struct TaskSampler {
    config: TaskConfig,
    rng: StdRng,
    current: Option<EntityHandle>,
}

impl TaskSampler {
    pub fn new(config: TaskConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            current: None,
        }
    }

    /// Clear the previous target object (if any) and spawn a new one.
    ///
    /// A failure to remove the stale object is logged and tolerated; a
    /// failure to spawn the new one is an error, since there would be
    /// nothing to grasp.
    pub fn reset_task(&mut self, engine: &mut impl SimulationEngine) -> Result<ActiveTask> {
        if let Some(handle) = self.current.take() {
            if let Err(err) = engine.remove_entity(handle) {
                tracing::warn!(error = %err, "failed to remove previous target object");
            }
        }

        let object = *ObjectKind::ALL
            .choose(&mut self.rng)
            .expect("object table is non-empty");
        let (color_name, color) = *COLORS.choose(&mut self.rng).expect("color table is non-empty");

        let (x_low, x_high) = self.config.spawn_x;
        let (y_low, y_high) = self.config.spawn_y;
        let spawn_position = [
            self.rng.gen_range(x_low..x_high),
            self.rng.gen_range(y_low..y_high),
            self.config.spawn_z,
        ];

        let template = *TEMPLATES.choose(&mut self.rng).expect("template table is non-empty");
        let instruction = template
            .replace("{color}", color_name)
            .replace("{object}", object.as_str());

        let handle = engine
            .add_entity(&EntitySpec {
                shape: object.primitive(),
                position: spawn_position,
                color,
            })
            .context("failed to spawn target object")?;
        self.current = Some(handle);

        tracing::debug!(
            object = object.as_str(),
            color = color_name,
            position = ?spawn_position,
            %instruction,
            "sampled new task"
        );

        Ok(ActiveTask {
            object,
            color_name,
            spawn_position,
            instruction,
            handle,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use rand::SeedableRng;

    fn sampler(seed: u64) -> TaskSampler {
        TaskSampler::new(TaskConfig::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn spawn_position_respects_the_configured_ranges() {
        let mut engine = MockEngine::new();
        let mut sampler = sampler(0);

        for _ in 0..50 {
            let task = sampler.reset_task(&mut engine).unwrap();
            let [x, y, z] = task.spawn_position;
            assert!((0.3..0.7).contains(&x));
            assert!((-0.2..0.2).contains(&y));
            assert_eq!(z, 0.05);
        }
    }

    #[test]
    fn previous_object_is_removed_on_reset() {
        let mut engine = MockEngine::new();
        let mut sampler = sampler(1);

        let first = sampler.reset_task(&mut engine).unwrap();
        let second = sampler.reset_task(&mut engine).unwrap();

        assert_ne!(first.handle, second.handle);
        assert_eq!(engine.entity_count(), 1);
        assert!(engine.entity_position(first.handle).is_err());
        assert_eq!(
            engine.entity_position(second.handle).unwrap(),
            second.spawn_position
        );
    }

    #[test]
    fn instruction_is_fully_substituted() {
        let mut engine = MockEngine::new();
        let mut sampler = sampler(2);

        for _ in 0..20 {
            let task = sampler.reset_task(&mut engine).unwrap();
            assert!(!task.instruction.contains('{'));
            assert!(
                task.instruction.contains(task.object.as_str())
                    || task.instruction.contains(task.color_name)
            );
        }
    }

    #[test]
    fn sampling_is_reproducible_per_seed() {
        let mut engine_a = MockEngine::new();
        let mut engine_b = MockEngine::new();
        let mut a = sampler(42);
        let mut b = sampler(42);

        for _ in 0..10 {
            let task_a = a.reset_task(&mut engine_a).unwrap();
            let task_b = b.reset_task(&mut engine_b).unwrap();
            assert_eq!(task_a, task_b);
        }
    }
}
