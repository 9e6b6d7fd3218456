//! demogen: synthetic robot-manipulation demonstration generation.
//!
//! Plans open-loop grasp trajectories toward sampled objects, replays them
//! against a simulation engine, and records the resulting multimodal
//! episodes (image, action, instruction, reward, optional state) into a
//! persistent, growable dataset for vision-language-action training.

pub mod config;
pub mod engine;
pub mod generate;
pub mod planner;
pub mod recorder;
pub mod scene;
pub mod task;
