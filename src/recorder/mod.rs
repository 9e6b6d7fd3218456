//! Persistent episodic dataset recording.

pub mod schema;
pub mod store;

pub use store::{group_name, EpisodeStore, EpisodeSummary, StepRow, StoreError, StreamKind};
