//! SQLite schema for the episodic store.
//!
//! One `episodes` row per episode group carries the shapes fixed at first
//! write plus the current step count; `steps` holds one row per aligned
//! step record. Vector streams are stored as packed little-endian blobs
//! (u8 for observations, f32 for actions and states).

pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS episodes (
    name        TEXT PRIMARY KEY,
    obs_height  INTEGER,
    obs_width   INTEGER,
    action_dim  INTEGER,
    state_dim   INTEGER,
    num_steps   INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS steps (
    episode     TEXT    NOT NULL REFERENCES episodes(name) ON DELETE CASCADE,
    step_idx    INTEGER NOT NULL,
    observation BLOB    NOT NULL,
    action      BLOB    NOT NULL,
    reward      REAL    NOT NULL,
    instruction TEXT    NOT NULL,
    state       BLOB,
    PRIMARY KEY (episode, step_idx)
);
"#;
