//! Append-only episodic data store.
//!
//! One SQLite file holds zero or more episode groups named `episode_<index>`.
//! Each group carries five aligned, growable streams: observation
//! `[N, H, W, 3]` u8, action `[N, D]` f32, reward `[N]` f32, instruction
//! `[N]` text, and an optional state `[N, D_state]` f32. Per-record shapes
//! are fixed by the first write to each stream and enforced on every
//! subsequent append.
//!
//! Every mutating operation runs inside one SQLite transaction: a failed
//! append leaves all prior data untouched and the store continuable.

use std::collections::BTreeSet;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing;

use crate::engine::Image;

use super::schema;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Which of the five streams an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Observation,
    Action,
    Reward,
    Instruction,
    State,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Observation => "observation",
            Self::Action => "action",
            Self::Reward => "reward",
            Self::Instruction => "instruction",
            Self::State => "state",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// An append disagrees with the shape established at first write. The
    /// offending append is rejected before any stream is extended; the
    /// episode is otherwise unchanged.
    #[error(
        "{stream} shape {actual:?} does not match established shape {expected:?} \
         for episode {episode}"
    )]
    ShapeMismatch {
        episode: u32,
        stream: StreamKind,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// The backing file cannot be opened, written, or read. Fatal for this
    /// store instance.
    #[error("storage backend error")]
    Storage(#[from] rusqlite::Error),

    /// The dataset directory could not be prepared.
    #[error("cannot prepare dataset directory for {path}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store has been closed; no further operations are possible.
    #[error("episode store is closed")]
    Closed,
}

// ---------------------------------------------------------------------------
// Read-side types
// ---------------------------------------------------------------------------

/// Per-episode shape metadata and step count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeSummary {
    pub index: u32,
    pub num_steps: usize,
    /// (H, W) once the observation stream is established.
    pub observation_shape: Option<(usize, usize)>,
    pub action_dim: Option<usize>,
    pub state_dim: Option<usize>,
}

/// One aligned step read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRow {
    pub observation: Image,
    pub action: Vec<f32>,
    pub reward: f32,
    pub instruction: String,
    pub state: Option<Vec<f32>>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The group name an episode index maps to in the container file.
pub fn group_name(index: u32) -> String {
    format!("episode_{index}")
}

/// Single-writer handle to one episodic container file.
///
/// All mutating methods take `&mut self`; the store holds the connection for
/// its whole lifetime and releases it on [`close`](EpisodeStore::close) (or
/// on drop).
#[derive(Debug)]
pub struct EpisodeStore {
    conn: Option<Connection>,
}

impl EpisodeStore {
    /// Open (creating if necessary) the container file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a transient in-memory store (used by tests and dry runs).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(schema::DDL)?;
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::Closed)
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, StoreError> {
        self.conn.as_mut().ok_or(StoreError::Closed)
    }

    /// Create a fresh, empty episode at `index`.
    ///
    /// Idempotent destructive reset: any existing data for this index is
    /// discarded first, including its established shapes. Other episodes are
    /// untouched. Succeeds on both the "new" and the "overwrite" path.
    pub fn create_episode(&mut self, index: u32) -> Result<(), StoreError> {
        let name = group_name(index);
        let conn = self.conn_mut()?;

        let tx = conn.transaction()?;
        let replaced = tx.execute("DELETE FROM episodes WHERE name = ?1", params![name])?;
        tx.execute(
            "INSERT INTO episodes (name, num_steps) VALUES (?1, 0)",
            params![name],
        )?;
        tx.commit()?;

        if replaced > 0 {
            tracing::debug!(episode = index, "replaced existing episode group");
        }
        Ok(())
    }

    /// Append one aligned step record to episode `index`.
    ///
    /// The episode is created implicitly when absent. The first write per
    /// stream fixes that stream's per-record shape; later mismatches fail
    /// with [`StoreError::ShapeMismatch`] without extending any stream.
    ///
    /// `state` handling: once the state stream is established, omitting
    /// `state` writes a zero row of the established length; establishing it
    /// late zero-backfills all earlier rows; never establishing it leaves
    /// the stream absent.
    pub fn append_step(
        &mut self,
        index: u32,
        observation: &Image,
        action: &[f64],
        instruction: &str,
        reward: f64,
        state: Option<&[f64]>,
    ) -> Result<(), StoreError> {
        let name = group_name(index);
        let conn = self.conn_mut()?;
        let tx = conn.transaction()?;

        // Load the established shapes, implicitly creating the episode.
        let meta: Option<(Option<i64>, Option<i64>, Option<i64>, Option<i64>, i64)> = tx
            .query_row(
                "SELECT obs_height, obs_width, action_dim, state_dim, num_steps
                 FROM episodes WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;
        let (obs_h, obs_w, action_dim, state_dim, num_steps) = match meta {
            Some(meta) => meta,
            None => {
                tx.execute(
                    "INSERT INTO episodes (name, num_steps) VALUES (?1, 0)",
                    params![name],
                )?;
                (None, None, None, None, 0)
            }
        };

        // Validate every stream before any write so a rejected step never
        // leaves the streams unevenly extended.
        if let (Some(h), Some(w)) = (obs_h, obs_w) {
            if observation.height as i64 != h || observation.width as i64 != w {
                return Err(StoreError::ShapeMismatch {
                    episode: index,
                    stream: StreamKind::Observation,
                    expected: vec![h as usize, w as usize, 3],
                    actual: vec![observation.height, observation.width, 3],
                });
            }
        }
        if let Some(d) = action_dim {
            if action.len() as i64 != d {
                return Err(StoreError::ShapeMismatch {
                    episode: index,
                    stream: StreamKind::Action,
                    expected: vec![d as usize],
                    actual: vec![action.len()],
                });
            }
        }
        let state_bytes: Option<Vec<u8>> = match (state_dim, state) {
            (Some(d), Some(values)) => {
                if values.len() as i64 != d {
                    return Err(StoreError::ShapeMismatch {
                        episode: index,
                        stream: StreamKind::State,
                        expected: vec![d as usize],
                        actual: vec![values.len()],
                    });
                }
                Some(f32_blob(values))
            }
            // Established but omitted on this step: backfill with zeros.
            (Some(d), None) => Some(zero_f32_blob(d as usize)),
            // First non-null value establishes the stream.
            (None, Some(values)) => Some(f32_blob(values)),
            // Never established: no entry for this stream.
            (None, None) => None,
        };

        tx.execute(
            "INSERT INTO steps (episode, step_idx, observation, action, reward, instruction, state)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                name,
                num_steps,
                observation.data,
                f32_blob(action),
                // Rewards are stored as f32 regardless of the input type.
                f64::from(reward as f32),
                instruction,
                state_bytes,
            ],
        )?;

        // Late establishment: all earlier rows gain a zero state row so the
        // stream length equals the step count.
        if state_dim.is_none() {
            if let Some(values) = state {
                if num_steps > 0 {
                    tx.execute(
                        "UPDATE steps SET state = ?1 WHERE episode = ?2 AND state IS NULL",
                        params![zero_f32_blob(values.len()), name],
                    )?;
                }
            }
        }

        tx.execute(
            "UPDATE episodes
             SET obs_height = ?2, obs_width = ?3, action_dim = ?4, state_dim = ?5,
                 num_steps = ?6
             WHERE name = ?1",
            params![
                name,
                obs_h.unwrap_or(observation.height as i64),
                obs_w.unwrap_or(observation.width as i64),
                action_dim.unwrap_or(action.len() as i64),
                state_dim.or_else(|| state.map(|s| s.len() as i64)),
                num_steps + 1,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Flush pending writes and release the backing file.
    ///
    /// Idempotent: closing an already-closed store is a no-op. The file
    /// remains valid and reopenable.
    pub fn close(&mut self) -> Result<(), StoreError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, err)| StoreError::Storage(err))?;
        }
        Ok(())
    }

    /// Whether [`close`](EpisodeStore::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    // -- read side ----------------------------------------------------------

    /// All episode indices present in the container, ascending.
    pub fn episode_indices(&self) -> Result<Vec<u32>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM episodes")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut indices = BTreeSet::new();
        for name in names {
            let name = name?;
            if let Some(index) = name.strip_prefix("episode_").and_then(|s| s.parse().ok()) {
                indices.insert(index);
            }
        }
        Ok(indices.into_iter().collect())
    }

    /// Shape metadata and step count for one episode, or `None` when the
    /// episode does not exist.
    pub fn episode_summary(&self, index: u32) -> Result<Option<EpisodeSummary>, StoreError> {
        let conn = self.conn()?;
        let summary = conn
            .query_row(
                "SELECT obs_height, obs_width, action_dim, state_dim, num_steps
                 FROM episodes WHERE name = ?1",
                params![group_name(index)],
                |row| {
                    let obs_h: Option<i64> = row.get(0)?;
                    let obs_w: Option<i64> = row.get(1)?;
                    let action_dim: Option<i64> = row.get(2)?;
                    let state_dim: Option<i64> = row.get(3)?;
                    let num_steps: i64 = row.get(4)?;
                    Ok(EpisodeSummary {
                        index,
                        num_steps: num_steps as usize,
                        observation_shape: obs_h
                            .zip(obs_w)
                            .map(|(h, w)| (h as usize, w as usize)),
                        action_dim: action_dim.map(|d| d as usize),
                        state_dim: state_dim.map(|d| d as usize),
                    })
                },
            )
            .optional()?;
        Ok(summary)
    }

    /// Read every step of one episode, in append order.
    pub fn read_steps(&self, index: u32) -> Result<Vec<StepRow>, StoreError> {
        let summary = match self.episode_summary(index)? {
            Some(summary) => summary,
            None => return Ok(Vec::new()),
        };
        let (height, width) = summary.observation_shape.unwrap_or((0, 0));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT observation, action, reward, instruction, state
             FROM steps WHERE episode = ?1 ORDER BY step_idx",
        )?;
        let rows = stmt.query_map(params![group_name(index)], |row| {
            let observation: Vec<u8> = row.get(0)?;
            let action: Vec<u8> = row.get(1)?;
            let reward: f64 = row.get(2)?;
            let instruction: String = row.get(3)?;
            let state: Option<Vec<u8>> = row.get(4)?;
            Ok((observation, action, reward, instruction, state))
        })?;

        let mut steps = Vec::with_capacity(summary.num_steps);
        for row in rows {
            let (observation, action, reward, instruction, state) = row?;
            steps.push(StepRow {
                observation: Image::new(height, width, observation),
                action: f32_from_blob(&action),
                reward: reward as f32,
                instruction,
                state: state.as_deref().map(f32_from_blob),
            });
        }
        Ok(steps)
    }
}

// ---------------------------------------------------------------------------
// Blob packing
// ---------------------------------------------------------------------------

fn f32_blob(values: &[f64]) -> Vec<u8> {
    values
        .iter()
        .flat_map(|&v| (v as f32).to_le_bytes())
        .collect()
}

fn zero_f32_blob(len: usize) -> Vec<u8> {
    vec![0; len * 4]
}

fn f32_from_blob(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
