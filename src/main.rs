//! demogen: synthetic robot-manipulation episode generator.
//!
//! Subcommands:
//!
//! - `generate` -- run the generation loop and write episodes to a dataset
//! - `inspect`  -- summarize the episodes in an existing dataset

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use demogen::config::DemogenConfig;
use demogen::engine::{MockEngine, MockRobot};
use demogen::generate::EpisodeGenerator;
use demogen::recorder::{group_name, EpisodeStore};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// demogen: synthetic robot-manipulation episode generator
#[derive(Parser)]
#[command(name = "demogen", version, about)]
struct Cli {
    /// Path to a JSON configuration file (uses defaults if not provided).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate demonstration episodes into a dataset file.
    ///
    /// Runs against the built-in deterministic mock engine; real physics
    /// backends integrate through the library's capability traits.
    Generate {
        /// Number of episodes to generate.
        #[arg(long, default_value_t = 100)]
        episodes: usize,

        /// Path of the dataset file to write.
        #[arg(long, default_value = "data/demonstrations.db")]
        output: PathBuf,

        /// Master seed for task and scene randomization.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Number of robot degrees of freedom (7 arm + 2 gripper).
        #[arg(long, default_value_t = 9)]
        dof: usize,
    },

    /// Summarize the episodes in an existing dataset file.
    Inspect {
        /// Path of the dataset file.
        #[arg(default_value = "data/demonstrations.db")]
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // Initialise tracing (reads RUST_LOG env var, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str::<DemogenConfig>(&text)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        }
        None => DemogenConfig::default(),
    };

    match cli.command {
        Commands::Generate {
            episodes,
            output,
            seed,
            dof,
        } => cmd_generate(config, episodes, &output, seed, dof),
        Commands::Inspect { path } => cmd_inspect(&path),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_generate(
    config: DemogenConfig,
    episodes: usize,
    output: &PathBuf,
    seed: u64,
    dof: usize,
) -> Result<()> {
    tracing::info!(episodes, path = %output.display(), seed, "generating episodes");

    let mut engine = MockEngine::new();
    let mut robot = MockRobot::new(dof);
    let mut store =
        EpisodeStore::open(output).context("failed to open the dataset for writing")?;
    let mut generator = EpisodeGenerator::new(config, seed);

    let report = generator.run(&mut engine, &mut robot, &mut store, episodes)?;
    store.close().context("failed to close the dataset")?;

    // Provenance sidecar next to the dataset.
    let report_path = output.with_extension("run.json");
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&report_path, json)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    tracing::info!(
        written = report.episodes_written,
        skipped = report.episodes_skipped,
        report = %report_path.display(),
        "generation complete"
    );
    Ok(())
}

fn cmd_inspect(path: &PathBuf) -> Result<()> {
    let store = EpisodeStore::open(path).context("failed to open the dataset")?;
    let indices = store.episode_indices()?;

    println!("Dataset: {}", path.display());
    println!("  Episodes: {}", indices.len());
    println!();

    for index in indices {
        let Some(summary) = store.episode_summary(index)? else {
            continue;
        };
        let obs = summary
            .observation_shape
            .map(|(h, w)| format!("{h}x{w}x3 u8"))
            .unwrap_or_else(|| "unset".into());
        let action = summary
            .action_dim
            .map(|d| format!("[{d}] f32"))
            .unwrap_or_else(|| "unset".into());
        let state = summary
            .state_dim
            .map(|d| format!("[{d}] f32"))
            .unwrap_or_else(|| "absent".into());

        println!(
            "{}: {} steps, obs {obs}, action {action}, state {state}",
            group_name(index),
            summary.num_steps
        );
        if let Some(first) = store.read_steps(index)?.first() {
            println!("  instruction: {:?}", first.instruction);
        }
    }

    Ok(())
}
