//! Checkpoint system for saving and resuming training runs.

use crate::config::Config;
use crate::neural::Network;
use crate::stats::StatsHistory;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Complete training state for checkpointing.
///
/// Carries the RNG state itself, not just the seed, so a resumed run
/// continues exactly where the original would have.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Completed-generation counter
    pub generation: u64,
    /// Evaluation cursor within the current generation
    pub cursor: usize,
    /// Configuration
    pub config: Config,
    /// Full population, in specimen-index order
    pub population: Vec<Network>,
    /// Fitness recorded so far this generation
    pub fitness: HashMap<usize, f64>,
    /// Sum of fitness in the last completed generation
    pub last_generation_score: f64,
    /// Best fitness in the last completed generation
    pub last_generation_best: f64,
    /// Per-generation statistics
    pub history: StatsHistory,
    /// RNG state at snapshot time
    pub rng: ChaCha8Rng,
    /// Seed the run was started with
    pub seed: u64,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    /// Magic bytes identifying a checkpoint file
    const MAGIC: &'static [u8; 4] = b"GNNT";

    /// Create a new checkpoint
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generation: u64,
        cursor: usize,
        config: Config,
        population: Vec<Network>,
        fitness: HashMap<usize, f64>,
        last_generation_score: f64,
        last_generation_best: f64,
        history: StatsHistory,
        rng: ChaCha8Rng,
        seed: u64,
    ) -> Self {
        Self {
            version: Self::VERSION,
            generation,
            cursor,
            config,
            population,
            fitness,
            last_generation_score,
            last_generation_best,
            history,
            rng,
            seed,
        }
    }

    /// Save checkpoint to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(Self::MAGIC)?;

        let encoded = bincode::serialize(self)?;
        writer.write_all(&encoded)?;

        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != Self::MAGIC {
            return Err(CheckpointError::InvalidFormat(
                "invalid magic bytes".to_string(),
            ));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize
    }
}

/// Errors that can occur during checkpoint operations
#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    Serialization(bincode::Error),
    InvalidFormat(String),
    VersionMismatch { expected: u32, found: u32 },
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Serialization(e) => write!(f, "serialization error: {}", e),
            Self::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
            Self::VersionMismatch { expected, found } => {
                write!(f, "version mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e)
    }
}

/// Checkpoint manager for periodic saving during a run
pub struct CheckpointManager {
    /// Base directory for checkpoints
    pub base_dir: String,
    /// Generations between checkpoints
    pub interval: u64,
    /// Maximum checkpoints to keep
    pub max_checkpoints: usize,
    /// Last checkpointed generation
    last_checkpoint: u64,
}

impl CheckpointManager {
    /// Create a new checkpoint manager
    pub fn new(base_dir: String, interval: u64, max_checkpoints: usize) -> Self {
        std::fs::create_dir_all(&base_dir).ok();

        Self {
            base_dir,
            interval,
            max_checkpoints,
            last_checkpoint: 0,
        }
    }

    /// Check if a checkpoint should be saved at this generation
    pub fn should_save(&self, generation: u64) -> bool {
        generation > 0 && generation % self.interval == 0 && generation != self.last_checkpoint
    }

    /// Generate checkpoint filename
    pub fn checkpoint_path(&self, generation: u64) -> String {
        format!("{}/checkpoint_{:08}.bin", self.base_dir, generation)
    }

    /// Save checkpoint and update state
    pub fn save(&mut self, checkpoint: &Checkpoint) -> Result<String, CheckpointError> {
        let path = self.checkpoint_path(checkpoint.generation);
        checkpoint.save(&path)?;
        self.last_checkpoint = checkpoint.generation;

        self.cleanup()?;

        Ok(path)
    }

    /// Remove old checkpoints beyond the retention limit
    fn cleanup(&self) -> Result<(), CheckpointError> {
        let mut checkpoints: Vec<_> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("checkpoint_")
            })
            .collect();

        if checkpoints.len() > self.max_checkpoints {
            // Sort by name, which embeds the generation.
            checkpoints.sort_by_key(|e| e.file_name());

            let to_remove = checkpoints.len() - self.max_checkpoints;
            for entry in checkpoints.into_iter().take(to_remove) {
                std::fs::remove_file(entry.path())?;
            }
        }

        Ok(())
    }

    /// Find latest checkpoint in the directory
    pub fn find_latest(&self) -> Option<String> {
        std::fs::read_dir(&self.base_dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("checkpoint_")
            })
            .max_by_key(|e| e.file_name())
            .map(|e| e.path().to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::Trainer;

    fn test_checkpoint() -> Checkpoint {
        let mut config = Config::default();
        config.network.layer_sizes = vec![2, 2];
        config.evolution.population_size = 5;

        let trainer = Trainer::with_seed(config, 12345).unwrap();
        trainer.create_checkpoint()
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let checkpoint = test_checkpoint();
        let temp_path = "/tmp/gennet_test_checkpoint.bin";

        checkpoint.save(temp_path).unwrap();
        let loaded = Checkpoint::load(temp_path).unwrap();

        assert_eq!(loaded.generation, checkpoint.generation);
        assert_eq!(loaded.cursor, checkpoint.cursor);
        assert_eq!(loaded.population.len(), checkpoint.population.len());
        assert_eq!(loaded.seed, checkpoint.seed);
        assert_eq!(loaded.rng, checkpoint.rng);

        std::fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_rejects_bad_magic() {
        let temp_path = "/tmp/gennet_test_bad_magic.bin";
        std::fs::write(temp_path, b"NOPEnot a checkpoint").unwrap();

        let err = Checkpoint::load(temp_path).unwrap_err();
        assert!(matches!(err, CheckpointError::InvalidFormat(_)));

        std::fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_rejects_version_mismatch() {
        let mut checkpoint = test_checkpoint();
        checkpoint.version = 999;

        let temp_path = "/tmp/gennet_test_version.bin";
        checkpoint.save(temp_path).unwrap();

        let err = Checkpoint::load(temp_path).unwrap_err();
        assert!(matches!(
            err,
            CheckpointError::VersionMismatch {
                expected: 1,
                found: 999
            }
        ));

        std::fs::remove_file(temp_path).ok();
    }

    #[test]
    fn test_checkpoint_size() {
        let checkpoint = test_checkpoint();
        let size = checkpoint.size_bytes();

        assert!(size > 0);
        assert!(size < 1_000_000);
    }

    #[test]
    fn test_manager_interval() {
        let manager = CheckpointManager::new("/tmp/gennet_test_mgr".to_string(), 10, 3);

        assert!(!manager.should_save(0));
        assert!(!manager.should_save(5));
        assert!(manager.should_save(10));
        assert!(manager.should_save(20));

        std::fs::remove_dir_all("/tmp/gennet_test_mgr").ok();
    }
}
