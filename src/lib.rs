//! # GENNET
//!
//! Neuroevolution engine: evolves a population of fixed-topology,
//! fully-connected feed-forward networks with a genetic algorithm driven by
//! an externally supplied fitness signal.
//!
//! ## Features
//!
//! - **Threshold-gated networks**: a neuron propagates only when its
//!   activation clears its bias threshold
//! - **Genetic operators**: single/two-point crossover, random gene copy,
//!   targeted and whole-genome mutation, roulette selection, elitism
//! - **Reproducible**: one seeded RNG handle threaded through everything
//! - **Resumable**: binary checkpoints capture the full state, RNG included
//! - **Configurable**: YAML configuration files
//!
//! ## Quick start
//!
//! ```rust
//! use gennet::{Config, Trainer};
//!
//! let mut config = Config::default();
//! config.network.layer_sizes = vec![2, 4, 1];
//! config.evolution.population_size = 20;
//!
//! let mut trainer = Trainer::with_seed(config, 42).unwrap();
//!
//! // The fitness capability scores one prediction; here: prefer high output.
//! trainer.set_fitness_fn(|_input, output| output[0] * 10.0);
//!
//! // One train call evaluates one specimen; a full generation is
//! // population_size calls, after which breeding runs automatically.
//! for _ in 0..60 {
//!     trainer.train(&[0.5, 0.5]).unwrap();
//! }
//!
//! println!("generation: {}", trainer.generation());
//! println!("best fitness: {}", trainer.last_generation_best());
//! ```
//!
//! ## Checkpoints
//!
//! ```rust,no_run
//! use gennet::{Config, Trainer};
//! use gennet::checkpoint::Checkpoint;
//!
//! let trainer = Trainer::new(Config::default()).unwrap();
//!
//! // Save training state.
//! trainer.create_checkpoint().save("run.bin").unwrap();
//!
//! // Restore it later; the fitness capability must be supplied again.
//! let loaded = Checkpoint::load("run.bin").unwrap();
//! let mut resumed = Trainer::from_checkpoint(loaded);
//! resumed.set_fitness_fn(|_, output| output[0]);
//! ```

pub mod checkpoint;
pub mod config;
pub mod neural;
pub mod stats;
pub mod trainer;

// Re-export main types
pub use config::Config;
pub use neural::{Activation, BreedingStrategy, Network};
pub use trainer::Trainer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_training_run() {
        let mut config = Config::default();
        config.network.layer_sizes = vec![2, 3, 1];
        config.evolution.population_size = 10;

        let mut trainer = Trainer::with_seed(config, 7).unwrap();
        trainer.set_fitness_fn(|_, output| output[0].abs() * 10.0);

        for _ in 0..30 {
            trainer.train(&[0.5, -0.5]).unwrap();
        }

        assert_eq!(trainer.generation(), 3);
    }
}
