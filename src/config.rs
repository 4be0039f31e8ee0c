//! Configuration for training runs.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::neural::{Activation, BreedingStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network topology configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Neuron counts per layer, input first, output last
    pub layer_sizes: Vec<usize>,
    /// Activation applied by every neuron
    pub activation: Activation,
}

/// Evolution hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Number of specimens per generation
    pub population_size: usize,
    /// Probability that a bred child mutates (targeted mode) or
    /// per-parameter mutation rate (whole-genome mode)
    pub mutation_chance: f64,
    /// Point mutations per triggered targeted mutation; omit to mutate the
    /// whole genome instead
    pub mutation_severity: Option<usize>,
    /// Top specimens carried unchanged into the next generation
    pub retention: usize,
    /// How children are bred from selected parents
    pub breeding: BreedingStrategy,
}

/// Logging and checkpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Generations between checkpoints
    pub checkpoint_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            evolution: EvolutionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            layer_sizes: vec![8, 8, 4],
            activation: Activation::Tanh,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            mutation_chance: 0.02,
            mutation_severity: Some(3),
            retention: 1,
            breeding: BreedingStrategy::SinglePoint,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 50,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.network.layer_sizes.len() < 2 {
            return Err("layer_sizes needs at least an input and an output layer".to_string());
        }
        if self.network.layer_sizes.iter().any(|&size| size == 0) {
            return Err("every layer needs at least one neuron".to_string());
        }
        if self.evolution.population_size == 0 {
            return Err("population_size must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.evolution.mutation_chance) {
            return Err("mutation_chance must be between 0 and 1".to_string());
        }
        if self.evolution.mutation_severity == Some(0) {
            return Err("mutation_severity must be at least 1 when set".to_string());
        }
        if self.evolution.retention == 0 {
            return Err("retention must be at least 1 (the best specimen is always kept)".to_string());
        }
        if self.evolution.retention > self.evolution.population_size {
            return Err("retention cannot exceed population_size".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(loaded.network.layer_sizes, config.network.layer_sizes);
        assert_eq!(loaded.network.activation, config.network.activation);
        assert_eq!(loaded.evolution.breeding, config.evolution.breeding);
    }

    #[test]
    fn test_rejects_missing_output_layer() {
        let mut config = Config::default();
        config.network.layer_sizes = vec![8];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_layer() {
        let mut config = Config::default();
        config.network.layer_sizes = vec![8, 0, 4];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_mutation_chance() {
        let mut config = Config::default();
        config.evolution.mutation_chance = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_retention() {
        let mut config = Config::default();
        config.evolution.retention = 0;
        assert!(config.validate().is_err());

        config.evolution.retention = config.evolution.population_size + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_activation_fails_to_parse() {
        let yaml = "\
network:
  layer_sizes: [4, 2]
  activation: softplus
evolution:
  population_size: 10
  mutation_chance: 0.02
  mutation_severity: 3
  retention: 1
  breeding: single_point
";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }
}
