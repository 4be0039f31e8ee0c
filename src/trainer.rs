//! Generational training loop: evaluation, selection, breeding.

use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::neural::{MutationMode, Network, PredictError};
use crate::stats::{GenerationStats, StatsHistory};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::fmt;

/// Fitness capability supplied by the caller: scores one prediction given
/// the input vector and the network's output vector.
pub type FitnessFn = Box<dyn FnMut(&[f64], &[f64]) -> f64>;

/// Errors from a training step.
#[derive(Debug)]
pub enum TrainError {
    /// No fitness function has been supplied yet.
    MissingFitness,
    /// The forward pass rejected the input.
    Predict(PredictError),
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFitness => {
                write!(f, "no fitness function supplied; call set_fitness_fn first")
            }
            Self::Predict(e) => write!(f, "prediction failed: {}", e),
        }
    }
}

impl std::error::Error for TrainError {}

impl From<PredictError> for TrainError {
    fn from(e: PredictError) -> Self {
        Self::Predict(e)
    }
}

/// Evolves a fixed-size population of networks against an externally
/// supplied fitness signal.
///
/// One `train` call evaluates exactly one specimen. Once every specimen of
/// a generation has been scored, the trainer selects parents by
/// fitness-proportionate (roulette) selection, breeds and mutates a
/// replacement population, and starts the next generation with the
/// evaluation cursor back at zero. The top `retention` specimens are carried
/// over unchanged, the best of them in slot 0.
///
/// Selection clamps negative fitness values to zero; when every clamped
/// value is zero (or the roulette draw lands on the exact total), the
/// parent is picked uniformly at random instead.
pub struct Trainer {
    config: Config,
    population: Vec<Network>,
    fitness: HashMap<usize, f64>,
    cursor: usize,
    generation: u64,
    last_generation_score: f64,
    last_generation_best: f64,
    history: StatsHistory,
    fitness_fn: Option<FitnessFn>,
    mutation: MutationMode,
    rng: ChaCha8Rng,
    seed: u64,
}

impl Trainer {
    /// Create a trainer with a random seed.
    pub fn new(config: Config) -> Result<Self, String> {
        let seed = rand::thread_rng().gen();
        Self::with_seed(config, seed)
    }

    /// Create a trainer with a specific seed for reproducibility.
    pub fn with_seed(config: Config, seed: u64) -> Result<Self, String> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let population = Self::spawn_population(&config, &mut rng);
        let mutation = match config.evolution.mutation_severity {
            Some(severity) => MutationMode::Targeted { severity },
            None => MutationMode::WholeGenome,
        };

        log::info!(
            "population ready: size {}, mutation chance {}%, breeding {}",
            config.evolution.population_size,
            config.evolution.mutation_chance * 100.0,
            config.evolution.breeding
        );

        Ok(Self {
            config,
            population,
            fitness: HashMap::new(),
            cursor: 0,
            generation: 0,
            last_generation_score: 0.0,
            last_generation_best: 0.0,
            history: StatsHistory::new(),
            fitness_fn: None,
            mutation,
            rng,
            seed,
        })
    }

    /// Generation-0 population: random networks from the configured topology.
    fn spawn_population(config: &Config, rng: &mut ChaCha8Rng) -> Vec<Network> {
        (0..config.evolution.population_size)
            .map(|_| {
                Network::random(
                    &config.network.layer_sizes,
                    config.network.activation,
                    rng,
                )
            })
            .collect()
    }

    /// Supply the fitness capability. Training fails until this is called.
    pub fn set_fitness_fn<F>(&mut self, fitness: F)
    where
        F: FnMut(&[f64], &[f64]) -> f64 + 'static,
    {
        self.fitness_fn = Some(Box::new(fitness));
    }

    /// Evaluate the current specimen on `input` and record its fitness.
    ///
    /// Returns the recorded fitness. When this call scores the last
    /// specimen of the generation, breeding runs before it returns and the
    /// next call evaluates specimen 0 of the new generation.
    pub fn train(&mut self, input: &[f64]) -> Result<f64, TrainError> {
        let Some(fitness_fn) = self.fitness_fn.as_mut() else {
            return Err(TrainError::MissingFitness);
        };

        let output = self.population[self.cursor].predict(input)?;
        let score = fitness_fn(input, &output);
        self.fitness.insert(self.cursor, score);

        self.advance();
        Ok(score)
    }

    /// Fitness of specimen `index` this generation, clamped to zero when
    /// asked to (selection precondition: non-negative values).
    fn fitness_at(&self, index: usize, clamped: bool) -> f64 {
        let score = self.fitness.get(&index).copied().unwrap_or(0.0);
        if clamped {
            score.max(0.0)
        } else {
            score
        }
    }

    /// Move to the next specimen, breeding when the generation is complete.
    fn advance(&mut self) {
        if self.cursor >= self.config.evolution.population_size - 1 {
            // Sum in index order: map iteration order must not leak into
            // reproducible results.
            self.last_generation_score = (0..self.population.len())
                .map(|index| self.fitness_at(index, false))
                .sum();

            let stats = GenerationStats::from_fitness(self.generation, &self.fitness);
            log::info!("{}", stats.summary());
            self.history.record(stats);

            self.breed();
            self.cursor = 0;
        } else {
            self.cursor += 1;
        }
    }

    /// Replace the population: retention, then roulette-selected breeding.
    fn breed(&mut self) {
        // Stable sort over index order, so ties break deterministically.
        let mut ranked: Vec<usize> = (0..self.population.len()).collect();
        ranked.sort_by(|&a, &b| {
            self.fitness_at(b, false)
                .partial_cmp(&self.fitness_at(a, false))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        self.last_generation_best = ranked
            .first()
            .map(|&index| self.fitness_at(index, false))
            .unwrap_or(0.0);

        // The best specimens survive unchanged, the very best in slot 0.
        let retention = self.config.evolution.retention;
        let mut next_generation: Vec<Network> = ranked
            .iter()
            .take(retention)
            .map(|&index| self.population[index].clone())
            .collect();

        let strategy = self.config.evolution.breeding;
        let chance = self.config.evolution.mutation_chance;

        while next_generation.len() < self.config.evolution.population_size {
            let parent1 = self.choose_parent();
            let parent2 = self.choose_parent();

            let mut child = strategy.breed(
                &self.population[parent1],
                &self.population[parent2],
                &mut self.rng,
            );
            self.mutation.mutate(&mut child, chance, &mut self.rng);

            next_generation.push(child);
        }

        self.population = next_generation;
        self.generation += 1;
        self.fitness.clear();
    }

    /// Fitness-proportionate (roulette) selection.
    ///
    /// Draws an integer passing point uniformly from [0, floor(total)] and
    /// returns the first specimen whose running fitness sum strictly
    /// exceeds it. Negative fitness is clamped to zero for the walk; an
    /// exhausted walk falls back to a uniform pick.
    fn choose_parent(&mut self) -> usize {
        let total: f64 = (0..self.population.len())
            .map(|index| self.fitness_at(index, true))
            .sum();
        let limit = total.floor() as u64;
        let passing_point = self.rng.gen_range(0..=limit) as f64;

        let mut running_sum = 0.0;
        for index in 0..self.population.len() {
            running_sum += self.fitness_at(index, true);

            if running_sum > passing_point {
                log::debug!(
                    "parent {} chosen with fitness {}",
                    index,
                    self.fitness_at(index, false)
                );
                return index;
            }
        }

        self.rng.gen_range(0..self.population.len())
    }

    /// Snapshot the complete training state, RNG included.
    pub fn create_checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            self.generation,
            self.cursor,
            self.config.clone(),
            self.population.clone(),
            self.fitness.clone(),
            self.last_generation_score,
            self.last_generation_best,
            self.history.clone(),
            self.rng.clone(),
            self.seed,
        )
    }

    /// Restore a trainer from a checkpoint.
    ///
    /// The fitness capability is not part of the snapshot and must be
    /// supplied again before training continues.
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Self {
        let mutation = match checkpoint.config.evolution.mutation_severity {
            Some(severity) => MutationMode::Targeted { severity },
            None => MutationMode::WholeGenome,
        };

        Self {
            config: checkpoint.config,
            population: checkpoint.population,
            fitness: checkpoint.fitness,
            cursor: checkpoint.cursor,
            generation: checkpoint.generation,
            last_generation_score: checkpoint.last_generation_score,
            last_generation_best: checkpoint.last_generation_best,
            history: checkpoint.history,
            fitness_fn: None,
            mutation,
            rng: checkpoint.rng,
            seed: checkpoint.seed,
        }
    }

    /// Completed-generation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Index of the specimen the next `train` call evaluates.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The current population, in specimen-index order.
    pub fn population(&self) -> &[Network] {
        &self.population
    }

    /// Configured population size.
    pub fn population_size(&self) -> usize {
        self.config.evolution.population_size
    }

    /// Fitness recorded so far in the current generation.
    pub fn fitness(&self) -> &HashMap<usize, f64> {
        &self.fitness
    }

    /// Sum of all fitness values in the last completed generation.
    pub fn last_generation_score(&self) -> f64 {
        self.last_generation_score
    }

    /// Best single fitness in the last completed generation.
    pub fn last_generation_best(&self) -> f64 {
        self.last_generation_best
    }

    /// The specimen the next `train` call evaluates.
    pub fn current_specimen(&self) -> &Network {
        &self.population[self.cursor]
    }

    /// Best-ranked specimen of the latest breeding (slot 0). Before the
    /// first generation completes this is just the first random specimen.
    pub fn best_network(&self) -> &Network {
        &self.population[0]
    }

    /// Per-generation statistics history.
    pub fn history(&self) -> &StatsHistory {
        &self.history
    }

    /// Seed this trainer was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(population_size: usize) -> Config {
        let mut config = Config::default();
        config.network.layer_sizes = vec![2, 3, 1];
        config.evolution.population_size = population_size;
        config.evolution.mutation_chance = 0.1;
        config
    }

    #[test]
    fn test_missing_fitness_fails() {
        let mut trainer = Trainer::with_seed(test_config(10), 1).unwrap();

        let err = trainer.train(&[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, TrainError::MissingFitness));
    }

    #[test]
    fn test_dimension_mismatch_propagates() {
        let mut trainer = Trainer::with_seed(test_config(10), 2).unwrap();
        trainer.set_fitness_fn(|_, _| 1.0);

        let err = trainer.train(&[0.5]).unwrap_err();
        assert!(matches!(err, TrainError::Predict(_)));
    }

    #[test]
    fn test_generation_lifecycle() {
        let population_size = 12;
        let mut trainer = Trainer::with_seed(test_config(population_size), 3).unwrap();
        trainer.set_fitness_fn(|_, output| output[0].abs() + 1.0);

        for step in 0..population_size {
            assert_eq!(trainer.cursor(), step);
            trainer.train(&[0.5, -0.5]).unwrap();
        }

        assert_eq!(trainer.generation(), 1);
        assert_eq!(trainer.cursor(), 0);
        assert!(trainer.fitness().is_empty());
        assert_eq!(trainer.population().len(), population_size);
        assert!(trainer.last_generation_score() > 0.0);
        assert_eq!(trainer.history().generations.len(), 1);
    }

    #[test]
    fn test_train_returns_recorded_score() {
        let mut trainer = Trainer::with_seed(test_config(10), 4).unwrap();
        trainer.set_fitness_fn(|_, _| 2.5);

        let score = trainer.train(&[0.1, 0.2]).unwrap();
        assert_eq!(score, 2.5);
        assert_eq!(trainer.fitness()[&0], 2.5);
    }

    #[test]
    fn test_elitism_preserves_best() {
        let population_size = 8;
        let mut trainer = Trainer::with_seed(test_config(population_size), 5).unwrap();
        trainer.set_fitness_fn(|_, output| (output[0] + 1.0) * 10.0);

        let mut scores = Vec::new();
        let mut pre_breed = Vec::new();

        for step in 0..population_size {
            if step == population_size - 1 {
                pre_breed = trainer.population().to_vec();
            }
            scores.push(trainer.train(&[0.3, 0.7]).unwrap());
        }

        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(index, _)| index)
            .unwrap();

        // The best specimen survives weight-for-weight in slot 0.
        assert_eq!(
            trainer.best_network().weights_and_biases(),
            pre_breed[best].weights_and_biases()
        );
        assert_eq!(trainer.last_generation_best(), scores[best]);
    }

    #[test]
    fn test_roulette_follows_cumulative_sum_walk() {
        let mut trainer = Trainer::with_seed(test_config(4), 6).unwrap();
        trainer.fitness =
            [(0, 1.0), (1, 2.0), (2, 3.0), (3, 0.0)].into_iter().collect();

        let fitness = [1.0, 2.0, 3.0, 0.0];
        let total: f64 = fitness.iter().sum();
        let limit = total.floor() as u64;

        // Replay the documented algorithm against a fork of the RNG.
        for _ in 0..50 {
            let mut probe = trainer.rng.clone();
            let passing_point = probe.gen_range(0..=limit) as f64;
            let mut expected = None;
            let mut running_sum = 0.0;
            for (index, f) in fitness.iter().enumerate() {
                running_sum += f;
                if running_sum > passing_point {
                    expected = Some(index);
                    break;
                }
            }

            let chosen = trainer.choose_parent();
            match expected {
                Some(index) => assert_eq!(chosen, index),
                // Draw landed on the exact total: uniform fallback.
                None => assert!(chosen < 4),
            }
        }
    }

    #[test]
    fn test_roulette_zero_fitness_falls_back_to_uniform() {
        let mut trainer = Trainer::with_seed(test_config(4), 7).unwrap();
        trainer.fitness = [(0, 0.0), (1, 0.0), (2, 0.0), (3, 0.0)].into_iter().collect();

        for _ in 0..20 {
            assert!(trainer.choose_parent() < 4);
        }
    }

    #[test]
    fn test_roulette_clamps_negative_fitness() {
        let mut trainer = Trainer::with_seed(test_config(3), 8).unwrap();
        trainer.fitness = [(0, -5.0), (1, 4.0), (2, -1.0)].into_iter().collect();

        // Specimen 1 holds the entire clamped mass; any draw below 4
        // selects it, and the fallback never panics.
        for _ in 0..20 {
            let chosen = trainer.choose_parent();
            assert!(chosen < 3);
        }
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let build = || {
            let mut trainer = Trainer::with_seed(test_config(6), 99).unwrap();
            trainer.set_fitness_fn(|_, output| output[0] * output[0] * 10.0);
            for _ in 0..18 {
                trainer.train(&[0.2, 0.8]).unwrap();
            }
            trainer
        };

        let first = build();
        let second = build();

        assert_eq!(first.generation(), second.generation());
        for (a, b) in first.population().iter().zip(second.population()) {
            assert_eq!(a.weights_and_biases(), b.weights_and_biases());
        }
    }

    #[test]
    fn test_population_stays_within_bounds() {
        let mut config = test_config(10);
        config.evolution.mutation_chance = 1.0;
        config.evolution.mutation_severity = None;

        let mut trainer = Trainer::with_seed(config, 10).unwrap();
        trainer.set_fitness_fn(|_, output| output[0].abs() * 5.0);

        for _ in 0..50 {
            trainer.train(&[0.4, 0.6]).unwrap();
        }

        for network in trainer.population() {
            assert!(network.is_valid());
        }
    }
}
