//! Per-generation training statistics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fitness summary for one completed generation
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation index
    pub generation: u64,
    /// Sum of all specimen fitness values
    pub total_score: f64,
    /// Best single specimen fitness
    pub best_score: f64,
    /// Mean specimen fitness
    pub mean_score: f64,
}

impl GenerationStats {
    /// Summarize a generation's fitness map.
    pub fn from_fitness(generation: u64, fitness: &HashMap<usize, f64>) -> Self {
        // Sum in specimen-index order: map iteration order must not leak
        // into reproducible results.
        let mut indices: Vec<usize> = fitness.keys().copied().collect();
        indices.sort_unstable();

        let total_score: f64 = indices.iter().map(|index| fitness[index]).sum();
        let best_score = indices
            .iter()
            .map(|index| fitness[index])
            .fold(f64::NEG_INFINITY, f64::max);
        let mean_score = if indices.is_empty() {
            0.0
        } else {
            total_score / indices.len() as f64
        };

        Self {
            generation,
            total_score,
            best_score: if indices.is_empty() { 0.0 } else { best_score },
            mean_score,
        }
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "Gen:{:5} | Total:{:10.3} | Best:{:8.3} | Mean:{:8.3}",
            self.generation, self.total_score, self.best_score, self.mean_score
        )
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    /// One record per completed generation
    pub generations: Vec<GenerationStats>,
}

impl StatsHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a generation summary
    pub fn record(&mut self, stats: GenerationStats) {
        self.generations.push(stats);
    }

    /// Most recent record
    pub fn latest(&self) -> Option<&GenerationStats> {
        self.generations.last()
    }

    /// Best single-specimen score across all recorded generations
    pub fn best_ever(&self) -> Option<f64> {
        self.generations
            .iter()
            .map(|g| g.best_score)
            .fold(None, |acc, score| match acc {
                Some(best) if best >= score => Some(best),
                _ => Some(score),
            })
    }

    /// Save history to a JSON file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load history from a JSON file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Export history as CSV, one row per generation
    pub fn save_csv(&self, path: &str) -> std::io::Result<()> {
        let mut csv = String::from("generation,total_score,best_score,mean_score\n");
        for record in &self.generations {
            csv.push_str(&format!(
                "{},{},{},{}\n",
                record.generation, record.total_score, record.best_score, record.mean_score
            ));
        }
        std::fs::write(path, csv)
    }
}
