//! Breeding strategies: genetic crossover between networks.
//!
//! All strategies operate on the layer-major, neuron-minor gene ordering.
//! One gene is one neuron's bias together with its outgoing weight set.
//! Parents are required to share a topology, which holds by construction:
//! every network in a population is built from the same configured layer
//! sizes.

use crate::neural::network::Network;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy used to combine two parents into a child.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreedingStrategy {
    /// One split point; genes before it come from the first parent, the
    /// rest from the second.
    #[default]
    SinglePoint,
    /// Two split points; genes strictly between them come from the second
    /// parent, the rest from the first.
    TwoPoint,
    /// Each gene is taken whole from a fair-coin parent.
    RandomGeneCopy,
    /// Asexual reproduction: the child is a copy of the first parent,
    /// left to mutation alone.
    CloneParent,
}

impl BreedingStrategy {
    /// Produce a child from two parents of identical topology.
    ///
    /// Genes are copied exactly; no interpolation.
    pub fn breed(&self, parent1: &Network, parent2: &Network, rng: &mut impl Rng) -> Network {
        match self {
            Self::SinglePoint => single_point(parent1, parent2, rng),
            Self::TwoPoint => two_point(parent1, parent2, rng),
            Self::RandomGeneCopy => random_gene_copy(parent1, parent2, rng),
            Self::CloneParent => parent1.clone(),
        }
    }

    /// Name used in configuration files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SinglePoint => "single_point",
            Self::TwoPoint => "two_point",
            Self::RandomGeneCopy => "random_gene_copy",
            Self::CloneParent => "clone_parent",
        }
    }
}

impl fmt::Display for BreedingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BreedingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_point" => Ok(Self::SinglePoint),
            "two_point" => Ok(Self::TwoPoint),
            "random_gene_copy" => Ok(Self::RandomGeneCopy),
            "clone_parent" => Ok(Self::CloneParent),
            other => Err(format!("unknown breeding strategy: {}", other)),
        }
    }
}

fn single_point(parent1: &Network, parent2: &Network, rng: &mut impl Rng) -> Network {
    let split = rng.gen_range(0..parent1.gene_count());
    crossover_by(parent1, parent2, |gene| gene >= split)
}

fn two_point(parent1: &Network, parent2: &Network, rng: &mut impl Rng) -> Network {
    let count = parent1.gene_count();
    let first = rng.gen_range(0..count);
    let second = rng.gen_range(0..count);
    let (lo, hi) = if first <= second {
        (first, second)
    } else {
        (second, first)
    };

    crossover_by(parent1, parent2, |gene| gene > lo && gene < hi)
}

fn random_gene_copy(parent1: &Network, parent2: &Network, rng: &mut impl Rng) -> Network {
    // The whole neuron moves together: bias and weight set share the coin.
    crossover_by(parent1, parent2, |_| rng.gen_bool(0.5))
}

/// Build a child from the first parent, replacing each gene for which
/// `from_second` holds with the second parent's bias and weights.
fn crossover_by(
    parent1: &Network,
    parent2: &Network,
    mut from_second: impl FnMut(usize) -> bool,
) -> Network {
    let mut child = parent1.clone();
    let mut gene = 0;

    for (layer_index, layer) in child.layers.iter_mut().enumerate() {
        for (neuron_index, neuron) in layer.iter_mut().enumerate() {
            if from_second(gene) {
                let donor = &parent2.layers[layer_index][neuron_index];

                neuron.bias = donor.bias;
                for (connection, donor_connection) in
                    neuron.connections.iter_mut().zip(&donor.connections)
                {
                    connection.weight = donor_connection.weight;
                }
            }

            gene += 1;
        }
    }

    child
}
