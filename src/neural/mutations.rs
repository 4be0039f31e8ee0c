//! Mutation operators providing genetic variation.

use crate::neural::network::{Network, PARAM_RANGE};
use rand::Rng;
use rand_distr::StandardNormal;

/// Standard deviation of the Gaussian weight/bias perturbation.
const PERTURBATION_STD: f64 = 0.2;

/// How mutation is applied to a bred child.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationMode {
    /// One chance roll per network; when it hits, a fixed number of point
    /// mutations land on random neurons.
    Targeted { severity: usize },
    /// Every bias and weight rolls the chance independently.
    WholeGenome,
}

impl MutationMode {
    /// Mutate `network` in place. All resulting parameters stay in [-1, 1].
    pub fn mutate(&self, network: &mut Network, chance: f64, rng: &mut impl Rng) {
        match self {
            Self::Targeted { severity } => mutate_targeted(network, chance, *severity, rng),
            Self::WholeGenome => mutate_whole_genome(network, chance, rng),
        }
    }
}

fn mutate_targeted(network: &mut Network, chance: f64, severity: usize, rng: &mut impl Rng) {
    if rng.gen::<f64>() > chance {
        return;
    }

    let gene_count = network.gene_count();

    for _ in 0..severity {
        let gene = rng.gen_range(0..gene_count);
        let Some(neuron) = network.neuron_mut(gene) else {
            continue;
        };

        if rng.gen_bool(0.5) {
            // Reassign the bias outright.
            neuron.bias = rng.gen_range(PARAM_RANGE);
        } else {
            // Output-layer neurons have no outgoing connections; the
            // attempt still consumes one mutation from the budget.
            if neuron.connections.is_empty() {
                continue;
            }

            let index = rng.gen_range(0..neuron.connections.len());
            let delta: f64 = rng.sample(StandardNormal);
            let connection = &mut neuron.connections[index];
            connection.weight = (connection.weight + delta * PERTURBATION_STD).clamp(-1.0, 1.0);
        }
    }
}

fn mutate_whole_genome(network: &mut Network, chance: f64, rng: &mut impl Rng) {
    for layer in &mut network.layers {
        for neuron in layer {
            if rng.gen::<f64>() <= chance {
                let delta: f64 = rng.sample(StandardNormal);
                neuron.bias = (neuron.bias + delta * PERTURBATION_STD).clamp(-1.0, 1.0);
            }

            for connection in &mut neuron.connections {
                if rng.gen::<f64>() <= chance {
                    let delta: f64 = rng.sample(StandardNormal);
                    connection.weight =
                        (connection.weight + delta * PERTURBATION_STD).clamp(-1.0, 1.0);
                }
            }
        }
    }
}
