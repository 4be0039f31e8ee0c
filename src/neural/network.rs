//! Network structure and forward propagation.

use crate::neural::activation::Activation;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical range for every weight and bias.
pub const PARAM_RANGE: std::ops::RangeInclusive<f64> = -1.0..=1.0;

/// A weighted connection to a neuron in the immediately following layer.
///
/// Connections are stored as indices into the next layer's neuron list, so
/// cloning a network is a flat copy with no pointer graph to traverse.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connection {
    /// Index of the target neuron in the next layer.
    pub target: usize,
    pub weight: f64,
}

/// A single neuron with a firing threshold.
///
/// The bias is not an additive offset: it is a threshold on the
/// *post-activation* value. A neuron only propagates to the next layer when
/// its activation value exceeds its bias.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Neuron {
    pub bias: f64,
    pub connections: Vec<Connection>,
    /// Weighted inputs accumulated for the current prediction.
    #[serde(skip)]
    inputs: Vec<f64>,
    /// Activation value from the last `fire`.
    #[serde(skip)]
    value: f64,
}

impl Neuron {
    /// Create a neuron with the given firing threshold.
    pub fn new(bias: f64) -> Self {
        Self {
            bias,
            connections: Vec::new(),
            inputs: Vec::new(),
            value: 0.0,
        }
    }

    /// Create a neuron with a uniformly random threshold in [-1, 1].
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::new(rng.gen_range(PARAM_RANGE))
    }

    /// Append a weighted input for the current prediction.
    pub fn accumulate(&mut self, value: f64) {
        self.inputs.push(value);
    }

    /// Clear accumulated inputs.
    pub fn reset(&mut self) {
        self.inputs.clear();
    }

    /// Connect to the neuron at `target` in the next layer.
    pub fn connect(&mut self, target: usize, weight: f64) {
        self.connections.push(Connection { target, weight });
    }

    /// Connect with a uniformly random weight in [-1, 1].
    pub fn connect_random(&mut self, target: usize, rng: &mut impl Rng) {
        let weight = rng.gen_range(PARAM_RANGE);
        self.connect(target, weight);
    }

    /// Activate on the accumulated inputs and propagate into `next`.
    ///
    /// Propagation only happens when the activation value exceeds the bias
    /// threshold; the value is returned either way.
    pub fn fire(&mut self, activation: Activation, next: Option<&mut [Neuron]>) -> f64 {
        self.value = activation.apply(&self.inputs);

        if self.value > self.bias {
            if let Some(next) = next {
                for connection in &self.connections {
                    next[connection.target].inputs.push(self.value * connection.weight);
                }
            }
        }

        self.value
    }

    /// Activation value from the last `fire`.
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Errors from a forward pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictError {
    /// Input vector length does not match the input layer.
    DimensionMismatch { expected: usize, actual: usize },
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "input dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for PredictError {}

/// A fixed-topology, fully-connected feed-forward network.
///
/// Layers are ordered input first; every neuron of layer `i - 1` carries
/// exactly one connection to every neuron of layer `i`. Topology never
/// changes after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Network {
    /// Neuron counts per layer, input first, output last.
    pub layer_sizes: Vec<usize>,
    pub activation: Activation,
    pub layers: Vec<Vec<Neuron>>,
}

impl Network {
    /// Build a dense network with uniformly random weights and biases.
    pub fn random(layer_sizes: &[usize], activation: Activation, rng: &mut impl Rng) -> Self {
        let mut layers: Vec<Vec<Neuron>> = layer_sizes
            .iter()
            .map(|&count| (0..count).map(|_| Neuron::random(rng)).collect())
            .collect();

        // Connect every neuron to every neuron of the following layer.
        for layer_index in 1..layers.len() {
            let next_size = layer_sizes[layer_index];

            for neuron in &mut layers[layer_index - 1] {
                for target in 0..next_size {
                    neuron.connect_random(target, rng);
                }
            }
        }

        Self {
            layer_sizes: layer_sizes.to_vec(),
            activation,
            layers,
        }
    }

    /// Number of input neurons.
    pub fn n_inputs(&self) -> usize {
        self.layer_sizes.first().copied().unwrap_or(0)
    }

    /// Number of output neurons.
    pub fn n_outputs(&self) -> usize {
        self.layer_sizes.last().copied().unwrap_or(0)
    }

    /// Total neuron count, the length of the layer-major gene ordering.
    pub fn gene_count(&self) -> usize {
        self.layer_sizes.iter().sum()
    }

    /// Neuron at `gene` in the layer-major, neuron-minor ordering.
    pub fn neuron_mut(&mut self, gene: usize) -> Option<&mut Neuron> {
        let mut remaining = gene;

        for layer in &mut self.layers {
            if remaining < layer.len() {
                return Some(&mut layer[remaining]);
            }
            remaining -= layer.len();
        }

        None
    }

    /// Run a forward pass and return the output layer's activation values.
    ///
    /// The input values seed the first layer's accumulators one-to-one; the
    /// input layer still applies activation and threshold gating like any
    /// other layer. Output values are reported regardless of whether the
    /// output neurons exceed their own thresholds.
    pub fn predict(&mut self, input: &[f64]) -> Result<Vec<f64>, PredictError> {
        if input.len() != self.n_inputs() {
            return Err(PredictError::DimensionMismatch {
                expected: self.n_inputs(),
                actual: input.len(),
            });
        }

        let activation = self.activation;

        for layer in &mut self.layers {
            for neuron in layer {
                neuron.reset();
            }
        }

        for (neuron, &value) in self.layers[0].iter_mut().zip(input) {
            neuron.accumulate(value);
        }

        // Fire strictly layer by layer: a layer finishes before the next
        // one starts firing on its accumulated activations.
        for layer_index in 0..self.layers.len() {
            let (current, rest) = self.layers.split_at_mut(layer_index + 1);
            let mut next = rest.first_mut();

            for neuron in &mut current[layer_index] {
                neuron.fire(activation, next.as_deref_mut().map(Vec::as_mut_slice));
            }
        }

        let output = self.layers[self.layers.len() - 1]
            .iter()
            .map(|neuron| neuron.value())
            .collect();

        Ok(output)
    }

    /// Deep copy of all connection weights and biases, mirroring the
    /// layer/neuron structure. Used by the genetic operators.
    pub fn weights_and_biases(&self) -> (Vec<Vec<Vec<f64>>>, Vec<Vec<f64>>) {
        let mut weights = Vec::with_capacity(self.layers.len());
        let mut biases = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let layer_weights: Vec<Vec<f64>> = layer
                .iter()
                .map(|neuron| neuron.connections.iter().map(|c| c.weight).collect())
                .collect();
            let layer_biases: Vec<f64> = layer.iter().map(|neuron| neuron.bias).collect();

            weights.push(layer_weights);
            biases.push(layer_biases);
        }

        (weights, biases)
    }

    /// Total number of parameters (weights + biases).
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .flatten()
            .map(|neuron| neuron.connections.len() + 1)
            .sum()
    }

    /// Check that every weight and bias is finite and within [-1, 1].
    pub fn is_valid(&self) -> bool {
        self.layers.iter().flatten().all(|neuron| {
            PARAM_RANGE.contains(&neuron.bias)
                && neuron
                    .connections
                    .iter()
                    .all(|c| PARAM_RANGE.contains(&c.weight))
        })
    }
}
