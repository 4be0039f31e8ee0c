//! Neural network module: representation, forward pass, genetic operators.
//!
//! Networks are fixed-topology, fully-connected and strictly feed-forward.
//! The genetic operators exchange and perturb whole genes (a neuron's bias
//! plus its outgoing weights) over the layer-major gene ordering.

mod activation;
mod crossover;
mod mutations;
mod network;

pub use activation::Activation;
pub use crossover::BreedingStrategy;
pub use mutations::MutationMode;
pub use network::{Connection, Network, Neuron, PredictError, PARAM_RANGE};
