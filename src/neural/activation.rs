//! Activation functions for network neurons.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Activation applied to a neuron's accumulated inputs.
///
/// Every variant operates on the *sum* of the accumulated inputs and
/// saturates instead of overflowing: sigmoid tends to 0/1 and tanh to -1/1
/// at extreme sums.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Sigmoid,
    Tanh,
    /// 1 when the input sum is positive, 0 otherwise.
    Binary,
    Relu,
}

impl Activation {
    /// Apply the activation to the sum of accumulated inputs.
    pub fn apply(&self, inputs: &[f64]) -> f64 {
        let sum: f64 = inputs.iter().sum();

        match self {
            Self::Sigmoid => 1.0 / (1.0 + (-sum).exp()),
            // f64::tanh saturates to +/-1 where the textbook exponential
            // quotient would be inf/inf.
            Self::Tanh => sum.tanh(),
            Self::Binary => {
                if sum > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Relu => {
                if sum < 0.0 {
                    0.0
                } else {
                    sum
                }
            }
        }
    }

    /// Name used in configuration files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sigmoid => "sigmoid",
            Self::Tanh => "tanh",
            Self::Binary => "binary",
            Self::Relu => "relu",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sigmoid" => Ok(Self::Sigmoid),
            "tanh" => Ok(Self::Tanh),
            "binary" => Ok(Self::Binary),
            "relu" => Ok(Self::Relu),
            other => Err(format!("unknown activation function: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_values() {
        assert!((Activation::Sigmoid.apply(&[0.0]) - 0.5).abs() < 1e-12);
        assert!((Activation::Sigmoid.apply(&[1.0]) - 0.7310585786300049).abs() < 1e-12);

        // Sum of inputs, not per-input application.
        let split = Activation::Sigmoid.apply(&[0.5, 0.5]);
        let whole = Activation::Sigmoid.apply(&[1.0]);
        assert!((split - whole).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_saturation() {
        assert_eq!(Activation::Sigmoid.apply(&[1e6]), 1.0);
        assert_eq!(Activation::Sigmoid.apply(&[-1e6]), 0.0);
    }

    #[test]
    fn test_tanh_saturation() {
        assert_eq!(Activation::Tanh.apply(&[1e6]), 1.0);
        assert_eq!(Activation::Tanh.apply(&[-1e6]), -1.0);
        assert!(Activation::Tanh.apply(&[0.5]).is_finite());
    }

    #[test]
    fn test_binary_step() {
        assert_eq!(Activation::Binary.apply(&[0.1]), 1.0);
        assert_eq!(Activation::Binary.apply(&[0.0]), 0.0);
        assert_eq!(Activation::Binary.apply(&[-0.1]), 0.0);
    }

    #[test]
    fn test_relu() {
        assert_eq!(Activation::Relu.apply(&[-2.0]), 0.0);
        assert_eq!(Activation::Relu.apply(&[0.0]), 0.0);
        assert_eq!(Activation::Relu.apply(&[1.5, 0.5]), 2.0);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("sigmoid".parse::<Activation>().unwrap(), Activation::Sigmoid);
        assert_eq!("tanh".parse::<Activation>().unwrap(), Activation::Tanh);
        assert_eq!("binary".parse::<Activation>().unwrap(), Activation::Binary);
        assert_eq!("relu".parse::<Activation>().unwrap(), Activation::Relu);

        assert!("softmax".parse::<Activation>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let yaml = serde_yaml::to_string(&Activation::Binary).unwrap();
        assert_eq!(yaml.trim(), "binary");

        let parsed: Activation = serde_yaml::from_str("relu").unwrap();
        assert_eq!(parsed, Activation::Relu);
    }
}
