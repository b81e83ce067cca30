//! Activation function types.

use crate::error::{Error, Result};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// [Activation function](https://en.wikipedia.org/wiki/Activation_function)
/// types.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activator {
    /// Sigmoid function
    #[default]
    Sigmoid,
    /// Hyperbolic tan function
    TanH,
    /// Rectified Linear Unit
    ReLU,
}

impl Activator {
    /// Every supported activation, in registry order.
    pub const ALL: [Activator; 3] =
        [Activator::Sigmoid, Activator::TanH, Activator::ReLU];

    /// The name this activation is looked up by.
    pub fn name(&self) -> &'static str {
        match *self {
            Activator::Sigmoid => "sigmoid",
            Activator::TanH => "tanh",
            Activator::ReLU => "relu",
        }
    }

    /// Evaluates `f(x)` for the selected the activation function.
    pub fn f(&self, x: f64) -> f64 {
        match *self {
            Activator::Sigmoid => sigmoid(x),
            Activator::TanH => x.tanh(),
            Activator::ReLU => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
        }
    }

    /// Evaluates the derivative `f'(x)` at the pre-activation input `x`.
    ///
    /// The value function is recomputed from `x` rather than read back from
    /// the layer output, so the derivative is exact for every activation.
    pub fn fprime(&self, x: f64) -> f64 {
        match *self {
            Activator::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            Activator::TanH => {
                let t = x.tanh();
                1.0 - t * t
            }
            Activator::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Applies `f` to every element of `z`.
    pub fn value(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|x| self.f(x))
    }

    /// Applies `f'` to every element of the pre-activation matrix `z`.
    pub fn derivative(&self, z: &Array2<f64>) -> Array2<f64> {
        z.mapv(|x| self.fprime(x))
    }
}

/// Logistic function, split on the sign of `x` so `exp` never sees a large
/// positive argument.
fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

impl FromStr for Activator {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(Activator::Sigmoid),
            "tanh" => Ok(Activator::TanH),
            "relu" => Ok(Activator::ReLU),
            _ => Err(Error::UnknownActivation(name.to_owned())),
        }
    }
}

impl fmt::Display for Activator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
