//! Cost functions comparing a prediction against its target.

use crate::error::{Error, Result};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pairwise cost function types.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cost {
    /// `(x - y)^2`, elementwise.
    #[default]
    SquaredError,
}

impl Cost {
    /// The name this cost function is looked up by.
    pub fn name(&self) -> &'static str {
        match *self {
            Cost::SquaredError => "squared_error",
        }
    }

    /// Elementwise cost of `prediction` against `target`.
    pub fn value(
        &self,
        prediction: &Array2<f64>,
        target: &Array2<f64>,
    ) -> Result<Array2<f64>> {
        check_shapes(prediction, target)?;
        match *self {
            Cost::SquaredError => {
                let diff = prediction - target;
                Ok(diff.mapv(|d| d * d))
            }
        }
    }

    /// Elementwise derivative of the cost with respect to `prediction`.
    pub fn derivative(
        &self,
        prediction: &Array2<f64>,
        target: &Array2<f64>,
    ) -> Result<Array2<f64>> {
        check_shapes(prediction, target)?;
        match *self {
            Cost::SquaredError => Ok(2.0 * (prediction - target)),
        }
    }

    /// Mean of the elementwise cost over every observation and output.
    ///
    /// An empty prediction has a mean cost of zero.
    pub fn mean(
        &self,
        prediction: &Array2<f64>,
        target: &Array2<f64>,
    ) -> Result<f64> {
        Ok(self.value(prediction, target)?.mean().unwrap_or(0.0))
    }
}

fn check_shapes(prediction: &Array2<f64>, target: &Array2<f64>) -> Result<()> {
    if prediction.dim() != target.dim() {
        return Err(Error::shape("target", prediction.dim(), target.dim()));
    }
    Ok(())
}

impl FromStr for Cost {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "squared_error" | "squared-error" | "mse" => Ok(Cost::SquaredError),
            _ => Err(Error::UnknownCost(name.to_owned())),
        }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
