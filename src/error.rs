//! Error types shared by every module of the crate.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building, running or training a
/// network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A matrix did not have the shape an operation requires.
    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("unknown activation function: {0:?}")]
    UnknownActivation(String),

    #[error("unknown cost function: {0:?}")]
    UnknownCost(String),

    /// Layer `layer` takes `actual` inputs but the layer before it produces
    /// `expected` outputs.
    #[error("layer {layer} expects {actual} inputs, previous layer produces {expected}")]
    LayerChain {
        layer: usize,
        expected: usize,
        actual: usize,
    },

    #[error("layers need at least one input and one output, got {inputs}x{outputs}")]
    InvalidWidth { inputs: usize, outputs: usize },

    /// A gradient went NaN or infinite during training.
    #[error("non-finite gradient at iteration {iteration}")]
    NonFinite { iteration: usize },
}

impl Error {
    pub(crate) fn shape(
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        Error::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }
}
