//! A minimal feedforward neural network engine.
//!
//! Networks are built by attaching fully connected layers in order, and
//! trained with full-batch gradient descent on matrices holding one
//! observation per row. See the `feed_forward` module for an example.

pub mod activator;
pub mod cost;
pub mod error;
pub mod feed_forward;
pub mod layer;
pub mod trainer;

mod utils;

pub use activator::Activator;
pub use cost::Cost;
pub use error::{Error, Result};
pub use feed_forward::{Network, Trace};
pub use layer::{Gradients, Layer};
pub use trainer::{Logging, StopCondition, TrainConfig, TrainReport};
