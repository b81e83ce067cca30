use crate::activator::Activator;
use crate::error::{Error, Result};
use crate::utils::{AllFinite, ZeroOut};

use ndarray::{Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

/// A wrapper for a single fully connected layer of the neural network
///
/// Weights are stored as an `inputs x outputs` matrix, so a batch of
/// observations (one per row) is fed forward with a single product.
#[derive(Clone, Debug)]
pub struct Layer {
    /// The activation function to be used for every neuron in the layer.
    activator: Activator,
    /// The network weights, with each neuron's weights stored as a column.
    weights: Array2<f64>,
    /// One bias per neuron, stored as a single row.
    bias: Array2<f64>,
    weight_gradient: Array2<f64>,
    bias_gradient: Array2<f64>,
}

/// The gradients of the cost with respect to one layer's parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradients {
    /// Same shape as the layer weights.
    pub weights: Array2<f64>,
    /// Same shape as the layer bias.
    pub bias: Array2<f64>,
}

impl Gradients {
    /// Returns true if no entry is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.weights.all_finite() && self.bias.all_finite()
    }
}

impl Layer {
    /// Initializes a new, untrained layer.
    ///
    /// Arguments:
    ///
    ///  * `inputs` - the number of inputs to this layer.
    ///  * `outputs` - the number of outputs from this layer.
    ///  * `activator` - the activation function to be used for this layer's
    ///                  output.
    ///  * `rng` - the source for the initial weights and biases, drawn
    ///            uniformly from `[0, 1)`.
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        outputs: usize,
        activator: Activator,
        rng: &mut R,
    ) -> Result<Self> {
        if inputs == 0 || outputs == 0 {
            return Err(Error::InvalidWidth { inputs, outputs });
        }
        let weights = Array2::random_using((inputs, outputs), Uniform::new(0.0, 1.0), rng);
        let bias = Array2::random_using((1, outputs), Uniform::new(0.0, 1.0), rng);
        Ok(Layer {
            activator,
            weights,
            bias,
            weight_gradient: Array2::zeros((inputs, outputs)),
            bias_gradient: Array2::zeros((1, outputs)),
        })
    }

    /// Builds a layer from explicit parameters.
    ///
    /// `weights` must be `inputs x outputs` and `bias` must be `1 x outputs`.
    pub fn from_parameters(
        weights: Array2<f64>,
        bias: Array2<f64>,
        activator: Activator,
    ) -> Result<Self> {
        let (inputs, outputs) = weights.dim();
        if inputs == 0 || outputs == 0 {
            return Err(Error::InvalidWidth { inputs, outputs });
        }
        if bias.dim() != (1, outputs) {
            return Err(Error::shape("bias", (1, outputs), bias.dim()));
        }
        Ok(Layer {
            activator,
            weight_gradient: Array2::zeros(weights.raw_dim()),
            bias_gradient: Array2::zeros(bias.raw_dim()),
            weights,
            bias,
        })
    }

    /// Returns the number of inputs to this layer.
    pub fn input_len(&self) -> usize {
        self.weights.nrows()
    }

    /// Returns the number of outputs from this layer.
    pub fn output_len(&self) -> usize {
        self.weights.ncols()
    }

    /// Returns the activation function applied to this layer's output.
    pub fn activator(&self) -> Activator {
        self.activator
    }

    /// Returns the `inputs x outputs` weight matrix.
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Returns the `1 x outputs` bias row.
    pub fn bias(&self) -> &Array2<f64> {
        &self.bias
    }

    /// Returns the last stored gradient of the weights.
    pub fn weight_gradient(&self) -> &Array2<f64> {
        &self.weight_gradient
    }

    /// Returns the last stored gradient of the bias.
    pub fn bias_gradient(&self) -> &Array2<f64> {
        &self.bias_gradient
    }

    /// Sets both gradient accumulators back to zero.
    pub fn reset_gradients(&mut self) {
        self.weight_gradient.zero_out();
        self.bias_gradient.zero_out();
    }

    /// Feeds the provided `inputs` forward through the layer.
    ///
    /// `inputs` holds one observation per row. Returns the pre-activation
    /// `z = inputs . weights + bias` and the activated output `f(z)`, both
    /// of shape `observations x outputs`.
    pub fn forward(&self, inputs: &Array2<f64>) -> Result<(Array2<f64>, Array2<f64>)> {
        if inputs.ncols() != self.input_len() {
            return Err(Error::shape(
                "layer input",
                (inputs.nrows(), self.input_len()),
                inputs.dim(),
            ));
        }
        let z = inputs.dot(&self.weights) + &self.bias;
        let a = self.activator.value(&z);
        Ok((z, a))
    }

    /// Computes this layer's gradients and the error signal for the layer
    /// before it.
    ///
    /// Arguments:
    ///
    ///  * `inputs` - the activations this layer was fed in the forward pass.
    ///  * `z` - this layer's pre-activation from the same forward pass.
    ///  * `output_errors` - the derivative of the cost with respect to this
    ///                      layer's output.
    ///
    /// The returned error signal is propagated through the current weights,
    /// so it must be computed before those weights are updated.
    pub(crate) fn backward(
        &self,
        inputs: &Array2<f64>,
        z: &Array2<f64>,
        output_errors: &Array2<f64>,
    ) -> (Gradients, Array2<f64>) {
        let delta = output_errors * &self.activator.derivative(z);
        let input_errors = delta.dot(&self.weights.t());
        let gradients = Gradients {
            weights: inputs.t().dot(&delta),
            bias: delta.sum_axis(Axis(0)).insert_axis(Axis(0)),
        };
        (gradients, input_errors)
    }

    /// Stores freshly computed gradients in the accumulators.
    pub(crate) fn set_gradients(&mut self, gradients: Gradients) {
        debug_assert_eq!(gradients.weights.dim(), self.weights.dim());
        debug_assert_eq!(gradients.bias.dim(), self.bias.dim());
        self.weight_gradient = gradients.weights;
        self.bias_gradient = gradients.bias;
    }

    /// Takes one gradient descent step of size `learning_rate`.
    ///
    /// With zeroed gradients this leaves the parameters untouched.
    pub fn update_parameters(&mut self, learning_rate: f64) {
        self.weights.scaled_add(-learning_rate, &self.weight_gradient);
        self.bias.scaled_add(-learning_rate, &self.bias_gradient);
    }

    /// Returns true if no weight or bias is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.weights.all_finite() && self.bias.all_finite()
    }
}
