//! A [Feedforward neural network]
//! (https://en.wikipedia.org/wiki/Feedforward_neural_network).
//!
//! # Example
//!
//! Let's train a small network to separate two points:
//!
//! ```
//! # use backprop::feed_forward::*;
//! # use ndarray::array;
//! let x = array![[0.0, 0.0], [1.0, 1.0]];
//! let y = array![[0.0], [1.0]];
//!
//! let mut network = Network::with_seed(1234);
//! network
//!     .attach_layer(2, 3, Activator::TanH)?
//!     .attach_layer(3, 1, Activator::Sigmoid)?;
//!
//! let before = network.cost(&x, &y)?;
//! network.train(&x, &y, 0.1, 500)?;
//! assert!(network.cost(&x, &y)? < before);
//!
//! let predictions = network.process(&x)?;
//! assert_eq!(predictions.dim(), (2, 1));
//! # Ok::<(), backprop::Error>(())
//! ```

pub use crate::activator::Activator;
pub use crate::cost::Cost;
pub use crate::layer::{Gradients, Layer};

use crate::error::{Error, Result};
use crate::trainer::{TrainConfig, TrainReport};

use itertools::Itertools;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::debug;

/// A Feedforward neural network
#[derive(Clone, Debug)]
pub struct Network {
    layers: Vec<Layer>,
    cost: Cost,
    /// Source of initial parameters for attached layers.
    rng: StdRng,
}

/// The intermediate values of one forward pass.
///
/// `activations[0]` is the network input and `activations[i + 1]` is the
/// output of layer `i`; `pre_activations[i]` is layer `i`'s `z`.
#[derive(Clone, Debug)]
pub struct Trace {
    pub pre_activations: Vec<Array2<f64>>,
    pub activations: Vec<Array2<f64>>,
}

impl Trace {
    /// The output of the last layer, or the input for an empty network.
    pub fn output(&self) -> &Array2<f64> {
        // There is always at least the input.
        &self.activations[self.activations.len() - 1]
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::new()
    }
}

impl Network {
    /// Creates an empty network using the squared error cost, with initial
    /// weights drawn from an entropy-seeded generator.
    pub fn new() -> Self {
        Network::from_rng(Cost::default(), StdRng::from_entropy())
    }

    /// Creates an empty network whose layers are initialized from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Network::from_rng(Cost::default(), StdRng::seed_from_u64(seed))
    }

    /// Replaces the cost function.
    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }

    /// Creates an empty network using the cost function called `name`.
    pub fn from_cost_name(name: &str) -> Result<Self> {
        Ok(Network::new().with_cost(name.parse()?))
    }

    fn from_rng(cost: Cost, rng: StdRng) -> Self {
        Network {
            layers: Vec::new(),
            cost,
            rng,
        }
    }

    /// Appends a new, randomly initialized layer.
    ///
    /// This does not verify that `inputs` matches the previous layer's
    /// outputs; a broken chain is reported as a shape mismatch on the first
    /// forward pass. Use `try_attach_layer` or `validate` to check eagerly.
    /// `Activator::default()` is Sigmoid; see also `attach_default_layer`.
    pub fn attach_layer(
        &mut self,
        inputs: usize,
        outputs: usize,
        activator: Activator,
    ) -> Result<&mut Self> {
        let layer = Layer::new(inputs, outputs, activator, &mut self.rng)?;
        Ok(self.push_layer(layer))
    }

    /// Appends a new, randomly initialized layer using the default
    /// activation function, `Activator::Sigmoid`.
    pub fn attach_default_layer(&mut self, inputs: usize, outputs: usize) -> Result<&mut Self> {
        self.attach_layer(inputs, outputs, Activator::default())
    }

    /// Appends a new layer using the activation function called `name`.
    pub fn attach_layer_named(
        &mut self,
        inputs: usize,
        outputs: usize,
        name: &str,
    ) -> Result<&mut Self> {
        let activator = name.parse()?;
        let layer = Layer::new(inputs, outputs, activator, &mut self.rng)?;
        Ok(self.push_layer(layer))
    }

    /// Appends a new layer after checking that it chains onto the last one.
    pub fn try_attach_layer(
        &mut self,
        inputs: usize,
        outputs: usize,
        activator: Activator,
    ) -> Result<&mut Self> {
        if let Some(last) = self.layers.last() {
            if last.output_len() != inputs {
                return Err(Error::LayerChain {
                    layer: self.layers.len(),
                    expected: last.output_len(),
                    actual: inputs,
                });
            }
        }
        let layer = Layer::new(inputs, outputs, activator, &mut self.rng)?;
        Ok(self.push_layer(layer))
    }

    /// Appends an already built layer.
    pub fn push_layer(&mut self, layer: Layer) -> &mut Self {
        debug!(
            index = self.layers.len(),
            inputs = layer.input_len(),
            outputs = layer.output_len(),
            activator = %layer.activator(),
            "attached layer"
        );
        self.layers.push(layer);
        self
    }

    /// Checks that every layer takes as many inputs as the one before it
    /// produces.
    pub fn validate(&self) -> Result<()> {
        for (i, (prev, next)) in self.layers.iter().tuple_windows().enumerate() {
            if prev.output_len() != next.input_len() {
                return Err(Error::LayerChain {
                    layer: i + 1,
                    expected: prev.output_len(),
                    actual: next.input_len(),
                });
            }
        }
        Ok(())
    }

    /// Returns the cost function the network is trained against.
    pub fn cost_function(&self) -> Cost {
        self.cost
    }

    /// Returns the layers of the network, input layer first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Returns the number of layers in the network.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if no layer has been attached yet.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Returns the size of the input layer to the network, if it has one.
    pub fn input_len(&self) -> Option<usize> {
        self.layers.first().map(Layer::input_len)
    }

    /// Returns the size of the output layer from the network, if it has one.
    pub fn output_len(&self) -> Option<usize> {
        self.layers.last().map(Layer::output_len)
    }

    /// Returns true if every parameter of every layer is finite.
    pub fn is_finite(&self) -> bool {
        self.layers.iter().all(Layer::is_finite)
    }

    /// Feeds the provided `input` through the network, returning the output
    /// layer.
    ///
    /// An empty network returns its input unchanged.
    pub fn process(&self, input: &Array2<f64>) -> Result<Array2<f64>> {
        let mut output = input.clone();
        for layer in &self.layers {
            output = layer.forward(&output)?.1;
        }
        Ok(output)
    }

    /// Feeds the provided `input` through the network, returning the
    /// pre-activation and activated values for each layer.
    pub fn trace(&self, input: &Array2<f64>) -> Result<Trace> {
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.clone());
        for layer in &self.layers {
            let (z, a) = layer.forward(&activations[activations.len() - 1])?;
            pre_activations.push(z);
            activations.push(a);
        }
        Ok(Trace {
            pre_activations,
            activations,
        })
    }

    /// Returns the mean cost over every observation and output.
    pub fn cost(&self, input: &Array2<f64>, expected: &Array2<f64>) -> Result<f64> {
        self.cost.mean(&self.process(input)?, expected)
    }

    /// Zeroes the gradient accumulators of every layer.
    pub fn reset_gradients(&mut self) {
        for layer in &mut self.layers {
            layer.reset_gradients();
        }
    }

    /// Computes the gradients of every layer for one full batch without
    /// touching the network.
    ///
    /// The result is indexed like `layers()`. Gradients are taken of the
    /// summed elementwise cost, not of its mean.
    pub fn gradients(
        &self,
        input: &Array2<f64>,
        expected: &Array2<f64>,
    ) -> Result<Vec<Gradients>> {
        let trace = self.trace(input)?;
        self.feed_backwards(&trace, expected)
    }

    /// Feeds the provided `expected` value back through a recorded forward
    /// pass, returning the gradients for each layer.
    fn feed_backwards(
        &self,
        trace: &Trace,
        expected: &Array2<f64>,
    ) -> Result<Vec<Gradients>> {
        let mut errors = self.cost.derivative(trace.output(), expected)?;
        let mut gradients = Vec::with_capacity(self.layers.len());
        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (layer_gradients, input_errors) = layer.backward(
                &trace.activations[i],
                &trace.pre_activations[i],
                &errors,
            );
            gradients.push(layer_gradients);
            errors = input_errors;
        }
        gradients.reverse();
        Ok(gradients)
    }

    /// Recomputes the gradients of every layer from one forward pass.
    ///
    /// All gradients are computed against the current weights before any of
    /// them is stored, so on error nothing is written.
    pub fn update_gradients(
        &mut self,
        input: &Array2<f64>,
        expected: &Array2<f64>,
    ) -> Result<()> {
        let gradients = self.gradients(input, expected)?;
        self.store_gradients(gradients);
        Ok(())
    }

    fn store_gradients(&mut self, gradients: Vec<Gradients>) {
        for (layer, layer_gradients) in self.layers.iter_mut().zip(gradients) {
            layer.set_gradients(layer_gradients);
        }
    }

    /// Takes one gradient descent step on every layer.
    pub fn update_parameters(&mut self, learning_rate: f64) {
        for layer in &mut self.layers {
            layer.update_parameters(learning_rate);
        }
    }

    /// Trains the network with `iterations` full-batch gradient descent
    /// steps.
    ///
    /// Shapes are checked before the first step, so on error the network is
    /// left as it was.
    pub fn train(
        &mut self,
        input: &Array2<f64>,
        expected: &Array2<f64>,
        learning_rate: f64,
        iterations: usize,
    ) -> Result<()> {
        self.check_batch(input, expected)?;
        for _ in 0..iterations {
            self.step(input, expected, learning_rate)?;
        }
        Ok(())
    }

    /// Trains the network as described by `config`.
    pub fn train_with(
        &mut self,
        input: &Array2<f64>,
        expected: &Array2<f64>,
        config: &TrainConfig,
    ) -> Result<TrainReport> {
        self.check_batch(input, expected)?;

        let start_time = Instant::now();
        let mut report = TrainReport::default();
        let mut training_error = self.cost(input, expected)?;
        report.record(0, training_error, config.history_every);

        while report.iterations < config.iterations
            && !config.stop.should_stop(training_error, start_time)
        {
            let gradients = self.gradients(input, expected)?;
            if config.check_finite && !gradients.iter().all(Gradients::is_finite) {
                return Err(Error::NonFinite {
                    iteration: report.iterations + 1,
                });
            }
            self.reset_gradients();
            self.store_gradients(gradients);
            self.update_parameters(config.learning_rate);
            report.iterations += 1;

            training_error = self.cost(input, expected)?;
            report.record(report.iterations, training_error, config.history_every);
            config.logging.iteration(report.iterations, training_error);
        }

        report.final_cost = training_error;
        config
            .logging
            .completion(report.iterations, training_error, start_time);
        Ok(report)
    }

    fn step(
        &mut self,
        input: &Array2<f64>,
        expected: &Array2<f64>,
        learning_rate: f64,
    ) -> Result<()> {
        self.reset_gradients();
        self.update_gradients(input, expected)?;
        self.update_parameters(learning_rate);
        Ok(())
    }

    /// Verifies that a training batch fits the network, returning an error
    /// if something is wrong.
    fn check_batch(&self, input: &Array2<f64>, expected: &Array2<f64>) -> Result<()> {
        if let Some(width) = self.input_len() {
            if input.ncols() != width {
                return Err(Error::shape(
                    "network input",
                    (input.nrows(), width),
                    input.dim(),
                ));
            }
        }
        self.validate()?;
        let width = self.output_len().unwrap_or_else(|| input.ncols());
        if expected.dim() != (input.nrows(), width) {
            return Err(Error::shape("target", (input.nrows(), width), expected.dim()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn two_layer() -> Network {
        let mut network = Network::with_seed(42);
        network
            .attach_layer(2, 3, Activator::TanH)
            .unwrap()
            .attach_layer(3, 1, Activator::Sigmoid)
            .unwrap();
        network
    }

    #[test]
    fn empty_network_is_identity() {
        let network = Network::new();
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(network.process(&x).unwrap(), x);
        assert_eq!(network.input_len(), None);
    }

    #[test]
    fn same_seed_same_network() {
        let a = two_layer();
        let b = two_layer();
        for (la, lb) in a.layers().iter().zip(b.layers()) {
            assert_eq!(la.weights(), lb.weights());
            assert_eq!(la.bias(), lb.bias());
        }
    }

    #[test]
    fn named_layers() {
        let mut network = Network::with_seed(1);
        network.attach_layer_named(2, 4, "relu").unwrap();
        assert_eq!(network.layers()[0].activator(), Activator::ReLU);
        assert_eq!(
            network.attach_layer_named(4, 1, "swish").unwrap_err(),
            Error::UnknownActivation("swish".into())
        );
        assert_eq!(network.len(), 1);
    }

    #[test]
    fn unknown_cost_name() {
        assert_eq!(
            Network::from_cost_name("hinge").unwrap_err(),
            Error::UnknownCost("hinge".into())
        );
        assert_eq!(
            Network::from_cost_name("squared_error").unwrap().cost_function(),
            Cost::SquaredError
        );
    }

    #[test]
    fn validated_attach() {
        let mut network = Network::with_seed(1);
        network.try_attach_layer(2, 3, Activator::TanH).unwrap();
        assert_eq!(
            network.try_attach_layer(4, 1, Activator::Sigmoid).unwrap_err(),
            Error::LayerChain {
                layer: 1,
                expected: 3,
                actual: 4
            }
        );
        assert_eq!(network.len(), 1);
    }

    #[test]
    fn validate_reports_broken_chain() {
        let mut network = Network::with_seed(1);
        network
            .attach_layer(2, 3, Activator::TanH)
            .unwrap()
            .attach_layer(3, 2, Activator::TanH)
            .unwrap()
            .attach_layer(5, 1, Activator::Sigmoid)
            .unwrap();
        assert_eq!(
            network.validate().unwrap_err(),
            Error::LayerChain {
                layer: 2,
                expected: 2,
                actual: 5
            }
        );
        assert!(network.process(&Array2::zeros((1, 2))).is_err());
    }

    #[test]
    fn trace_records_every_layer() {
        let network = two_layer();
        let x = array![[0.0, 1.0], [1.0, 0.0], [0.5, 0.5]];
        let trace = network.trace(&x).unwrap();
        assert_eq!(trace.pre_activations.len(), 2);
        assert_eq!(trace.activations.len(), 3);
        assert_eq!(trace.activations[0], x);
        assert_eq!(trace.pre_activations[0].dim(), (3, 3));
        assert_eq!(trace.output(), &network.process(&x).unwrap());
    }

    #[test]
    fn wrong_input_width() {
        let network = two_layer();
        let err = network.process(&Array2::zeros((4, 3))).unwrap_err();
        assert_eq!(err, Error::shape("layer input", (4, 2), (4, 3)));
    }

    #[test]
    fn wrong_target_shape_leaves_network_untouched() {
        let mut network = two_layer();
        let before = network.clone();
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let y = array![[0.0, 1.0]];
        assert!(network.cost(&x, &y).is_err());
        assert!(network.update_gradients(&x, &y).is_err());
        assert!(network.train(&x, &y, 0.1, 10).is_err());
        for (after, before) in network.layers().iter().zip(before.layers()) {
            assert_eq!(after.weights(), before.weights());
            assert_eq!(after.weight_gradient(), before.weight_gradient());
        }
    }

    #[test]
    fn update_gradients_stores_gradients() {
        let mut network = two_layer();
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let y = array![[0.0], [1.0]];
        let expected = network.gradients(&x, &y).unwrap();
        network.update_gradients(&x, &y).unwrap();
        for (layer, gradients) in network.layers().iter().zip(&expected) {
            assert_eq!(layer.weight_gradient(), &gradients.weights);
            assert_eq!(layer.bias_gradient(), &gradients.bias);
        }
        network.reset_gradients();
        assert!(network
            .layers()
            .iter()
            .all(|l| l.weight_gradient().iter().all(|&g| g == 0.0)));
    }

    #[test]
    fn single_layer_gradient_by_hand() {
        // One identity-like ReLU neuron with positive pre-activations, so
        // delta = 2 * (a - y).
        let mut network = Network::with_seed(0);
        network.push_layer(
            Layer::from_parameters(array![[1.0], [1.0]], array![[0.0]], Activator::ReLU)
                .unwrap(),
        );
        let x = array![[1.0, 2.0], [3.0, 1.0]];
        let y = array![[2.0], [5.0]];
        // a = [3, 4], delta = [2, -2]
        let gradients = network.gradients(&x, &y).unwrap();
        assert_eq!(gradients[0].bias, array![[0.0]]);
        assert_eq!(gradients[0].weights, array![[2.0 - 6.0], [4.0 - 2.0]]);
    }

    #[test]
    fn train_with_records_history() {
        let mut network = two_layer();
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let y = array![[0.0], [1.0]];
        let config = TrainConfig::default()
            .learning_rate(0.1)
            .iterations(100)
            .history_every(25);
        let report = network.train_with(&x, &y, &config).unwrap();
        assert_eq!(report.iterations, 100);
        let points: Vec<usize> = report.history.iter().map(|&(i, _)| i).collect();
        assert_eq!(points, vec![0, 25, 50, 75, 100]);
        assert_abs_diff_eq!(
            report.final_cost,
            network.cost(&x, &y).unwrap(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn train_with_stops_below_threshold() {
        let mut network = two_layer();
        let x = array![[0.0, 0.0], [1.0, 1.0]];
        let y = array![[0.0], [1.0]];
        let config = TrainConfig::default()
            .learning_rate(0.5)
            .iterations(10_000)
            .stop_condition(crate::trainer::StopCondition::ErrorThreshold(0.05));
        let report = network.train_with(&x, &y, &config).unwrap();
        assert!(report.iterations < 10_000);
        assert!(report.final_cost < 0.05);
    }

    #[test]
    fn non_finite_gradients_are_caught() {
        let mut network = Network::with_seed(3);
        network.push_layer(
            Layer::from_parameters(array![[1.0]], array![[0.0]], Activator::ReLU).unwrap(),
        );
        let x = array![[1.0]];
        // a = 1, delta = 2 * (1 - 0)
        network.update_gradients(&x, &array![[0.0]]).unwrap();
        assert_eq!(network.layers()[0].weight_gradient(), &array![[2.0]]);
        let before = network.clone();

        let y = array![[f64::NAN]];
        let config = TrainConfig::default().check_finite(true);
        assert_eq!(
            network.train_with(&x, &y, &config).unwrap_err(),
            Error::NonFinite { iteration: 1 }
        );
        let (after, before) = (&network.layers()[0], &before.layers()[0]);
        assert_eq!(after.weights(), before.weights());
        assert_eq!(after.bias(), before.bias());
        assert_eq!(after.weight_gradient(), &array![[2.0]]);
        assert_eq!(after.bias_gradient(), &array![[2.0]]);
    }

    #[test]
    fn default_layer_is_sigmoid() {
        let mut network = Network::with_seed(9);
        network
            .attach_default_layer(2, 3)
            .unwrap()
            .attach_default_layer(3, 1)
            .unwrap();
        assert!(network
            .layers()
            .iter()
            .all(|l| l.activator() == Activator::Sigmoid));
    }
}
