use anyhow::Context;
use backprop::{Activator, Logging, Network, TrainConfig};
use clap::Parser;
use ndarray::Array2;
use ndarray_rand::rand_distr::{Distribution, Normal};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Trains a 2-3-1 network to separate two noisy concentric circles.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number of points to generate.
    #[arg(long, default_value_t = 500)]
    samples: usize,

    /// Radius of the inner circle relative to the outer one.
    #[arg(long, default_value_t = 0.4)]
    factor: f64,

    /// Standard deviation of the gaussian noise added to every point.
    #[arg(long, default_value_t = 0.1)]
    noise: f64,

    /// Number of training rounds; the cost is logged after each.
    #[arg(long, default_value_t = 75)]
    frames: usize,

    /// Seed for both the dataset and the initial weights.
    #[arg(long, default_value_t = 1234)]
    seed: u64,

    /// JSON training configuration, applied to every frame.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured learning rate.
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Overrides the configured iterations per frame.
    #[arg(long)]
    iterations: Option<usize>,
}

/// Generates points on two circles, labelling the outer one 0 and the inner
/// one 1.
fn generate_data(
    num_samples: usize,
    factor: f64,
    noise: f64,
    rng: &mut StdRng,
) -> anyhow::Result<(Array2<f64>, Array2<f64>)> {
    let noise = Normal::new(0.0, noise).context("invalid noise level")?;
    let num_outer = num_samples / 2;
    let num_inner = num_samples - num_outer;

    let mut points = Vec::with_capacity(num_samples);
    for (count, radius, class) in [(num_outer, 1.0, 0.0), (num_inner, factor, 1.0)] {
        for i in 0..count {
            let theta = 2.0 * std::f64::consts::PI * i as f64 / count as f64;
            let x = radius * theta.cos() + noise.sample(rng);
            let y = radius * theta.sin() + noise.sample(rng);
            points.push(([x, y], class));
        }
    }
    points.shuffle(rng);

    let inputs = Array2::from_shape_fn((num_samples, 2), |(i, j)| points[i].0[j]);
    let labels = Array2::from_shape_fn((num_samples, 1), |(i, _)| points[i].1);
    Ok((inputs, labels))
}

fn accuracy(predictions: &Array2<f64>, labels: &Array2<f64>) -> f64 {
    let correct = predictions
        .iter()
        .zip(labels.iter())
        .filter(|&(&p, &l)| (p > 0.5) == (l > 0.5))
        .count();
    correct as f64 / labels.len().max(1) as f64
}

fn load_config(args: &Args) -> anyhow::Result<TrainConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => TrainConfig::default().iterations(5).logging(Logging::Silent),
    };
    if let Some(rate) = args.learning_rate {
        config.learning_rate = rate;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let (inputs, labels) = generate_data(args.samples, args.factor, args.noise, &mut rng)?;

    let mut network = Network::with_seed(args.seed);
    network
        .attach_layer(2, 3, Activator::TanH)?
        .attach_layer(3, 1, Activator::Sigmoid)?;

    info!(cost = network.cost(&inputs, &labels)?, "untrained");
    for frame in 1..=args.frames {
        let report = network.train_with(&inputs, &labels, &config)?;
        info!(frame, cost = report.final_cost, "frame");
    }

    let predictions = network.process(&inputs)?;
    info!(
        accuracy = accuracy(&predictions, &labels),
        cost = network.cost(&inputs, &labels)?,
        "finished"
    );
    Ok(())
}
