use rand::{rngs::StdRng, SeedableRng};

use crate::config::TrainingConfig;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`: total number of full passes over the training data
/// - `batch_size`: samples per mini-batch; gradients are averaged per batch
/// - `learning_rate`: Adam step size
/// - `seed`: fixes shuffling, dropout masks and weight
///   initialization when set
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
}

impl TrainConfig {
    pub fn new(epochs: usize, batch_size: usize, learning_rate: f64) -> Self {
        TrainConfig { epochs, batch_size, learning_rate, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Random source for this run: seeded if `seed` is set, otherwise from
    /// OS entropy.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Default for TrainConfig {
    /// 10 epochs, batch size 32, Adam at 0.001.
    fn default() -> Self {
        TrainConfig::new(10, 32, 0.001)
    }
}

impl From<&TrainingConfig> for TrainConfig {
    fn from(cfg: &TrainingConfig) -> Self {
        TrainConfig {
            epochs: cfg.epochs,
            batch_size: cfg.batch_size,
            learning_rate: cfg.learning_rate,
            seed: cfg.seed,
        }
    }
}
