use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::math::tensor::Tensor;

/// Inverted dropout: during training each unit is zeroed with probability
/// `rate` and survivors are scaled by `1 / (1 - rate)`, so inference is the
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dropout {
    pub rate: f64,
    #[serde(skip)]
    mask: Vec<f64>,
}

impl Dropout {
    pub fn new(rate: f64) -> Dropout {
        assert!((0.0..1.0).contains(&rate), "dropout rate must be in [0, 1)");
        Dropout { rate, mask: Vec::new() }
    }

    pub fn forward(&self, input: &Tensor) -> Tensor {
        input.clone()
    }

    pub fn forward_train<R: Rng + ?Sized>(&mut self, input: &Tensor, rng: &mut R) -> Tensor {
        let scale = 1.0 / (1.0 - self.rate);
        self.mask = (0..input.len())
            .map(|_| if rng.gen::<f64>() < self.rate { 0.0 } else { scale })
            .collect();
        Tensor {
            shape: input.shape.clone(),
            data: input.data.iter().zip(&self.mask).map(|(x, m)| x * m).collect(),
        }
    }

    pub fn backward(&mut self, grad_output: &Tensor) -> Tensor {
        Tensor {
            shape: grad_output.shape.clone(),
            data: grad_output.data.iter().zip(&self.mask).map(|(g, m)| g * m).collect(),
        }
    }
}
