use serde::{Serialize, Deserialize};

use crate::error::{Result, XrayError};
use crate::math::tensor::Tensor;

/// Non-overlapping max pooling (stride = pool size). Trailing rows/columns
/// that do not fill a whole window are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxPool2d {
    pub pool_size: usize,
    #[serde(skip)]
    input_shape: Vec<usize>,
    /// Flat input index that won each output cell during the last training pass.
    #[serde(skip)]
    winners: Vec<usize>,
}

impl MaxPool2d {
    pub fn new(pool_size: usize) -> MaxPool2d {
        MaxPool2d { pool_size, input_shape: Vec::new(), winners: Vec::new() }
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        if input_shape.len() != 3 {
            return Err(XrayError::ShapeMismatch { what: "max-pool input rank", got: input_shape.len(), expected: 3 });
        }
        let p = self.pool_size;
        if p == 0 {
            return Err(XrayError::InvalidModel("max-pool size must be at least 1".to_string()));
        }
        let smallest = input_shape[0].min(input_shape[1]);
        if smallest < p {
            return Err(XrayError::ShapeMismatch { what: "max-pool spatial size", got: smallest, expected: p });
        }
        Ok(vec![input_shape[0] / p, input_shape[1] / p, input_shape[2]])
    }

    fn pool(&self, input: &Tensor) -> Result<(Tensor, Vec<usize>)> {
        let out_shape = self.output_shape(&input.shape)?;
        let p = self.pool_size;
        let mut out = Tensor::zeros(&out_shape);
        let mut winners = vec![0; out.len()];

        for y in 0..out_shape[0] {
            for x in 0..out_shape[1] {
                for c in 0..out_shape[2] {
                    let mut best_idx = input.hwc_offset(y * p, x * p, c);
                    for dy in 0..p {
                        for dx in 0..p {
                            let idx = input.hwc_offset(y * p + dy, x * p + dx, c);
                            if input.data[idx] > input.data[best_idx] {
                                best_idx = idx;
                            }
                        }
                    }
                    let o = out.hwc_offset(y, x, c);
                    out.data[o] = input.data[best_idx];
                    winners[o] = best_idx;
                }
            }
        }
        Ok((out, winners))
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        Ok(self.pool(input)?.0)
    }

    pub fn forward_train(&mut self, input: &Tensor) -> Result<Tensor> {
        let (out, winners) = self.pool(input)?;
        self.input_shape = input.shape.clone();
        self.winners = winners;
        Ok(out)
    }

    /// Routes each output gradient back to the input cell that won the max.
    pub fn backward(&mut self, grad_output: &Tensor) -> Tensor {
        let mut grad_input = Tensor::zeros(&self.input_shape);
        for (&idx, g) in self.winners.iter().zip(&grad_output.data) {
            grad_input.data[idx] += g;
        }
        grad_input
    }
}
