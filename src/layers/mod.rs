pub mod conv2d;
pub mod dense;
pub mod dropout;
pub mod flatten;
pub mod max_pool;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Result, XrayError};
use crate::math::tensor::Tensor;

pub use conv2d::Conv2d;
pub use dense::Dense;
pub use dropout::Dropout;
pub use flatten::Flatten;
pub use max_pool::MaxPool2d;

/// A trainable buffer paired with its accumulated gradient.
pub struct Param<'a> {
    pub values: &'a mut [f64],
    pub grads: &'a mut [f64],
}

/// One stage of a sequential network.
///
/// `forward` is the read-only inference path and never touches the training
/// caches, so a loaded model can be shared across threads behind an `Arc`.
/// `forward_train` caches what `backward` needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Layer {
    Conv2d(Conv2d),
    MaxPool2d(MaxPool2d),
    Flatten(Flatten),
    Dropout(Dropout),
    Dense(Dense),
}

impl Layer {
    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        match self {
            Layer::Conv2d(l) => l.forward(input),
            Layer::MaxPool2d(l) => l.forward(input),
            Layer::Flatten(l) => l.forward(input),
            Layer::Dropout(l) => Ok(l.forward(input)),
            Layer::Dense(l) => l.forward(input),
        }
    }

    pub fn forward_train<R: Rng + ?Sized>(&mut self, input: &Tensor, rng: &mut R) -> Result<Tensor> {
        match self {
            Layer::Conv2d(l) => l.forward_train(input),
            Layer::MaxPool2d(l) => l.forward_train(input),
            Layer::Flatten(l) => l.forward_train(input),
            Layer::Dropout(l) => Ok(l.forward_train(input, rng)),
            Layer::Dense(l) => l.forward_train(input),
        }
    }

    /// Takes ∂L/∂output, accumulates parameter gradients, returns ∂L/∂input.
    pub fn backward(&mut self, grad_output: &Tensor) -> Tensor {
        match self {
            Layer::Conv2d(l) => l.backward(grad_output),
            Layer::MaxPool2d(l) => l.backward(grad_output),
            Layer::Flatten(l) => l.backward(grad_output),
            Layer::Dropout(l) => l.backward(grad_output),
            Layer::Dense(l) => l.backward(grad_output),
        }
    }

    pub fn params_mut(&mut self) -> Vec<Param<'_>> {
        match self {
            Layer::Conv2d(l) => l.params_mut(),
            Layer::Dense(l) => l.params_mut(),
            _ => Vec::new(),
        }
    }

    /// Checks that stored parameter buffers match the declared dimensions.
    pub fn validate(&self) -> Result<()> {
        match self {
            Layer::Conv2d(l) => l.validate(),
            Layer::Dense(l) => l.validate(),
            _ => Ok(()),
        }
    }

    /// Output shape for a given input shape, without running the layer.
    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        match self {
            Layer::Conv2d(l) => l.output_shape(input_shape),
            Layer::MaxPool2d(l) => l.output_shape(input_shape),
            Layer::Flatten(_) => Ok(vec![input_shape.iter().product()]),
            Layer::Dropout(_) => Ok(input_shape.to_vec()),
            Layer::Dense(l) => {
                let n: usize = input_shape.iter().product();
                if n != l.input_size {
                    return Err(XrayError::ShapeMismatch {
                        what: "dense input",
                        got: n,
                        expected: l.input_size,
                    });
                }
                Ok(vec![l.size])
            }
        }
    }
}
