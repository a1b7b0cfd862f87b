use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::tensor::Tensor;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Flatten {
    #[serde(skip)]
    input_shape: Vec<usize>,
}

impl Flatten {
    pub fn new() -> Flatten {
        Flatten::default()
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        input.clone().reshape(&[input.len()])
    }

    pub fn forward_train(&mut self, input: &Tensor) -> Result<Tensor> {
        self.input_shape = input.shape.clone();
        self.forward(input)
    }

    pub fn backward(&mut self, grad_output: &Tensor) -> Tensor {
        Tensor { shape: self.input_shape.clone(), data: grad_output.data.clone() }
    }
}
