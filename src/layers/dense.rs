use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Result, XrayError};
use crate::layers::Param;
use crate::math::{init::glorot_uniform, tensor::Tensor};

/// Fully connected layer: `a = f(x·W + b)`.
///
/// `weights` is `input_size × size`, row-major, so the weight from input `i`
/// to neuron `o` sits at `i * size + o`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub size: usize,
    pub input_size: usize,
    pub activator: ActivationFunction,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
    #[serde(skip)]
    inputs: Vec<f64>,
    #[serde(skip)]
    pre_neurons: Vec<f64>, // z = xW + b, needed for the activation derivative
    #[serde(skip)]
    grad_w: Vec<f64>,
    #[serde(skip)]
    grad_b: Vec<f64>,
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(size: usize, input_size: usize, activation: ActivationFunction, rng: &mut R) -> Dense {
        Dense {
            size,
            input_size,
            activator: activation,
            weights: glorot_uniform(input_size * size, input_size, size, rng),
            biases: vec![0.0; size],
            inputs: Vec::new(),
            pre_neurons: Vec::new(),
            grad_w: Vec::new(),
            grad_b: Vec::new(),
        }
    }

    fn linear(&self, input: &Tensor) -> Result<Vec<f64>> {
        if input.len() != self.input_size {
            return Err(XrayError::ShapeMismatch {
                what: "dense input",
                got: input.len(),
                expected: self.input_size,
            });
        }
        let mut z = self.biases.clone();
        for (i, &x) in input.data.iter().enumerate() {
            if x == 0.0 {
                continue;
            }
            let row = &self.weights[i * self.size..(i + 1) * self.size];
            for (zo, w) in z.iter_mut().zip(row) {
                *zo += x * w;
            }
        }
        Ok(z)
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let z = self.linear(input)?;
        Tensor::from_vec(&[self.size], z.into_iter().map(|x| self.activator.function(x)).collect())
    }

    pub fn forward_train(&mut self, input: &Tensor) -> Result<Tensor> {
        let z = self.linear(input)?;
        let a = z.iter().map(|&x| self.activator.function(x)).collect();
        self.inputs = input.data.clone();
        self.pre_neurons = z;
        Tensor::from_vec(&[self.size], a)
    }

    /// Accumulates parameter gradients for the cached sample and returns
    /// ∂L/∂x. `grad_output` is ∂L/∂a for this layer.
    pub fn backward(&mut self, grad_output: &Tensor) -> Tensor {
        self.ensure_grads();
        let delta: Vec<f64> = grad_output.data.iter().zip(&self.pre_neurons)
            .map(|(g, &z)| g * self.activator.derivative(z))
            .collect();

        let mut grad_input = vec![0.0; self.input_size];
        for (i, &x) in self.inputs.iter().enumerate() {
            let row = i * self.size..(i + 1) * self.size;
            let mut acc = 0.0;
            for ((gw, w), d) in self.grad_w[row.clone()].iter_mut().zip(&self.weights[row]).zip(&delta) {
                *gw += x * d;
                acc += w * d;
            }
            grad_input[i] = acc;
        }
        for (gb, d) in self.grad_b.iter_mut().zip(&delta) {
            *gb += d;
        }

        Tensor { shape: vec![self.input_size], data: grad_input }
    }

    fn ensure_grads(&mut self) {
        if self.grad_w.len() != self.weights.len() {
            self.grad_w = vec![0.0; self.weights.len()];
        }
        if self.grad_b.len() != self.biases.len() {
            self.grad_b = vec![0.0; self.biases.len()];
        }
    }

    pub fn params_mut(&mut self) -> Vec<Param<'_>> {
        self.ensure_grads();
        vec![
            Param { values: &mut self.weights, grads: &mut self.grad_w },
            Param { values: &mut self.biases, grads: &mut self.grad_b },
        ]
    }

    pub fn validate(&self) -> Result<()> {
        if self.weights.len() != self.input_size * self.size {
            return Err(XrayError::ShapeMismatch {
                what: "dense weights",
                got: self.weights.len(),
                expected: self.input_size * self.size,
            });
        }
        if self.biases.len() != self.size {
            return Err(XrayError::ShapeMismatch {
                what: "dense biases",
                got: self.biases.len(),
                expected: self.size,
            });
        }
        Ok(())
    }
}
