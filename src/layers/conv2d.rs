use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Result, XrayError};
use crate::layers::Param;
use crate::math::{init::glorot_uniform, tensor::Tensor};

/// 2-D convolution over an HWC feature map, stride 1, no padding ("valid").
///
/// Output shape is `(H - k + 1, W - k + 1, out_channels)`. Kernel weights are
/// laid out `[ky][kx][in_channel][out_channel]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv2d {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub activator: ActivationFunction,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
    #[serde(skip)]
    input: Tensor,
    #[serde(skip)]
    pre_activation: Tensor,
    #[serde(skip)]
    grad_w: Vec<f64>,
    #[serde(skip)]
    grad_b: Vec<f64>,
}

impl Conv2d {
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Conv2d {
        let area = kernel_size * kernel_size;
        Conv2d {
            in_channels,
            out_channels,
            kernel_size,
            activator: activation,
            weights: glorot_uniform(area * in_channels * out_channels, area * in_channels, area * out_channels, rng),
            biases: vec![0.0; out_channels],
            input: Tensor::default(),
            pre_activation: Tensor::default(),
            grad_w: Vec::new(),
            grad_b: Vec::new(),
        }
    }

    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        if input_shape.len() != 3 {
            return Err(XrayError::ShapeMismatch { what: "conv2d input rank", got: input_shape.len(), expected: 3 });
        }
        if input_shape[2] != self.in_channels {
            return Err(XrayError::ShapeMismatch {
                what: "conv2d input channels",
                got: input_shape[2],
                expected: self.in_channels,
            });
        }
        if self.kernel_size == 0 {
            return Err(XrayError::InvalidModel("conv2d kernel size must be at least 1".to_string()));
        }
        let smallest = input_shape[0].min(input_shape[1]);
        if smallest < self.kernel_size {
            return Err(XrayError::ShapeMismatch { what: "conv2d spatial size", got: smallest, expected: self.kernel_size });
        }
        let k = self.kernel_size;
        Ok(vec![input_shape[0] - k + 1, input_shape[1] - k + 1, self.out_channels])
    }

    #[inline]
    fn weight_offset(&self, ky: usize, kx: usize, c: usize) -> usize {
        ((ky * self.kernel_size + kx) * self.in_channels + c) * self.out_channels
    }

    fn linear(&self, input: &Tensor) -> Result<Tensor> {
        let out_shape = self.output_shape(&input.shape)?;
        let (oc, k) = (self.out_channels, self.kernel_size);
        let mut out = Tensor::zeros(&out_shape);

        for y in 0..out_shape[0] {
            for x in 0..out_shape[1] {
                let o_base = out.hwc_offset(y, x, 0);
                let acc = &mut out.data[o_base..o_base + oc];
                acc.copy_from_slice(&self.biases);
                for ky in 0..k {
                    for kx in 0..k {
                        let i_base = input.hwc_offset(y + ky, x + kx, 0);
                        for c in 0..self.in_channels {
                            let v = input.data[i_base + c];
                            if v == 0.0 {
                                continue;
                            }
                            let w_base = self.weight_offset(ky, kx, c);
                            for (a, w) in acc.iter_mut().zip(&self.weights[w_base..w_base + oc]) {
                                *a += v * w;
                            }
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        Ok(self.linear(input)?.map(|z| self.activator.function(z)))
    }

    pub fn forward_train(&mut self, input: &Tensor) -> Result<Tensor> {
        let z = self.linear(input)?;
        let a = z.map(|v| self.activator.function(v));
        self.input = input.clone();
        self.pre_activation = z;
        Ok(a)
    }

    pub fn backward(&mut self, grad_output: &Tensor) -> Tensor {
        self.ensure_grads();
        let delta = grad_output.hadamard(&self.pre_activation.map(|z| self.activator.derivative(z)));
        let (oc, k) = (self.out_channels, self.kernel_size);
        let mut grad_input = Tensor::zeros(&self.input.shape);

        for y in 0..delta.shape[0] {
            for x in 0..delta.shape[1] {
                let o_base = delta.hwc_offset(y, x, 0);
                let d = &delta.data[o_base..o_base + oc];
                for (gb, dv) in self.grad_b.iter_mut().zip(d) {
                    *gb += dv;
                }
                for ky in 0..k {
                    for kx in 0..k {
                        let i_base = self.input.hwc_offset(y + ky, x + kx, 0);
                        for c in 0..self.in_channels {
                            let v = self.input.data[i_base + c];
                            let w_base = self.weight_offset(ky, kx, c);
                            let mut acc = 0.0;
                            for o in 0..oc {
                                self.grad_w[w_base + o] += v * d[o];
                                acc += self.weights[w_base + o] * d[o];
                            }
                            grad_input.data[i_base + c] += acc;
                        }
                    }
                }
            }
        }
        grad_input
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
        let expected = self.kernel_size * self.kernel_size * self.in_channels * self.out_channels;
        if self.weights.len() != expected {
            return Err(XrayError::ShapeMismatch { what: "conv2d weights", got: self.weights.len(), expected });
        }
        if self.biases.len() != self.out_channels {
            return Err(XrayError::ShapeMismatch {
                what: "conv2d biases",
                got: self.biases.len(),
                expected: self.out_channels,
            });
        }
        Ok(())
    }
}
