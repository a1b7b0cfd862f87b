use serde::{Serialize, Deserialize};
use std::ops::{Index, IndexMut};

use crate::error::{Result, XrayError};

/// Dense `f64` tensor stored row-major in a single flat buffer.
///
/// Feature maps use HWC order: index `(y, x, c)` lives at
/// `(y * width + x) * channels + c`. A batched image adds a leading batch
/// dimension, giving NHWC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl Tensor {
    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            shape: shape.to_vec(),
            data: vec![0.0; shape.iter().product()],
        }
    }

    /// Wraps `data` with `shape`, checking that the element counts agree.
    pub fn from_vec(shape: &[usize], data: Vec<f64>) -> Result<Tensor> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(XrayError::ShapeMismatch {
                what: "tensor data",
                got: data.len(),
                expected,
            });
        }
        Ok(Tensor { shape: shape.to_vec(), data })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Same data, new shape. Element counts must agree.
    pub fn reshape(self, shape: &[usize]) -> Result<Tensor> {
        Tensor::from_vec(shape, self.data)
    }

    /// Drops a leading batch dimension of size 1: `(1, H, W, C)` → `(H, W, C)`.
    pub fn unbatch(self) -> Result<Tensor> {
        match self.shape.first() {
            Some(1) if self.shape.len() > 1 => {
                let shape = self.shape[1..].to_vec();
                Tensor::from_vec(&shape, self.data)
            }
            _ => Err(XrayError::ShapeMismatch {
                what: "batch dimension",
                got: self.shape.first().copied().unwrap_or(0),
                expected: 1,
            }),
        }
    }

    pub fn map<F>(&self, functor: F) -> Tensor
    where
        F: Fn(f64) -> f64,
    {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// Element-wise (Hadamard) product of two same-shape tensors.
    pub fn hadamard(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.shape, other.shape, "hadamard: shapes differ");
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().zip(other.data.iter()).map(|(a, b)| a * b).collect(),
        }
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Flat offset of `(y, x, c)` in an HWC tensor.
    #[inline]
    pub fn hwc_offset(&self, y: usize, x: usize, c: usize) -> usize {
        (y * self.shape[1] + x) * self.shape[2] + c
    }
}

impl Default for Tensor {
    fn default() -> Self {
        Tensor { shape: vec![0], data: vec![] }
    }
}

impl Index<usize> for Tensor {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl IndexMut<usize> for Tensor {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.data[i]
    }
}
