use std::borrow::Cow;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Result, XrayError};
use crate::layers::{Layer, Param};
use crate::math::tensor::Tensor;
use crate::network::metadata::ModelMetadata;

/// A sequential stack of layers together with the input shape it expects.
///
/// This is also the on-disk model artifact: `save_json` writes the whole
/// struct, weights included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub input_shape: Vec<usize>,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub metadata: ModelMetadata,
}

impl Network {
    /// Assembles a network, checking that every layer accepts the shape the
    /// previous one produces.
    pub fn new(input_shape: Vec<usize>, layers: Vec<Layer>, metadata: ModelMetadata) -> Result<Network> {
        let network = Network { input_shape, layers, metadata };
        network.validate()?;
        Ok(network)
    }

    /// Shape checks on the whole stack; returns the output shape.
    pub fn validate(&self) -> Result<Vec<usize>> {
        if self.layers.is_empty() {
            return Err(XrayError::InvalidModel("network has no layers".to_string()));
        }
        let mut shape = self.input_shape.clone();
        for layer in &self.layers {
            layer.validate()?;
            shape = layer.output_shape(&shape)?;
        }
        Ok(shape)
    }

    /// Accepts either one sample `(H, W, C)` or a batch of one `(1, H, W, C)`.
    fn sample<'a>(&self, input: &'a Tensor) -> Result<Cow<'a, Tensor>> {
        if input.shape == self.input_shape {
            return Ok(Cow::Borrowed(input));
        }
        if input.shape.len() == self.input_shape.len() + 1 && input.shape[1..] == self.input_shape[..] {
            return Ok(Cow::Owned(input.clone().unbatch()?));
        }
        Err(XrayError::ShapeMismatch {
            what: "network input",
            got: input.len(),
            expected: self.input_shape.iter().product(),
        })
    }

    /// Inference forward pass. Read-only: dropout is the identity and no
    /// training caches are written, so this is safe to call concurrently.
    pub fn predict(&self, input: &Tensor) -> Result<Vec<f64>> {
        let mut current = self.sample(input)?.into_owned();
        for layer in &self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current.data)
    }

    /// Training forward pass; stores activations in each layer for backprop.
    pub fn forward_train<R: Rng + ?Sized>(&mut self, input: &Tensor, rng: &mut R) -> Result<Vec<f64>> {
        let mut current = self.sample(input)?.into_owned();
        for layer in &mut self.layers {
            current = layer.forward_train(&current, rng)?;
        }
        Ok(current.data)
    }

    /// Backward pass from ∂L/∂output; gradients accumulate in the layers
    /// until the optimizer consumes them.
    pub fn backward(&mut self, output_grad: Vec<f64>) {
        let n = output_grad.len();
        let mut delta = Tensor { shape: vec![n], data: output_grad };
        for layer in self.layers.iter_mut().rev() {
            delta = layer.backward(&delta);
        }
    }

    /// Every trainable buffer, in a stable order (layer by layer, weights
    /// before biases).
    pub fn params_mut(&mut self) -> Vec<Param<'_>> {
        self.layers.iter_mut().flat_map(|l| l.params_mut()).collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| match l {
            Layer::Conv2d(c) => c.weights.len() + c.biases.len(),
            Layer::Dense(d) => d.weights.len() + d.biases.len(),
            _ => 0,
        }).sum()
    }

    /// Serializes the network to a JSON file, creating parent directories.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Deserializes a network previously written by `save_json` and checks
    /// that its layer shapes are consistent.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let reader = BufReader::new(fs::File::open(path)?);
        let network: Network = serde_json::from_reader(reader)?;
        network.validate()?;
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::network::spec::{LayerSpec, NetworkSpec};
    use rand::{rngs::StdRng, SeedableRng};

    fn tiny_spec() -> NetworkSpec {
        NetworkSpec {
            name: "tiny".into(),
            input_shape: vec![8, 8, 1],
            layers: vec![
                LayerSpec::Conv2d { filters: 2, kernel_size: 3, activation: ActivationFunction::ReLU },
                LayerSpec::MaxPool2d { pool_size: 2 },
                LayerSpec::Flatten,
                LayerSpec::Dropout { rate: 0.5 },
                LayerSpec::Dense { units: 1, activation: ActivationFunction::Sigmoid },
            ],
            metadata: ModelMetadata::default(),
        }
    }

    fn ramp(shape: &[usize]) -> Tensor {
        let n: usize = shape.iter().product();
        Tensor::from_vec(shape, (0..n).map(|i| i as f64 / n as f64).collect()).unwrap()
    }

    #[test]
    fn predict_accepts_batched_and_unbatched_input() {
        let net = tiny_spec().build(&mut StdRng::seed_from_u64(5)).unwrap();
        let single = net.predict(&ramp(&[8, 8, 1])).unwrap();
        let batched = net.predict(&ramp(&[1, 8, 8, 1])).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single, batched);
        assert!(net.predict(&ramp(&[7, 8, 1])).is_err());
    }

    #[test]
    fn saved_model_predicts_identically_after_reload() {
        let net = tiny_spec().build(&mut StdRng::seed_from_u64(9)).unwrap();
        let dir = std::env::temp_dir().join(format!("xray-network-{}", std::process::id()));
        let path = dir.join("nested").join("model.json");

        net.save_json(&path).unwrap();
        let loaded = Network::load_json(&path).unwrap();
        let input = ramp(&[8, 8, 1]);
        assert_eq!(net.predict(&input).unwrap(), loaded.predict(&input).unwrap());
        assert_eq!(loaded.parameter_count(), net.parameter_count());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_rejects_truncated_weights() {
        let mut net = tiny_spec().build(&mut StdRng::seed_from_u64(9)).unwrap();
        if let Layer::Dense(d) = &mut net.layers[4] {
            d.weights.pop();
        }
        let dir = std::env::temp_dir().join(format!("xray-network-bad-{}", std::process::id()));
        let path = dir.join("model.json");
        net.save_json(&path).unwrap();
        assert!(matches!(Network::load_json(&path), Err(XrayError::ShapeMismatch { .. })));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_rejects_zero_pool_size_without_panicking() {
        let dir = std::env::temp_dir().join(format!("xray-network-pool0-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.json");
        fs::write(&path, r#"{"input_shape":[4,4,1],"layers":[{"type":"MaxPool2d","pool_size":0}]}"#).unwrap();
        assert!(matches!(Network::load_json(&path), Err(XrayError::InvalidModel(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
