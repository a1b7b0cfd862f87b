use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Result, XrayError};
use crate::layers::{Conv2d, Dense, Dropout, Flatten, Layer, MaxPool2d};
use crate::network::metadata::{InputType, ModelMetadata};
use crate::network::network::Network;
use crate::preprocess::IMAGE_SIZE;

/// Describes one layer in a network specification.
///
/// Input sizes are not stored: they are inferred by propagating the
/// network's input shape through the stack when the spec is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerSpec {
    Conv2d { filters: usize, kernel_size: usize, activation: ActivationFunction },
    MaxPool2d { pool_size: usize },
    Flatten,
    Dropout { rate: f64 },
    Dense { units: usize, activation: ActivationFunction },
}

/// A serializable description of a network architecture plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name, logged at build time.
    pub name: String,
    /// Shape of one sample, HWC for images.
    pub input_shape: Vec<usize>,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub metadata: ModelMetadata,
}

impl NetworkSpec {
    /// The chest X-ray classifier:
    ///
    /// ```text
    /// (150,150,1) → Conv 32 → Pool → Conv 64 → Pool → Conv 128 → Pool
    ///             → Flatten → Dropout 0.5 → Dense 64 → Dense 1 (sigmoid)
    /// ```
    pub fn xray_cnn() -> NetworkSpec {
        let size = IMAGE_SIZE as usize;
        let relu = ActivationFunction::ReLU;
        NetworkSpec {
            name: "xray_cnn".to_string(),
            input_shape: vec![size, size, 1],
            layers: vec![
                LayerSpec::Conv2d { filters: 32, kernel_size: 3, activation: relu },
                LayerSpec::MaxPool2d { pool_size: 2 },
                LayerSpec::Conv2d { filters: 64, kernel_size: 3, activation: relu },
                LayerSpec::MaxPool2d { pool_size: 2 },
                LayerSpec::Conv2d { filters: 128, kernel_size: 3, activation: relu },
                LayerSpec::MaxPool2d { pool_size: 2 },
                LayerSpec::Flatten,
                LayerSpec::Dropout { rate: 0.5 },
                LayerSpec::Dense { units: 64, activation: relu },
                LayerSpec::Dense { units: 1, activation: ActivationFunction::Sigmoid },
            ],
            metadata: ModelMetadata {
                description: Some("Chest X-ray pneumonia classifier".to_string()),
                input_type: Some(InputType::ImageGrayscale { width: IMAGE_SIZE, height: IMAGE_SIZE }),
                output_labels: Some(vec!["Normal".to_string(), "Pneumonia".to_string()]),
            },
        }
    }

    /// Instantiates the layers with freshly initialized weights.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network> {
        if self.layers.is_empty() {
            return Err(XrayError::InvalidModel(format!("spec '{}' has no layers", self.name)));
        }

        let mut shape = self.input_shape.clone();
        let mut layers = Vec::with_capacity(self.layers.len());
        for spec in &self.layers {
            let layer = match *spec {
                LayerSpec::Conv2d { filters, kernel_size, activation } => {
                    let channels = shape.last().copied().unwrap_or(0);
                    Layer::Conv2d(Conv2d::new(channels, filters, kernel_size, activation, rng))
                }
                LayerSpec::MaxPool2d { pool_size } => Layer::MaxPool2d(MaxPool2d::new(pool_size)),
                LayerSpec::Flatten => Layer::Flatten(Flatten::new()),
                LayerSpec::Dropout { rate } => {
                    if !(0.0..1.0).contains(&rate) {
                        return Err(XrayError::InvalidModel(format!("dropout rate {rate} outside [0, 1)")));
                    }
                    Layer::Dropout(Dropout::new(rate))
                }
                LayerSpec::Dense { units, activation } => {
                    let inputs = shape.iter().product();
                    Layer::Dense(Dense::new(units, inputs, activation, rng))
                }
            };
            shape = layer.output_shape(&shape)?;
            layers.push(layer);
        }

        Network::new(self.input_shape.clone(), layers, self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn xray_cnn_flattens_to_17_by_17_by_128() {
        let spec = NetworkSpec::xray_cnn();
        // Shape propagation without allocating the real weights.
        let mut shape = spec.input_shape.clone();
        let mut rng = StdRng::seed_from_u64(0);
        for (i, l) in spec.layers.iter().enumerate() {
            let layer = match *l {
                LayerSpec::Flatten => break,
                LayerSpec::MaxPool2d { pool_size } => Layer::MaxPool2d(MaxPool2d::new(pool_size)),
                LayerSpec::Conv2d { filters, kernel_size, activation } => {
                    Layer::Conv2d(Conv2d::new(shape[2], filters, kernel_size, activation, &mut rng))
                }
                _ => panic!("unexpected layer {i} before flatten"),
            };
            shape = layer.output_shape(&shape).unwrap();
        }
        assert_eq!(shape, vec![17, 17, 128]);
    }

    #[test]
    fn build_infers_dense_input_size() {
        let spec = NetworkSpec {
            name: "tiny".into(),
            input_shape: vec![6, 6, 1],
            layers: vec![
                LayerSpec::Conv2d { filters: 2, kernel_size: 3, activation: ActivationFunction::ReLU },
                LayerSpec::MaxPool2d { pool_size: 2 },
                LayerSpec::Flatten,
                LayerSpec::Dense { units: 1, activation: ActivationFunction::Sigmoid },
            ],
            metadata: ModelMetadata::default(),
        };
        let net = spec.build(&mut StdRng::seed_from_u64(0)).unwrap();
        match &net.layers[3] {
            Layer::Dense(d) => assert_eq!(d.input_size, 2 * 2 * 2),
            other => panic!("expected dense, got {other:?}"),
        }
    }

    #[test]
    fn build_rejects_bad_dropout_rate() {
        let spec = NetworkSpec {
            name: "bad".into(),
            input_shape: vec![4],
            layers: vec![LayerSpec::Dropout { rate: 1.5 }],
            metadata: ModelMetadata::default(),
        };
        assert!(spec.build(&mut StdRng::seed_from_u64(0)).is_err());
    }
}
