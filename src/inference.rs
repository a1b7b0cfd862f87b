use serde::{Serialize, Deserialize};

use crate::error::{Result, XrayError};
pub use crate::label::Diagnosis;
use crate::math::tensor::Tensor;
use crate::network::metadata::InputType;
use crate::network::network::Network;
use crate::preprocess::{preprocess_image, IMAGE_SIZE};

/// Anything that maps a preprocessed `(1, 150, 150, 1)` tensor to a
/// pneumonia probability. The server holds one behind an `Arc`.
pub trait Classifier: Send + Sync {
    fn predict_probability(&self, input: &Tensor) -> Result<f64>;
}

impl Classifier for Network {
    fn predict_probability(&self, input: &Tensor) -> Result<f64> {
        let output = self.predict(input)?;
        match output.as_slice() {
            [p] => Ok(*p),
            _ => Err(XrayError::InvalidModel(format!(
                "expected a single sigmoid output, got {} values",
                output.len()
            ))),
        }
    }
}

/// Checks that a loaded network can serve uploads: it must take a
/// `(150, 150, 1)` grayscale sample and produce a single probability.
/// Catches a mismatched artifact at startup instead of on every request.
pub fn check_servable(network: &Network) -> Result<()> {
    let size = IMAGE_SIZE as usize;
    if network.input_shape != [size, size, 1] {
        return Err(XrayError::InvalidModel(format!(
            "model input shape {:?} does not match the {}x{}x1 preprocessed image",
            network.input_shape, size, size
        )));
    }
    if let Some(InputType::ImageGrayscale { width, height }) = &network.metadata.input_type {
        if (*width, *height) != (IMAGE_SIZE, IMAGE_SIZE) {
            return Err(XrayError::InvalidModel(format!(
                "model metadata declares {}x{} input, expected {}x{}",
                width, height, IMAGE_SIZE, IMAGE_SIZE
            )));
        }
    }
    let output_shape = network.validate()?;
    let outputs: usize = output_shape.iter().product();
    if outputs != 1 {
        return Err(XrayError::InvalidModel(format!(
            "expected a single sigmoid output, model produces {} values",
            outputs
        )));
    }
    Ok(())
}

/// Body of a successful `/predict` response.
///
/// `confidence` is the raw model output, i.e. the probability of
/// pneumonia, for both labels. A "Normal" result with confidence 0.1 means
/// the model is 90% sure the image is normal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: String,
    pub confidence: f64,
}

impl Prediction {
    pub fn from_probability(p: f64) -> Prediction {
        Prediction {
            prediction: Diagnosis::from_probability(p).as_str().to_string(),
            confidence: p,
        }
    }
}

/// Full serving path: preprocess the upload, run the model, threshold.
pub fn classify(model: &dyn Classifier, image_bytes: &[u8]) -> Result<Prediction> {
    let input = preprocess_image(image_bytes)?;
    let p = model.predict_probability(&input)?;
    Ok(Prediction::from_probability(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::network::{LayerSpec, ModelMetadata, NetworkSpec};
    use crate::preprocess::fixtures::gradient_png;
    use rand::{rngs::StdRng, SeedableRng};

    /// Small network on the real 150x150x1 input with `units` outputs.
    fn small_network(units: usize, activation: ActivationFunction) -> Network {
        NetworkSpec {
            name: "small".into(),
            input_shape: vec![150, 150, 1],
            layers: vec![
                LayerSpec::Conv2d { filters: 1, kernel_size: 3, activation: ActivationFunction::ReLU },
                LayerSpec::MaxPool2d { pool_size: 5 },
                LayerSpec::Flatten,
                LayerSpec::Dense { units, activation },
            ],
            metadata: ModelMetadata::default(),
        }
        .build(&mut StdRng::seed_from_u64(17))
        .unwrap()
    }

    struct Fixed(f64);

    impl Classifier for Fixed {
        fn predict_probability(&self, input: &Tensor) -> Result<f64> {
            assert_eq!(input.shape, vec![1, 150, 150, 1]);
            Ok(self.0)
        }
    }

    #[test]
    fn pneumonia_iff_confidence_above_half() {
        let p = classify(&Fixed(0.73), &gradient_png(20, 20)).unwrap();
        assert_eq!(p.prediction, "Pneumonia");
        assert_eq!(p.confidence, 0.73);

        let p = classify(&Fixed(0.5), &gradient_png(20, 20)).unwrap();
        assert_eq!(p.prediction, "Normal");
    }

    #[test]
    fn normal_prediction_reports_raw_pneumonia_probability() {
        // Confidence is not flipped for the "Normal" label: 0.2 stays 0.2,
        // not 0.8. Callers must read it as P(pneumonia).
        let p = Prediction::from_probability(0.2);
        assert_eq!(p.prediction, "Normal");
        assert_eq!(p.confidence, 0.2);
    }

    #[test]
    fn undecodable_upload_fails_before_the_model() {
        struct Unreachable;
        impl Classifier for Unreachable {
            fn predict_probability(&self, _: &Tensor) -> Result<f64> {
                panic!("model must not run on undecodable input");
            }
        }
        assert!(classify(&Unreachable, b"GIF89a but truncated").is_err());
    }

    #[test]
    fn prediction_serializes_with_expected_keys() {
        let json = serde_json::to_value(Prediction::from_probability(0.9)).unwrap();
        assert_eq!(json["prediction"], "Pneumonia");
        assert_eq!(json["confidence"], 0.9);
    }

    #[test]
    fn real_network_yields_probability_consistent_with_label() {
        let net = small_network(1, ActivationFunction::Sigmoid);
        check_servable(&net).unwrap();

        let p = classify(&net, &gradient_png(200, 180)).unwrap();
        assert!((0.0..=1.0).contains(&p.confidence), "confidence {}", p.confidence);
        let expected = if p.confidence > 0.5 { "Pneumonia" } else { "Normal" };
        assert_eq!(p.prediction, expected);
    }

    #[test]
    fn two_unit_head_is_an_invalid_model() {
        let net = small_network(2, ActivationFunction::Sigmoid);
        let input = preprocess_image(&gradient_png(40, 40)).unwrap();
        assert!(matches!(net.predict_probability(&input), Err(XrayError::InvalidModel(_))));
        assert!(matches!(check_servable(&net), Err(XrayError::InvalidModel(_))));
    }

    #[test]
    fn wrong_input_shape_is_not_servable() {
        let net = NetworkSpec {
            name: "tiny".into(),
            input_shape: vec![8, 8, 1],
            layers: vec![
                LayerSpec::Flatten,
                LayerSpec::Dense { units: 1, activation: ActivationFunction::Sigmoid },
            ],
            metadata: ModelMetadata::default(),
        }
        .build(&mut StdRng::seed_from_u64(1))
        .unwrap();
        assert!(matches!(check_servable(&net), Err(XrayError::InvalidModel(_))));
    }

    #[test]
    fn metadata_size_must_match_image_size() {
        let mut net = small_network(1, ActivationFunction::Sigmoid);
        net.metadata.input_type = Some(InputType::ImageGrayscale { width: 64, height: 64 });
        assert!(matches!(check_servable(&net), Err(XrayError::InvalidModel(_))));

        net.metadata.input_type = Some(InputType::ImageGrayscale { width: 150, height: 150 });
        assert!(check_servable(&net).is_ok());
    }
}
