pub mod error;
pub mod config;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod preprocess;
pub mod label;
pub mod dataset;
pub mod inference;

// Convenience re-exports
pub use error::{Result, XrayError};
pub use config::AppConfig;
pub use math::tensor::Tensor;
pub use activation::activation::ActivationFunction;
pub use layers::Layer;
pub use network::{InputType, LayerSpec, ModelMetadata, Network, NetworkSpec};
pub use loss::bce::BceLoss;
pub use optim::adam::Adam;
pub use train::{evaluate, train_loop, EpochStats, Evaluation, TrainConfig};
pub use preprocess::{preprocess_image, IMAGE_SIZE};
pub use label::{Diagnosis, DECISION_THRESHOLD};
pub use dataset::{load_dataset, load_split, Dataset, Split};
pub use inference::{check_servable, classify, Classifier, Prediction};
