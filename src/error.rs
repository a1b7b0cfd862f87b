use thiserror::Error;

/// Every failure the library can report.
///
/// The `Display` text is what the prediction service sends back in the
/// `error` field of a 500 response, so keep messages human-readable.
#[derive(Error, Debug)]
pub enum XrayError {
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A tensor or parameter buffer did not have the size a layer expected.
    #[error("shape mismatch for {what}: got {got}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("invalid training configuration: {0}")]
    InvalidTraining(String),

    #[error("dataset is empty: {0}")]
    EmptyDataset(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),
}

pub type Result<T> = std::result::Result<T, XrayError>;
