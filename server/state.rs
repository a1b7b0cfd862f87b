use std::sync::Arc;

use xray_classifier::Classifier;

/// Everything a request handler needs. Built once at startup.
///
/// The classifier is read-only after loading, so requests share it without
/// locking.
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        AppState { classifier }
    }
}

pub type SharedState = Arc<AppState>;
