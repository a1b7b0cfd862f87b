use log::{info, warn};

use xray_classifier::classify;

use crate::routes::{error_response, json_response, ApiResponse};
use crate::state::AppState;
use crate::util::multipart::find_file_part;

/// Form field the client uploads the X-ray under.
pub const FILE_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

pub fn handle(content_type: Option<&str>, body: &[u8], state: &AppState) -> ApiResponse {
    let Some(part) = find_file_part(content_type, body, FILE_FIELD) else {
        return error_response(400, "No file part in the request");
    };
    let filename = part.filename.as_deref().unwrap_or_default();
    if filename.is_empty() {
        return error_response(400, "No selected file");
    }

    match classify(state.classifier.as_ref(), part.data) {
        Ok(prediction) => {
            info!(
                "{}: {} (confidence {:.4})",
                filename, prediction.prediction, prediction.confidence
            );
            json_response(200, &prediction)
        }
        Err(e) => {
            warn!("prediction failed for {}: {}", filename, e);
            error_response(500, &e.to_string())
        }
    }
}
