use crate::routes::{text_response, ApiResponse};

pub const LIVENESS_MESSAGE: &str = "Medical X-ray Classifier API is running!";

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub fn handle() -> ApiResponse {
    text_response(200, LIVENESS_MESSAGE)
}
