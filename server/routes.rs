use std::io::{Cursor, Read};

use log::{debug, warn};
use serde::Serialize;
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::handlers;
use crate::state::{AppState, SharedState};

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// A finished response, independent of the HTTP server so handlers can be
/// tested without a socket.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

pub fn text_response(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        content_type: "text/plain; charset=utf-8",
        body: body.as_bytes().to_vec(),
    }
}

pub fn json_response<T: Serialize>(status: u16, value: &T) -> ApiResponse {
    match serde_json::to_vec(value) {
        Ok(body) => ApiResponse { status, content_type: "application/json", body },
        Err(e) => {
            warn!("failed to serialize response: {}", e);
            ApiResponse {
                status: 500,
                content_type: "application/json",
                body: br#"{"error":"failed to serialize response"}"#.to_vec(),
            }
        }
    }
}

pub fn error_response(status: u16, message: &str) -> ApiResponse {
    json_response(status, &json!({ "error": message }))
}

pub fn not_found() -> ApiResponse {
    error_response(404, "Not Found")
}

pub fn method_not_allowed() -> ApiResponse {
    error_response(405, "Method Not Allowed")
}

/// CORS preflight answer.
pub fn no_content() -> ApiResponse {
    ApiResponse { status: 204, content_type: "text/plain", body: Vec::new() }
}

fn header(field: &str, value: &str) -> Header {
    Header::from_bytes(field.as_bytes(), value.as_bytes()).expect("static header is valid ASCII")
}

/// Converts to a tiny_http response. Every response allows any origin.
pub fn into_http(resp: ApiResponse) -> Response<Cursor<Vec<u8>>> {
    let len = resp.body.len();
    let mut headers = vec![
        header("Access-Control-Allow-Origin", "*"),
        header("Content-Type", resp.content_type),
    ];
    if resp.status == 204 {
        headers.push(header("Access-Control-Allow-Methods", "GET, POST, OPTIONS"));
        headers.push(header("Access-Control-Allow-Headers", "Content-Type"));
    }
    Response::new(StatusCode(resp.status), headers, Cursor::new(resp.body), Some(len), None)
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Maps a request to its handler. The query string must already be
/// stripped from `path`.
pub fn route(
    method: &Method,
    path: &str,
    content_type: Option<&str>,
    body: &[u8],
    state: &AppState,
) -> ApiResponse {
    match (method, path) {
        (Method::Options, _) => no_content(),

        (Method::Get, "/") => handlers::home::handle(),
        (Method::Post, "/predict") => handlers::predict::handle(content_type, body, state),

        (_, "/") | (_, "/predict") => method_not_allowed(),
        _ => not_found(),
    }
}

/// Reads the request, routes it, and writes the response back.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = match url.find('?') {
        Some(pos) => url[..pos].to_owned(),
        None => url,
    };

    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned());

    let mut body = Vec::new();
    let response = match request.as_reader().read_to_end(&mut body) {
        Ok(_) => route(&method, &path, content_type.as_deref(), &body, &state),
        Err(e) => {
            warn!("failed to read request body for {} {}: {}", method, path, e);
            error_response(400, "Failed to read request body")
        }
    };

    debug!("{} {} -> {}", method, path, response.status);
    if let Err(e) = request.respond(into_http(response)) {
        warn!("failed to send response for {} {}: {}", method, path, e);
    }
}
