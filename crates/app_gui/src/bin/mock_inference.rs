//! Stand-in for the remote inference service.
//!
//! Answers POST /predict with a synthesized prediction for the uploaded
//! sample, so the demo runs without the hosted model. Start it, then point
//! the app at it (the default endpoint already matches):
//!
//!   cargo run --bin mock_inference

use std::io::Read;
use std::time::Duration;

use anyhow::anyhow;
use lesion_core::mock::mock_prediction;
use lesion_core::true_label_for;
use rand::Rng;
use tiny_http::{Header, Method, Response, Server};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let addr =
        std::env::var("MOCK_INFERENCE_ADDR").unwrap_or_else(|_| "127.0.0.1:7878".to_string());
    let server = Server::http(&addr).map_err(|e| anyhow!("failed to bind {addr}: {e}"))?;
    tracing::info!("mock inference endpoint listening on http://{addr}/predict");

    // One thread per request: the simulated processing delay must not stall
    // other callers.
    for request in server.incoming_requests() {
        std::thread::spawn(move || handle(request));
    }
    Ok(())
}

fn handle(mut request: tiny_http::Request) {
    if request.method() != &Method::Post || !request.url().starts_with("/predict") {
        let _ = request.respond(Response::from_string("not found").with_status_code(404));
        return;
    }

    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        tracing::warn!("failed to read request body: {e}");
        let _ = request.respond(Response::from_string("bad request").with_status_code(400));
        return;
    }

    let body_text = String::from_utf8_lossy(&body);
    let image_name = extract_filename(&body_text).unwrap_or_default();
    let true_label = true_label_for(&image_name);
    tracing::info!(image = %image_name, label = %true_label.code(), "predicting");

    let mut rng = rand::thread_rng();
    // The hosted endpoint takes a second or two; keep the demo honest.
    let delay_ms = 1500 + rng.gen_range(0..1000);
    std::thread::sleep(Duration::from_millis(delay_ms));

    let prediction = mock_prediction(true_label, &mut rng);
    let json = match serde_json::to_string(&prediction) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("failed to serialize prediction: {e}");
            let _ = request.respond(Response::from_string("internal error").with_status_code(500));
            return;
        }
    };

    let response = Response::from_string(json).with_header(
        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            .expect("static header is valid"),
    );
    if let Err(e) = request.respond(response) {
        tracing::warn!("failed to send response: {e}");
    }
}

/// Pull the uploaded file name out of the multipart body's
/// Content-Disposition line.
fn extract_filename(body: &str) -> Option<String> {
    let start = body.find("filename=\"")? + "filename=\"".len();
    let rest = &body[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}
