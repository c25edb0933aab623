//! HTTP API for protoeval
//!
//! The upload-and-evaluate endpoint plus a small /api namespace.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{debug, error};
use uuid::Uuid;

use protoeval_api::{ErrorReply, EvaluationReport, UPLOAD_FIELD};

use crate::evaluate::DocumentEvaluator;
use crate::extract;

// Shared state
#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<dyn DocumentEvaluator>,
    pub upload_dir: PathBuf,
}

// Routes under /api
pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorReply::new(message))).into_response()
}

/// Handle a protocol upload and reply with its evaluation.
///
/// The reply body is always one of the two shared reply shapes: an
/// `EvaluationReport` on success, an `ErrorReply` otherwise.
pub async fn upload_and_evaluate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some(UPLOAD_FIELD) {
                    continue;
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(data) => upload = Some((filename, data.to_vec())),
                    Err(e) => {
                        debug!("failed to read upload field: {e}");
                        return error_reply(StatusCode::BAD_REQUEST, "Invalid form data");
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!("malformed multipart body: {e}");
                return error_reply(StatusCode::BAD_REQUEST, "Invalid form data");
            }
        }
    }

    let Some((filename, data)) = upload else {
        debug!("no file part in the request");
        return error_reply(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    if filename.is_empty() {
        debug!("no file selected");
        return error_reply(StatusCode::BAD_REQUEST, "No file selected");
    }

    if !extract::allowed_file(&filename) {
        debug!("unsupported file type: {filename}");
        return error_reply(StatusCode::BAD_REQUEST, "Unsupported file type");
    }

    match process_upload(&state, &filename, &data).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!("error processing file: {e}");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Error processing file")
        }
    }
}

async fn process_upload(
    state: &AppState,
    filename: &str,
    data: &[u8],
) -> anyhow::Result<EvaluationReport> {
    let stored = store_upload(&state.upload_dir, filename, data).await?;
    debug!("file saved at {}", stored.display());

    let document_text = extract::extract_text_from_pdf(data)?;
    let report = state.evaluator.evaluate(&document_text).await?;
    Ok(report)
}

/// Persist the upload under a collision-free name.
async fn store_upload(dir: &Path, filename: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let name = format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(filename));
    let path = dir.join(name);
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

/// Keep the base name and replace anything outside `[A-Za-z0-9._-]`.
/// Leading dots go too, so a stored name can never be a dotfile.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_filename("protocol.pdf"), "protocol.pdf");
        assert_eq!(sanitize_filename("study v2 (final).pdf"), "study_v2__final_.pdf");
    }

    #[test]
    fn test_sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("..\\..\\evil.pdf"), "evil.pdf");
    }

    #[test]
    fn test_sanitize_never_yields_dotfile_or_empty() {
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("..."), "upload");
        assert_eq!(sanitize_filename(""), "upload");
    }
}
