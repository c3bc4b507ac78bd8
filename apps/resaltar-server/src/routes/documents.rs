//! Document API
//!
//! One document at a time: upload replaces whatever was loaded, status
//! reports the recognition lifecycle, view streams the displayed bytes,
//! and search/seek regenerate the highlighted output.

use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;

use crate::document::{DocumentStatusView, SearchOutcome, SeekOutcome};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_document))
        .route("/status", get(document_status))
        .route("/view", get(view_document))
        .route("/search", get(search_document))
        .route("/seek", get(seek_document))
}

/// Accept a PDF upload and queue recognition for it.
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentStatusView>), AppError> {
    let mut payload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidUpload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if matches!(name.as_str(), "file" | "document" | "pdf") {
            let file_name = field.file_name().unwrap_or("document.pdf").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidUpload(e.to_string()))?;
            payload = Some((file_name, data));
            break;
        }
    }

    let (file_name, data) =
        payload.ok_or_else(|| AppError::InvalidUpload("missing file field".to_string()))?;
    if data.is_empty() {
        return Err(AppError::InvalidUpload("empty upload".to_string()));
    }
    let limit = state.config().upload.max_size;
    if data.len() > limit {
        return Err(AppError::UploadTooLarge {
            size: data.len(),
            limit,
        });
    }
    if !data.starts_with(b"%PDF-") {
        return Err(AppError::InvalidUpload("not a PDF document".to_string()));
    }

    let generation = state.store().load_document(file_name, data.clone()).await;
    let store = state.store().clone();
    tokio::spawn(async move {
        store.run_recognition(generation, data).await;
    });

    Ok((StatusCode::ACCEPTED, Json(state.store().status().await)))
}

async fn document_status(State(state): State<AppState>) -> Json<DocumentStatusView> {
    Json(state.store().status().await)
}

/// Stream the displayed document: the latest highlighted output, or the
/// original when no highlight pass has run.
async fn view_document(State(state): State<AppState>) -> Result<Response, AppError> {
    let bytes = state.store().displayed().await?;
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(response)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    phrase: Option<String>,
}

/// A missing or empty phrase is a no-op, matching nothing and leaving the
/// displayed document untouched.
async fn search_document(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchOutcome>, AppError> {
    let phrase = params.phrase.unwrap_or_default();
    let outcome = state.store().search(&phrase).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
struct SeekParams {
    position: i64,
}

async fn seek_document(
    State(state): State<AppState>,
    Query(params): Query<SeekParams>,
) -> Result<Json<SeekOutcome>, AppError> {
    let outcome = state.store().seek(params.position).await?;
    Ok(Json(outcome))
}
