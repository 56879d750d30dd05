//! Food image classification endpoint.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Classify an uploaded food photo.
///
/// Accepts a multipart form with an image part named `file` (or `image`).
/// Content type is checked against the `image/*` prefix before any bytes
/// reach the engine; everything past that check is the engine's decode step.
pub async fn classify_food(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let image_bytes = read_image_part(&mut multipart).await?;
    info!("Classification request: {} bytes", image_bytes.len());

    // Acquire permit for concurrency limiting
    let _permit = state.acquire_permit().await;

    // The forward pass is synchronous CPU work; keep it off the async runtime.
    let engine = state.engine.clone();
    let outcome = tokio::task::spawn_blocking(move || engine.classify(&image_bytes))
        .await
        .map_err(|e| ApiError::internal(format!("classification task failed: {e}")))?;

    if outcome.is_success() {
        let mut body = serde_json::to_value(&outcome)
            .map_err(|e| ApiError::internal(format!("failed to serialize result: {e}")))?;
        if let Value::Object(map) = &mut body {
            map.insert(
                "model".to_string(),
                Value::String(state.engine.model_name()),
            );
        }
        Ok(Json(body))
    } else {
        let message = outcome
            .error_message()
            .unwrap_or("classification failed")
            .to_string();
        Err(ApiError::internal(format!("Prediction failed: {message}")))
    }
}

/// Pull the image part out of the multipart form.
async fn read_image_part(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" | "image" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !content_type.starts_with("image/") {
                    return Err(ApiError::bad_request(format!(
                        "Only image uploads are accepted, got content type '{content_type}'"
                    )));
                }
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed reading multipart field '{name}': {e}"))
                })?;
                if bytes.is_empty() {
                    return Err(ApiError::bad_request("Uploaded image is empty"));
                }
                return Ok(bytes.to_vec());
            }
            _ => {
                // Unknown parts are skipped, not rejected.
            }
        }
    }

    Err(ApiError::bad_request(
        "Missing image part: expected a multipart field named 'file'",
    ))
}
