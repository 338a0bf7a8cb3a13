//! Detection API Handlers

use std::path::Path;

use axum::extract::{Multipart, State};
use serde::Serialize;
use shared::error::AppError;
use tracing::instrument;

use crate::api::{field_text, parse_field};
use crate::core::ServerState;
use crate::detection::{DetectedShape, DetectionInput, Dimensions, rescale};
use crate::utils::{ApiResult, ok};

#[derive(Debug, Serialize)]
pub struct DetectionResponse {
    /// Percent coordinates as reported by the program
    pub apartments: Vec<DetectedShape>,
    /// Pixel coordinates, present when image dimensions were supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_apartments: Option<Vec<DetectedShape>>,
    pub source_dimensions: Option<Dimensions>,
    pub target_dimensions: Option<Dimensions>,
}

async fn field_bytes(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<Vec<u8>, AppError> {
    field
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| AppError::invalid_field(name, format!("Multipart error: {e}")))
}

/// POST /api/detection - 运行区域识别
///
/// Multipart: `source_pdf` (必填), `target_image`, `image_width`, `image_height`
#[instrument(skip(state, multipart))]
pub async fn detect(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> ApiResult<DetectionResponse> {
    let mut input = DetectionInput::default();
    let mut has_source = false;
    let mut image_width: Option<f64> = None;
    let mut image_height: Option<f64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart request: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "source_pdf" => {
                input.source_pdf = field_bytes(field, &name).await?;
                has_source = true;
            }
            "target_image" => {
                input.target_extension = field
                    .file_name()
                    .and_then(|f| Path::new(f).extension())
                    .and_then(|e| e.to_str())
                    .map(str::to_lowercase);
                input.target_image = Some(field_bytes(field, &name).await?);
            }
            "image_width" => image_width = parse_field(&name, &field_text(field).await?)?,
            "image_height" => image_height = parse_field(&name, &field_text(field).await?)?,
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown multipart field");
            }
        }
    }

    if !has_source || input.source_pdf.is_empty() {
        return Err(AppError::invalid_field("source_pdf", "source_pdf is required"));
    }
    for (name, value) in [("image_width", image_width), ("image_height", image_height)] {
        if value.is_some_and(|v| !v.is_finite() || v <= 0.0) {
            return Err(AppError::invalid_field(name, format!("{name} must be positive")));
        }
    }

    let output = state.detection.detect(input).await?;
    let pixel_apartments = match (image_width, image_height) {
        (Some(w), Some(h)) => Some(rescale(&output.apartments, w, h)),
        _ => None,
    };

    Ok(ok(DetectionResponse {
        apartments: output.apartments,
        pixel_apartments,
        source_dimensions: output.source_dimensions,
        target_dimensions: output.target_dimensions,
    }))
}
