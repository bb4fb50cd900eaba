//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Json, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::image::decode_image;
use crate::model::{ModelHandle, DEVICE, MODEL_NAME};
use crate::pipeline::{self, Prediction};

/// Multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

/// Shared application state
pub struct AppState {
    pub model: Arc<ModelHandle>,
}

impl AppState {
    #[must_use]
    pub fn new(model: Arc<ModelHandle>) -> Self {
        Self { model }
    }
}

/// Service metadata
pub async fn root(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    let model = state
        .model
        .get()
        .map_or(MODEL_NAME, |classifier| classifier.name())
        .to_string();

    Json(ServiceInfo {
        service: "Deepfake Detection API",
        status: "running",
        model,
        endpoints: Endpoints {
            predict: "POST /predict - Upload image for analysis",
            health: "GET /health - Health check",
        },
    })
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.model.is_loaded(),
        device: DEVICE,
    })
}

/// Classify an uploaded image as REAL or FAKE
pub async fn predict(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let mut multipart = multipart.map_err(ApiError::rejection)?;

    while let Some(field) = multipart.next_field().await.map_err(ApiError::multipart)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let is_image = field
            .content_type()
            .is_some_and(|content_type| content_type.starts_with("image/"));
        if !is_image {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "File must be an image (JPEG, PNG, etc.)",
            ));
        }

        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(ApiError::multipart)?;

        let model = Arc::clone(&state.model);
        let prediction = tokio::task::spawn_blocking(move || {
            let image = decode_image(&bytes)?;
            pipeline::predict(&model, &image)
        })
        .await
        .map_err(ApiError::processing)?
        .map_err(ApiError::processing)?;

        tracing::info!(
            filename = filename.as_deref().unwrap_or_default(),
            label = %prediction.label,
            confidence = prediction.confidence,
            "prediction complete"
        );

        return Ok(Json(PredictResponse {
            success: true,
            filename,
            prediction,
        }));
    }

    Err(ApiError::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Missing form field: {FILE_FIELD}"),
    ))
}

/// Error reply carrying a status code and a `detail` message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Failure while decoding or classifying an accepted upload.
    pub fn processing(err: impl std::fmt::Display) -> Self {
        tracing::error!("Error processing image: {err}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error processing image: {err}"),
        )
    }

    fn multipart(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }

    /// Request that is not a usable `multipart/form-data` body.
    fn rejection(rejection: MultipartRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

// Response types

#[derive(Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub status: &'static str,
    pub model: String,
    pub endpoints: Endpoints,
}

#[derive(Serialize)]
pub struct Endpoints {
    pub predict: &'static str,
    pub health: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub device: &'static str,
}

#[derive(Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub filename: Option<String>,
    #[serde(flatten)]
    pub prediction: Prediction,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}
