use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{HealthResponse, InstallRequest, InstallResponse, TranscriptResponse, TtsRequest};
use crate::api::routes::AppState;
use crate::catalog::{self, InstalledModels, RegistryListing};
use crate::error::AppError;
use crate::gateway::{SynthesisRequest, TranscriptionRequest};
use crate::voices::{self, VoiceListing};

pub async fn tts(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let audio = state
        .gateway
        .synthesize(SynthesisRequest {
            text: request.text,
            model: request.model,
            voice: request.voice,
        })
        .await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CONTENT_DISPOSITION, "inline"),
        ],
        audio,
    )
        .into_response())
}

/// Multipart fields: `audio` (file), `language`, and `model` (quality tier).
pub async fn stt(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscriptResponse>, AppError> {
    let mut multipart = multipart?;
    let mut request = TranscriptionRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                request.filename = field.file_name().unwrap_or_default().to_string();
                request.audio = Some(field.bytes().await?);
            }
            "language" => request.language = Some(field.text().await?),
            "model" => request.quality = Some(field.text().await?),
            _ => {}
        }
    }

    let text = state.gateway.transcribe(request).await?;
    Ok(Json(TranscriptResponse { text }))
}

pub async fn list_voices() -> Json<VoiceListing> {
    Json(voices::list_voices())
}

pub async fn list_models(State(state): State<Arc<AppState>>) -> Response {
    match catalog::installed_models(state.gateway.backend()).await {
        Ok(models) => Json(models).into_response(),
        Err(AppError::BackendUnavailable(message)) => {
            tracing::error!("Listing models failed: {}", message);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(InstalledModels {
                    error: Some(message),
                    ..Default::default()
                }),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn registry(State(state): State<Arc<AppState>>) -> Json<RegistryListing> {
    Json(catalog::registry(state.gateway.backend()).await)
}

pub async fn install_model(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InstallRequest>, JsonRejection>,
) -> Result<Json<InstallResponse>, AppError> {
    let Json(request) = payload?;
    catalog::install(state.gateway.backend(), &request.model_id).await?;

    Ok(Json(InstallResponse {
        success: true,
        message: "Model installed successfully".to_string(),
    }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
