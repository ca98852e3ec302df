pub mod options;

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use bytes::Bytes;
use serde::Deserialize;

use crate::backend::{Reply, SpeachesBackend, SpeechPayload, TranscriptionPayload};
use crate::error::AppError;
use crate::voices;

pub use options::{Language, QualityTier, TRANSCRIPTION_MODEL_ID};

const DEFAULT_AUDIO_FILENAME: &str = "audio";

#[derive(Debug, Clone, Default)]
pub struct SynthesisRequest {
    pub text: String,
    pub model: Option<String>,
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TranscriptionRequest {
    /// `None` when the client sent no audio file.
    pub audio: Option<Bytes>,
    pub filename: String,
    pub language: Option<String>,
    pub quality: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionBody {
    text: String,
}

/// Whether a backend error body says the requested model is not on disk.
///
/// The backend has no structured error code for this; these two patterns are
/// the whole contract.
pub fn is_missing_model_signature(body: &str) -> bool {
    body.contains("is not installed locally") || (body.contains("Model") && body.contains("not found"))
}

pub struct Gateway {
    backend: Arc<dyn SpeachesBackend>,
}

impl Gateway {
    pub fn new(backend: Arc<dyn SpeachesBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn SpeachesBackend {
        self.backend.as_ref()
    }

    /// Text to speech. The returned body streams the backend's audio as it arrives.
    pub async fn synthesize(&self, request: SynthesisRequest) -> Result<Body, AppError> {
        if request.text.trim().is_empty() {
            return Err(AppError::InvalidInput("text cannot be empty".into()));
        }

        let resolved = voices::normalize(
            request.model.as_deref().unwrap_or_default(),
            request.voice.as_deref().unwrap_or_default(),
        );
        tracing::info!(
            "Synthesizing {} chars with {} ({:?})",
            request.text.chars().count(),
            resolved.model.canonical_id,
            resolved.model.family
        );

        let payload = SpeechPayload {
            model: resolved.model.canonical_id.clone(),
            input: request.text,
            voice: resolved.voice,
        };

        self.call_with_install_retry(
            &resolved.model.canonical_id,
            resolved.model.family.auto_installs(),
            || self.backend.speech(&payload),
        )
        .await
    }

    /// Speech to text. Returns only the transcript.
    pub async fn transcribe(&self, request: TranscriptionRequest) -> Result<String, AppError> {
        let audio = request
            .audio
            .ok_or_else(|| AppError::InvalidInput("audio file is required".into()))?;

        let language = Language::parse_or_default(request.language.as_deref());
        let quality = QualityTier::parse_or_default(request.quality.as_deref());
        let filename = if request.filename.is_empty() {
            DEFAULT_AUDIO_FILENAME.to_string()
        } else {
            request.filename
        };
        tracing::info!(
            "Transcribing {} ({} bytes, language={}, quality={:?})",
            filename,
            audio.len(),
            language.as_code(),
            quality
        );

        let payload = TranscriptionPayload {
            audio,
            filename,
            language: language.as_code().to_string(),
            model: TRANSCRIPTION_MODEL_ID.to_string(),
        };

        let body = self
            .call_with_install_retry(TRANSCRIPTION_MODEL_ID, true, || {
                self.backend.transcribe(&payload)
            })
            .await?;

        let decoded: TranscriptionBody = serde_json::from_slice(&body).map_err(|e| {
            AppError::MalformedBackendResponse(format!(
                "failed to decode transcription response: {}",
                e
            ))
        })?;

        Ok(decoded.text)
    }

    /// Run `call`; if the backend reports the model missing, trigger an
    /// install and run `call` once more.
    ///
    /// A failed retry, or a failed install request, reports the first
    /// attempt's rejection. Connection failures on the first attempt are
    /// returned immediately.
    async fn call_with_install_retry<T, F, Fut>(
        &self,
        model_id: &str,
        auto_install: bool,
        call: F,
    ) -> Result<T, AppError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Reply<T>, AppError>>,
    {
        let first = match call().await? {
            Reply::Accepted(value) => return Ok(value),
            Reply::Rejected(rejection) => rejection,
        };

        if !auto_install || !is_missing_model_signature(&first.body) {
            return Err(first.into());
        }

        tracing::info!("Model {} is not installed, requesting download", model_id);
        if let Err(e) = self.backend.install_model(model_id).await {
            tracing::warn!("Install request for {} failed: {}", model_id, e);
            return Err(first.into());
        }

        match call().await {
            Ok(Reply::Accepted(value)) => {
                tracing::info!("Retry after installing {} succeeded", model_id);
                Ok(value)
            }
            Ok(Reply::Rejected(retry)) => {
                tracing::warn!(
                    "Retry after installing {} was rejected ({}): {}",
                    model_id,
                    retry.status,
                    retry.body
                );
                Err(first.into())
            }
            Err(e) => {
                tracing::warn!("Retry after installing {} failed: {}", model_id, e);
                Err(first.into())
            }
        }
    }
}
