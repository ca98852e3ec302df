//! Outbound calls to the speaches.ai inference server.
//!
//! The gateway talks to the backend through [`SpeachesBackend`] so the
//! install-and-retry logic can run against a fake in tests.

pub mod http;

use async_trait::async_trait;
use axum::{body::Body, http::StatusCode};
use bytes::Bytes;
use serde::Serialize;

use crate::error::AppError;

pub use http::HttpBackend;

/// JSON body of `POST /v1/audio/speech`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechPayload {
    pub model: String,
    pub input: String,
    pub voice: String,
}

/// Fields of the `POST /v1/audio/transcriptions` multipart body.
///
/// The audio stays buffered here so the body can be rebuilt for a retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionPayload {
    pub audio: Bytes,
    pub filename: String,
    pub language: String,
    pub model: String,
}

/// A non-success response from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub body: String,
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        AppError::from_backend(rejection.status, &rejection.body)
    }
}

/// Outcome of one backend round trip that produced an HTTP response.
///
/// Connection failures never become a `Reply`; they surface as
/// [`AppError::BackendUnavailable`].
#[derive(Debug)]
pub enum Reply<T> {
    Accepted(T),
    Rejected(Rejection),
}

#[async_trait]
pub trait SpeachesBackend: Send + Sync {
    /// On success the audio is handed over as a stream, not a buffer.
    async fn speech(&self, payload: &SpeechPayload) -> Result<Reply<Body>, AppError>;

    /// On success returns the raw JSON body.
    async fn transcribe(&self, payload: &TranscriptionPayload) -> Result<Reply<Bytes>, AppError>;

    /// Ask the backend to download a model. `model_id` is not yet url-encoded.
    async fn install_model(&self, model_id: &str) -> Result<Reply<()>, AppError>;

    /// Raw `GET /v1/models` body.
    async fn list_models(&self) -> Result<Reply<Bytes>, AppError>;

    /// Raw `GET /v1/registry` body.
    async fn registry(&self) -> Result<Reply<Bytes>, AppError>;
}
