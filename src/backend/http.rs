use async_trait::async_trait;
use axum::{body::Body, http::StatusCode};
use bytes::Bytes;
use futures_util::{stream, Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};

use super::{Rejection, Reply, SpeachesBackend, SpeechPayload, TranscriptionPayload};
use crate::error::AppError;

/// [`SpeachesBackend`] over HTTP.
///
/// No timeout is set on the client; connection policy belongs to whoever
/// deploys the gateway.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// `base_url` must not end with a slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        request.send().await.map_err(|e| {
            tracing::error!("speaches.ai request failed: {}", e);
            AppError::BackendUnavailable(format!(
                "speaches.ai server is not available. Make sure it's running on {}",
                self.base_url
            ))
        })
    }
}

async fn rejection(response: Response) -> Rejection {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!("speaches.ai responded {}: {}", status, body);
    Rejection { status, body }
}

async fn read_body(response: Response) -> Result<Bytes, AppError> {
    response.bytes().await.map_err(|e| {
        AppError::MalformedBackendResponse(format!("failed to read backend response: {}", e))
    })
}

/// Url-encode a model id for use as a single path segment.
pub fn encode_model_id(model_id: &str) -> String {
    url::form_urlencoded::byte_serialize(model_id.as_bytes()).collect()
}

fn transcription_form(payload: &TranscriptionPayload) -> Form {
    let file = Part::stream_with_length(payload.audio.clone(), payload.audio.len() as u64)
        .file_name(payload.filename.clone());

    Form::new()
        .part("file", file)
        .text("language", payload.language.clone())
        .text("model", payload.model.clone())
}

/// Dropped with `finished` unset when the client goes away mid-copy.
struct CopyGuard {
    chunks: usize,
    finished: bool,
}

impl Drop for CopyGuard {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                "Client disconnected after {} audio chunks; closing backend stream",
                self.chunks
            );
        }
    }
}

/// Relay backend audio, logging whichever side ends the copy early.
fn watch_audio_copy<S, E>(audio: S) -> impl Stream<Item = Result<Bytes, E>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let guard = CopyGuard {
        chunks: 0,
        finished: false,
    };

    stream::unfold((Box::pin(audio), guard), |(mut audio, mut guard)| async move {
        match audio.next().await {
            Some(Ok(chunk)) => {
                guard.chunks += 1;
                Some((Ok(chunk), (audio, guard)))
            }
            Some(Err(e)) => {
                tracing::warn!("Audio stream from backend interrupted: {}", e);
                guard.finished = true;
                Some((Err(e), (audio, guard)))
            }
            None => {
                guard.finished = true;
                None
            }
        }
    })
}

#[async_trait]
impl SpeachesBackend for HttpBackend {
    async fn speech(&self, payload: &SpeechPayload) -> Result<Reply<Body>, AppError> {
        let url = self.endpoint("/v1/audio/speech");
        tracing::debug!(
            "Speech request: model={}, voice={}, input_len={}",
            payload.model,
            payload.voice,
            payload.input.len()
        );

        let response = self.send(self.client.post(&url).json(payload)).await?;
        if response.status() != StatusCode::OK {
            return Ok(Reply::Rejected(rejection(response).await));
        }

        Ok(Reply::Accepted(Body::from_stream(watch_audio_copy(
            response.bytes_stream(),
        ))))
    }

    async fn transcribe(&self, payload: &TranscriptionPayload) -> Result<Reply<Bytes>, AppError> {
        let url = self.endpoint("/v1/audio/transcriptions");
        tracing::debug!(
            "Transcription request: {} bytes, language={}, model={}",
            payload.audio.len(),
            payload.language,
            payload.model
        );

        // A multipart body is consumed on send, so every attempt gets a fresh one.
        let request = self.client.post(&url).multipart(transcription_form(payload));
        let response = self.send(request).await?;
        if response.status() != StatusCode::OK {
            return Ok(Reply::Rejected(rejection(response).await));
        }

        Ok(Reply::Accepted(read_body(response).await?))
    }

    async fn install_model(&self, model_id: &str) -> Result<Reply<()>, AppError> {
        let url = self.endpoint(&format!("/v1/models/{}", encode_model_id(model_id)));
        tracing::debug!("Install request: {}", url);

        let response = self.send(self.client.post(&url)).await?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(Reply::Accepted(())),
            _ => Ok(Reply::Rejected(rejection(response).await)),
        }
    }

    async fn list_models(&self) -> Result<Reply<Bytes>, AppError> {
        let response = self.send(self.client.get(self.endpoint("/v1/models"))).await?;
        if response.status() != StatusCode::OK {
            return Ok(Reply::Rejected(rejection(response).await));
        }
        Ok(Reply::Accepted(read_body(response).await?))
    }

    async fn registry(&self) -> Result<Reply<Bytes>, AppError> {
        let response = self.send(self.client.get(self.endpoint("/v1/registry"))).await?;
        if response.status() != StatusCode::OK {
            return Ok(Reply::Rejected(rejection(response).await));
        }
        Ok(Reply::Accepted(read_body(response).await?))
    }
}
