use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::handlers;
use crate::gateway::Gateway;

/// Largest accepted audio upload.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub struct AppState {
    pub gateway: Gateway,
}

pub fn create_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/tts", post(handlers::tts))
        .route(
            "/stt",
            post(handlers::stt).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/voices", get(handlers::list_voices))
        .route("/models", get(handlers::list_models))
        .route("/models/registry", get(handlers::registry))
        .route("/models/install", post(handlers::install_model))
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(static_dir).append_index_html_on_directories(true))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::tests::{Call, FakeBackend, Script};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(backend: Arc<FakeBackend>) -> Router {
        let state = Arc::new(AppState {
            gateway: Gateway::new(backend),
        });
        create_router(state, Path::new("static"))
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_post(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, filename, content) in parts {
            body.push_str("--XBOUNDARY\r\n");
            match filename {
                Some(filename) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: audio/wav\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str("--XBOUNDARY--\r\n");

        Request::builder()
            .method("POST")
            .uri("/api/stt")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn tts_streams_audio_with_headers() {
        let backend = FakeBackend::new(vec![Script::Ok(b"ID3")]);

        let response = app(backend)
            .oneshot(json_post(
                "/api/tts",
                serde_json::json!({"text": "Hello world", "voice": "am_adam"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "inline");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ID3");
    }

    #[tokio::test]
    async fn tts_missing_text_is_bad_request() {
        let backend = FakeBackend::new(vec![]);

        let response = app(backend.clone())
            .oneshot(json_post("/api/tts", serde_json::json!({"voice": "af_nova"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "INVALID_INPUT");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn tts_forwards_backend_status_and_body() {
        let backend = FakeBackend::new(vec![Script::Reject(422, "bad voice")]);

        let response = app(backend)
            .oneshot(json_post("/api/tts", serde_json::json!({"text": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json_body(response).await["error"],
            "speaches.ai server error: bad voice"
        );
    }

    #[tokio::test]
    async fn tts_unreachable_backend_is_503() {
        let backend = FakeBackend::new(vec![Script::Down]);

        let response = app(backend)
            .oneshot(json_post("/api/tts", serde_json::json!({"text": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn stt_returns_transcript() {
        let backend = FakeBackend::new(vec![Script::Ok(br#"{"text":"hallo welt"}"#)]);

        let response = app(backend.clone())
            .oneshot(multipart_post(&[
                ("audio", Some("clip.wav"), "RIFF"),
                ("language", None, "de"),
                ("model", None, "accurate"),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["text"], "hallo welt");
        match &backend.calls()[0] {
            Call::Transcribe(payload) => {
                assert_eq!(&payload.audio[..], b"RIFF");
                assert_eq!(payload.filename, "clip.wav");
                assert_eq!(payload.language, "de");
                assert_eq!(payload.model, "whisper-1");
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stt_without_audio_is_bad_request() {
        let backend = FakeBackend::new(vec![]);

        let response = app(backend.clone())
            .oneshot(multipart_post(&[("language", None, "en")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn models_unreachable_returns_empty_lists() {
        let backend = FakeBackend::new(vec![Script::Down]);

        let response = app(backend)
            .oneshot(Request::get("/api/models").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
        assert_eq!(body["tts"], serde_json::json!([]));
        assert_eq!(body["stt"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn install_endpoint_reports_success() {
        let backend = FakeBackend::new(vec![Script::Ok(b"")]);

        let response = app(backend.clone())
            .oneshot(json_post(
                "/api/models/install",
                serde_json::json!({"model_id": "whisper-1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["success"], true);
        assert_eq!(backend.calls(), vec![Call::Install("whisper-1".into())]);
    }

    #[tokio::test]
    async fn voices_lists_both_families() {
        let response = app(FakeBackend::new(vec![]))
            .oneshot(Request::get("/api/voices").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["kokoro"][0]["id"], "af_nova");
        assert_eq!(body["piper"][0]["quality"], "high");
    }

    #[tokio::test]
    async fn health_reports_version() {
        let response = app(FakeBackend::new(vec![]))
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn tts_body_that_is_not_json_gets_json_error() {
        let backend = FakeBackend::new(vec![]);
        let request = Request::builder()
            .method("POST")
            .uri("/api/tts")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();

        let response = app(backend.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(json_body(response).await["code"], "INVALID_INPUT");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn tts_without_content_type_is_bad_request() {
        let backend = FakeBackend::new(vec![]);
        let request = Request::builder()
            .method("POST")
            .uri("/api/tts")
            .body(Body::from(r#"{"text":"Hello"}"#))
            .unwrap();

        let response = app(backend.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "INVALID_INPUT");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn stt_without_multipart_body_gets_json_error() {
        let backend = FakeBackend::new(vec![]);
        let request = Request::builder()
            .method("POST")
            .uri("/api/stt")
            .body(Body::empty())
            .unwrap();

        let response = app(backend.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "INVALID_INPUT");
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn stt_truncated_multipart_gets_json_error() {
        let backend = FakeBackend::new(vec![]);
        let request = Request::builder()
            .method("POST")
            .uri("/api/stt")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(
                "--XBOUNDARY\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"a.wav\"\r\n\r\nRIFF",
            ))
            .unwrap();

        let response = app(backend.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "INVALID_INPUT");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn install_with_malformed_json_is_bad_request() {
        let backend = FakeBackend::new(vec![]);
        let request = Request::builder()
            .method("POST")
            .uri("/api/models/install")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"model_id\":"))
            .unwrap();

        let response = app(backend.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "INVALID_INPUT");
        assert!(backend.calls().is_empty());
    }
}
