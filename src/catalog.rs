//! Installed-model listing, registry browsing and explicit installs.

use serde::{Deserialize, Serialize};

use crate::backend::{Reply, SpeachesBackend};
use crate::error::AppError;
use crate::voices::info::title_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Tts,
    Stt,
}

impl ModelKind {
    /// Guess the kind from an id; anything not obviously speech-to-text is TTS.
    pub fn infer(model_id: &str) -> Self {
        if ["whisper", "speech", "transcription"]
            .iter()
            .any(|needle| model_id.contains(needle))
        {
            ModelKind::Stt
        } else {
            ModelKind::Tts
        }
    }

    fn parse(kind: &str) -> Option<Self> {
        match kind {
            "tts" => Some(ModelKind::Tts),
            "stt" => Some(ModelKind::Stt),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    owned_by: Option<String>,
}

#[derive(Deserialize)]
struct RegistryList {
    #[serde(default)]
    data: Vec<RegistryEntry>,
}

#[derive(Deserialize)]
struct RegistryEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InstalledModel {
    pub id: String,
    pub name: String,
    pub installed: bool,
    #[serde(rename = "type")]
    pub owned_by: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct InstalledModels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tts: Vec<InstalledModel>,
    pub stt: Vec<InstalledModel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryModel {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ModelKind,
}

#[derive(Debug, Serialize)]
pub struct RegistryListing {
    pub models: Vec<RegistryModel>,
    pub installed: Vec<String>,
}

/// Models offered when the backend registry cannot be read.
const FALLBACK_REGISTRY: &[(&str, &str, &str, ModelKind)] = &[
    (
        "tts-1",
        "Kokoro (Neural TTS)",
        "High-quality neural text-to-speech synthesis",
        ModelKind::Tts,
    ),
    (
        "speaches-ai/piper-en_US-ryan-high",
        "Piper - Ryan (High Quality)",
        "Fast, high-quality TTS with Ryan voice",
        ModelKind::Tts,
    ),
    (
        "speaches-ai/piper-en_US-ryan-medium",
        "Piper - Ryan (Medium Quality)",
        "Fast TTS with Ryan voice - balanced quality and speed",
        ModelKind::Tts,
    ),
    (
        "speaches-ai/piper-en_US-ryan-low",
        "Piper - Ryan (Low Latency)",
        "Fast TTS with Ryan voice - optimized for speed",
        ModelKind::Tts,
    ),
    (
        "speaches-ai/piper-en_US-amy-medium",
        "Piper - Amy (Female Voice)",
        "TTS with female voice - Amy variant",
        ModelKind::Tts,
    ),
    (
        "speaches-ai/piper-en_US-hfc_female-medium",
        "Piper - HFC Female (Female Voice)",
        "High-quality female voice TTS",
        ModelKind::Tts,
    ),
    (
        "speaches-ai/piper-en_US-lessac-high",
        "Piper - Lessac (High Quality)",
        "High-quality male voice TTS",
        ModelKind::Tts,
    ),
    (
        "whisper-1",
        "Whisper v1 (Speech to Text)",
        "OpenAI's Whisper model for accurate speech transcription",
        ModelKind::Stt,
    ),
];

/// Human readable name for a backend model id.
pub fn format_model_name(model_id: &str) -> String {
    let name = model_id.strip_prefix('/').unwrap_or(model_id);

    match name {
        "tts-1" => "Kokoro (Neural TTS)".to_string(),
        "speaches-ai/piper-en_US-ryan-medium"
        | "speaches-ai/piper-en_US-ryan-high"
        | "speaches-ai/piper-en_US-ryan-low" => "Piper - Ryan (TTS)".to_string(),
        "whisper-1" => "Whisper v1 (Speech to Text)".to_string(),
        _ => title_case(&name.replace(['_', '-'], " ")),
    }
}

async fn installed_entries(backend: &dyn SpeachesBackend) -> Result<Vec<ModelEntry>, AppError> {
    match backend.list_models().await? {
        Reply::Accepted(body) => match serde_json::from_slice::<ModelList>(&body) {
            Ok(list) => Ok(list.data),
            Err(e) => {
                tracing::warn!("Could not decode installed model list: {}", e);
                Ok(Vec::new())
            }
        },
        Reply::Rejected(rejection) => {
            tracing::warn!("Listing installed models returned {}", rejection.status);
            Ok(Vec::new())
        }
    }
}

/// Installed models split by kind. Only an unreachable backend is an error.
pub async fn installed_models(backend: &dyn SpeachesBackend) -> Result<InstalledModels, AppError> {
    let mut models = InstalledModels::default();

    for entry in installed_entries(backend).await? {
        let kind = ModelKind::infer(&entry.id);
        let model = InstalledModel {
            name: format_model_name(&entry.id),
            id: entry.id,
            installed: true,
            owned_by: entry.owned_by,
        };
        match kind {
            ModelKind::Tts => models.tts.push(model),
            ModelKind::Stt => models.stt.push(model),
        }
    }

    Ok(models)
}

/// Registry models plus the ids already installed. Never fails; falls back to
/// a fixed list when the registry is unavailable.
pub async fn registry(backend: &dyn SpeachesBackend) -> RegistryListing {
    let mut installed: Vec<String> = installed_entries(backend)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    installed.sort();
    installed.dedup();

    let mut models = match backend.registry().await {
        Ok(Reply::Accepted(body)) => match serde_json::from_slice::<RegistryList>(&body) {
            Ok(list) => list.data.into_iter().map(registry_model).collect(),
            Err(e) => {
                tracing::warn!("Could not decode model registry: {}", e);
                Vec::new()
            }
        },
        Ok(Reply::Rejected(rejection)) => {
            tracing::warn!("Model registry returned {}", rejection.status);
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("Model registry unavailable: {}", e);
            Vec::new()
        }
    };

    if models.is_empty() {
        models = fallback_registry();
    }

    RegistryListing { models, installed }
}

fn registry_model(entry: RegistryEntry) -> RegistryModel {
    let kind = entry
        .kind
        .as_deref()
        .and_then(ModelKind::parse)
        .unwrap_or_else(|| ModelKind::infer(&entry.id));

    RegistryModel {
        id: entry.id,
        name: entry.name.unwrap_or_default(),
        description: entry.description.unwrap_or_default(),
        kind,
    }
}

fn fallback_registry() -> Vec<RegistryModel> {
    FALLBACK_REGISTRY
        .iter()
        .map(|(id, name, description, kind)| RegistryModel {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            kind: *kind,
        })
        .collect()
}

/// Explicit, user-requested install. Unlike the automatic install before a
/// retry, the outcome is reported.
pub async fn install(backend: &dyn SpeachesBackend, model_id: &str) -> Result<(), AppError> {
    let model_id = model_id.trim();
    if model_id.is_empty() {
        return Err(AppError::InvalidInput("model_id is required".into()));
    }

    tracing::info!("Installing model {}", model_id);
    match backend.install_model(model_id).await? {
        Reply::Accepted(()) => Ok(()),
        Reply::Rejected(rejection) => Err(AppError::BackendError {
            status: rejection.status.as_u16(),
            message: format!("Failed to install model: {}", rejection.body),
        }),
    }
}
