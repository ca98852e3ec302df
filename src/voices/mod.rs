pub mod info;

use std::collections::HashSet;

use lazy_static::lazy_static;
use serde::Serialize;

pub use info::{list_voices, VoiceListing};

/// Backend model id for every kokoro voice.
pub const KOKORO_MODEL_ID: &str = "tts-1";
/// Piper model ids are this prefix followed by the voice.
pub const PIPER_MODEL_PREFIX: &str = "speaches-ai/piper-";

pub const DEFAULT_KOKORO_VOICE: &str = "af_nova";
pub const DEFAULT_PIPER_VOICE: &str = "en_US-ryan-medium";

/// Model names the client may send to select the piper family.
const PIPER_MODEL_KEYWORDS: &[&str] = &["tts-1-piper", "piper"];

pub const KOKORO_VOICES: &[&str] = &[
    // American female
    "af_nova",
    "af_sarah",
    "af_bella",
    "af_heart",
    "af_aoede",
    "af_jessica",
    "af_kore",
    "af_nicole",
    "af_river",
    "af_sky",
    "af_alloy",
    // American male
    "am_adam",
    "am_echo",
    "am_liam",
    "am_onyx",
    "am_michael",
    "am_eric",
    "am_fenrir",
    "am_puck",
    "am_santa",
    // British female
    "bf_alice",
    "bf_emma",
    "bf_isabella",
    "bf_lily",
    // British male
    "bm_fable",
    "bm_george",
    "bm_daniel",
    "bm_lewis",
];

pub const PIPER_VOICES: &[&str] = &[
    // en_US ryan
    "en_US-ryan-high",
    "en_US-ryan-low",
    "en_US-ryan-medium",
    // en_US female
    "en_US-amy-low",
    "en_US-amy-medium",
    "en_US-hfc_female-medium",
    "en_US-kathleen-low",
    "en_US-kristin-medium",
    "en_US-ljspeech-high",
    "en_US-ljspeech-medium",
    // en_US male
    "en_US-hfc_male-medium",
    "en_US-lessac-high",
    "en_US-lessac-low",
    "en_US-lessac-medium",
    "en_US-danny-low",
    "en_US-joe-medium",
    "en_US-john-medium",
    "en_US-bryce-medium",
    "en_US-kusal-medium",
    "en_US-norman-medium",
    // en_US multi-speaker
    "en_US-libritts-high",
    "en_US-libritts_r-medium",
    "en_US-arctic-medium",
    "en_US-l2arctic-medium",
    // en_GB
    "en_GB-alan-low",
    "en_GB-alan-medium",
    "en_GB-southern_english_female-low",
    "en_GB-alba-medium",
    "en_GB-aru-medium",
    "en_GB-cori-high",
    "en_GB-cori-medium",
    "en_GB-jenny_dioco-medium",
    "en_GB-northern_english_male-medium",
    "en_GB-semaine-medium",
    "en_GB-vctk-medium",
];

lazy_static! {
    static ref KOKORO_SET: HashSet<&'static str> = KOKORO_VOICES.iter().copied().collect();
    static ref PIPER_SET: HashSet<&'static str> = PIPER_VOICES.iter().copied().collect();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Kokoro,
    Piper,
}

impl ModelFamily {
    /// Unrecognized names fall back to kokoro, never an error.
    pub fn from_model_name(name: &str) -> Self {
        if PIPER_MODEL_KEYWORDS.contains(&name) {
            ModelFamily::Piper
        } else {
            ModelFamily::Kokoro
        }
    }

    pub fn voices(self) -> &'static [&'static str] {
        match self {
            ModelFamily::Kokoro => KOKORO_VOICES,
            ModelFamily::Piper => PIPER_VOICES,
        }
    }

    pub fn supports_voice(self, voice: &str) -> bool {
        match self {
            ModelFamily::Kokoro => KOKORO_SET.contains(voice),
            ModelFamily::Piper => PIPER_SET.contains(voice),
        }
    }

    pub fn default_voice(self) -> &'static str {
        match self {
            ModelFamily::Kokoro => DEFAULT_KOKORO_VOICE,
            ModelFamily::Piper => DEFAULT_PIPER_VOICE,
        }
    }

    /// Whether the backend may be asked to download this family's models on demand.
    /// Kokoro is assumed to ship with the backend.
    pub fn auto_installs(self) -> bool {
        matches!(self, ModelFamily::Piper)
    }

    fn canonical_id(self, voice: &str) -> String {
        match self {
            ModelFamily::Kokoro => KOKORO_MODEL_ID.to_string(),
            ModelFamily::Piper => format!("{}{}", PIPER_MODEL_PREFIX, voice),
        }
    }
}

/// The model identifier actually sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendModelRef {
    pub family: ModelFamily,
    pub canonical_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVoice {
    pub model: BackendModelRef,
    pub voice: String,
}

/// Map a client (model, voice) pair onto backend identifiers.
///
/// This cannot fail: an unknown model is treated as kokoro and an unknown or
/// empty voice is replaced by the family default.
pub fn normalize(model: &str, voice: &str) -> ResolvedVoice {
    let family = ModelFamily::from_model_name(model);
    let voice = if family.supports_voice(voice) {
        voice
    } else {
        family.default_voice()
    };

    ResolvedVoice {
        model: BackendModelRef {
            family,
            canonical_id: family.canonical_id(voice),
        },
        voice: voice.to_string(),
    }
}
