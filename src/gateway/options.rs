use serde::Serialize;

/// Model id the backend always receives for transcription.
pub const TRANSCRIPTION_MODEL_ID: &str = "whisper-1";

/// Transcription languages the gateway forwards; anything else becomes English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ja,
    Ko,
    Zh,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::En,
        Language::Es,
        Language::Fr,
        Language::De,
        Language::It,
        Language::Pt,
        Language::Ja,
        Language::Ko,
        Language::Zh,
    ];

    pub fn as_code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Pt => "pt",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Zh => "zh",
        }
    }

    /// Missing or unsupported codes fall back to English.
    pub fn parse_or_default(code: Option<&str>) -> Self {
        code.and_then(|code| Self::ALL.into_iter().find(|l| l.as_code() == code))
            .unwrap_or_default()
    }
}

/// Requested accuracy/speed trade-off. Accepted but not forwarded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Fast,
    #[default]
    Standard,
    Accurate,
}

impl QualityTier {
    pub fn parse_or_default(tier: Option<&str>) -> Self {
        match tier {
            Some("fast") => QualityTier::Fast,
            Some("accurate") => QualityTier::Accurate,
            _ => QualityTier::Standard,
        }
    }
}
