use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::ModelFamily;

lazy_static! {
    static ref PIPER_VOICE_REGEX: Regex = Regex::new(
        r"(?x)
        ^(?P<lang>[a-z]{2}_[A-Z]{2})-   # en_US
        (?P<speaker>[a-z0-9_]+)-        # hfc_female
        (?P<quality>x_low|low|medium|high)$
        "
    )
    .unwrap();
    static ref KOKORO_VOICE_REGEX: Regex = Regex::new(r"^(?P<accent>[ab])[fm]_(?P<speaker>[a-z]+)$").unwrap();
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoiceListing {
    pub kokoro: Vec<VoiceInfo>,
    pub piper: Vec<VoiceInfo>,
}

pub fn list_voices() -> VoiceListing {
    VoiceListing {
        kokoro: describe_family(ModelFamily::Kokoro),
        piper: describe_family(ModelFamily::Piper),
    }
}

fn describe_family(family: ModelFamily) -> Vec<VoiceInfo> {
    family
        .voices()
        .iter()
        .map(|id| describe(family, id))
        .collect()
}

/// Derive display info from a voice id, e.g. en_GB-alba-medium -> Alba, en_GB, medium.
pub fn describe(family: ModelFamily, id: &str) -> VoiceInfo {
    let parsed = match family {
        ModelFamily::Piper => PIPER_VOICE_REGEX.captures(id).map(|cap| {
            (
                cap["speaker"].to_string(),
                cap["lang"].to_string(),
                Some(cap["quality"].to_string()),
            )
        }),
        ModelFamily::Kokoro => KOKORO_VOICE_REGEX.captures(id).map(|cap| {
            let language = if &cap["accent"] == "b" { "en_GB" } else { "en_US" };
            (cap["speaker"].to_string(), language.to_string(), None)
        }),
    };

    match parsed {
        Some((speaker, language, quality)) => VoiceInfo {
            id: id.to_string(),
            name: title_case(&speaker.replace('_', " ")),
            language,
            quality,
        },
        None => VoiceInfo {
            id: id.to_string(),
            name: id.to_string(),
            language: "en".to_string(),
            quality: None,
        },
    }
}

/// Capitalize the first letter of each whitespace-separated word.
pub(crate) fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
