//! Voice persona selection for speech synthesis.

use std::fmt;
use std::sync::OnceLock;

use cine_models::Genre;
use regex::Regex;

/// Prebuilt provider voices used for performances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePersona {
    /// Harsh, gravelly timbre
    Fenrir,
    /// Light, bright timbre
    Puck,
    /// Detached, measured timbre
    Charon,
    /// Warm dialogue voice
    Kore,
    /// Steady narrator voice
    Orus,
}

impl VoicePersona {
    /// Provider voice name.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoicePersona::Fenrir => "Fenrir",
            VoicePersona::Puck => "Puck",
            VoicePersona::Charon => "Charon",
            VoicePersona::Kore => "Kore",
            VoicePersona::Orus => "Orus",
        }
    }

    /// Pick a voice for `text` in a scene of the given genre.
    ///
    /// Deterministic: Drama and Noir split on whether the text reads as
    /// dialogue, every other genre maps to a single voice.
    pub fn select(genre: Genre, text: &str) -> Self {
        match genre {
            Genre::Horror | Genre::Action => VoicePersona::Fenrir,
            Genre::Comedy => VoicePersona::Puck,
            Genre::SciFi => VoicePersona::Charon,
            Genre::Drama | Genre::Noir => {
                if is_dialogue(text) {
                    VoicePersona::Kore
                } else {
                    VoicePersona::Orus
                }
            }
        }
    }
}

impl fmt::Display for VoicePersona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn speaker_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*[A-Z][A-Z0-9 .'\-]{0,30}:").expect("valid regex"))
}

fn quoted_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"["“][^"”]+["”]"#).expect("valid regex"))
}

/// True if the text contains a quoted line or a `NAME:` speaker prefix.
pub fn is_dialogue(text: &str) -> bool {
    speaker_prefix().is_match(text) || quoted_line().is_match(text)
}
