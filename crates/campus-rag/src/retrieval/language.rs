//! Response language detection

use serde::{Deserialize, Serialize};

use super::router::tokenize;

/// Romanised Hindi words that rarely appear in English questions
const HINGLISH_HINTS: &[&str] = &[
    "kya", "hai", "hain", "kaise", "kab", "kahan", "kyu", "kyun", "kyon", "mujhe", "mera",
    "meri", "mere", "kitna", "kitni", "kitne", "batao", "bataiye", "bataye", "hoga", "hogi",
    "karna", "karni", "chahiye", "nahi", "nahin", "mein", "kaun", "konsa", "konsi", "sakte",
    "sakta", "sakti", "wala", "wali", "abhi", "aaj", "kal", "bhi", "yeh", "woh", "hum",
    "aap", "apna", "apni", "kuch", "liye", "tha", "thi",
];

/// Language the answer should be written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Hinglish,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Hindi => "hindi",
            Self::Hinglish => "hinglish",
        }
    }

    /// Instruction appended to the prompt; English needs none
    pub fn directive(&self) -> Option<&'static str> {
        match self {
            Self::English => None,
            Self::Hindi => Some("Respond in Hindi using Devanagari script."),
            Self::Hinglish => Some(
                "Respond in Hinglish: conversational Hindi written in Roman script, \
                 keeping common English terms as they are.",
            ),
        }
    }

    /// Map a speech recogniser tag such as `hi-IN` or `en-US`
    pub fn from_voice_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "hi" => Some(Self::Hindi),
            "en" => Some(Self::English),
            _ => None,
        }
    }

    /// Detect from the question text
    ///
    /// Any Devanagari letter means Hindi; `hinglish_min_hits` or more romanised
    /// hint words mean Hinglish; anything else is English.
    pub fn detect(text: &str, hinglish_min_hits: usize) -> Self {
        if text.chars().any(is_devanagari) {
            return Self::Hindi;
        }
        let hits = tokenize(text)
            .iter()
            .filter(|word| HINGLISH_HINTS.contains(&word.as_str()))
            .count();
        if hinglish_min_hits > 0 && hits >= hinglish_min_hits {
            Self::Hinglish
        } else {
            Self::English
        }
    }

    /// Voice questions use the recogniser's language when it is known
    pub fn resolve(
        text: &str,
        is_voice: bool,
        voice_language: Option<&str>,
        hinglish_min_hits: usize,
    ) -> Self {
        if is_voice {
            if let Some(language) = voice_language.and_then(Self::from_voice_tag) {
                return language;
            }
        }
        Self::detect(text, hinglish_min_hits)
    }
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c) && !matches!(c, '\u{0964}' | '\u{0965}')
}
