//! Heuristic language classification.
//!
//! Ordered character-class tests, first match wins:
//! kana → CJK ideographs → Spanish → French → German → English.
//! Kana must be checked before ideographs, otherwise Japanese text that
//! contains kanji would be labelled Chinese.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Languages the classifier can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    #[default]
    En,
    Zh,
    Ja,
    Es,
    Fr,
    De,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 6] = [
        LanguageCode::En,
        LanguageCode::Zh,
        LanguageCode::Ja,
        LanguageCode::Es,
        LanguageCode::Fr,
        LanguageCode::De,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
            Self::Ja => "ja",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::De => "de",
        }
    }

    /// English display name, used in prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Zh => "Chinese",
            Self::Ja => "Japanese",
            Self::Es => "Spanish",
            Self::Fr => "French",
            Self::De => "German",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        LanguageCode::ALL
            .into_iter()
            .find(|l| l.as_str() == code)
            .ok_or_else(|| format!("unknown language code: {s}"))
    }
}

static KANA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{3040}-\x{309F}\x{30A0}-\x{30FF}]").unwrap());
static CJK_IDEOGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{4E00}-\x{9FFF}]").unwrap());
static SPANISH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[áéíóúüñ¿¡]").unwrap());
static FRENCH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[àâçéèêëîïôùûüÿ]").unwrap());
static GERMAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[äöüß]").unwrap());

/// Broader range used for page-level detection: CJK punctuation, kana,
/// full-width forms and ideographs.
static JAPANESE_PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\x{3000}-\x{303F}\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{FF00}-\x{FF9F}\x{4E00}-\x{9FAF}]",
    )
    .unwrap()
});

/// Classify `text` into one of the fixed language codes. Total and deterministic.
pub fn classify(text: &str) -> LanguageCode {
    let rules: [(&Regex, LanguageCode); 5] = [
        (&KANA, LanguageCode::Ja),
        (&CJK_IDEOGRAPH, LanguageCode::Zh),
        (&SPANISH, LanguageCode::Es),
        (&FRENCH, LanguageCode::Fr),
        (&GERMAN, LanguageCode::De),
    ];

    for (pattern, code) in rules {
        if pattern.is_match(text) {
            debug!(language = %code, "Detected language from character class");
            return code;
        }
    }
    LanguageCode::En
}

/// Page-level check: does any of the given texts carry Japanese-context script?
///
/// Callers pass the whole visible page text plus subject and URL metadata.
pub fn has_japanese_context<'a, I>(texts: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    texts.into_iter().any(|t| JAPANESE_PAGE.is_match(t))
}
