//! Detects English/Telugu code-mixed messages from a marker-word list.
//!
//! Markers match whole words only, so "undi" fires on "baaga undi" but not on
//! "funding". Multi-word markers match as a phrase.

/// Decides whether a message is written in the regional code-mixed register.
pub trait LocaleDetector: Send + Sync {
    fn is_regional_mix(&self, text: &str) -> bool;
}

pub struct KeywordLocaleDetector {
    markers: Vec<String>,
}

impl KeywordLocaleDetector {
    pub fn new(markers: &[String]) -> Self {
        Self {
            markers: markers
                .iter()
                .map(|m| padded_words(m))
                .filter(|m| !m.trim().is_empty())
                .collect(),
        }
    }
}

/// Lowercase words separated by single spaces, padded with a space on each
/// side so a phrase lookup of `" {marker} "` only hits word boundaries.
fn padded_words(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();
    format!(" {} ", words.join(" "))
}

impl LocaleDetector for KeywordLocaleDetector {
    fn is_regional_mix(&self, text: &str) -> bool {
        let text = padded_words(text);
        self.markers.iter().any(|m| text.contains(m.as_str()))
    }
}
