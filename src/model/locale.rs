//! Locale identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized locale identifier (`en-us`, `fr-ca`, `zh-hant-tw`).
///
/// Underscores become hyphens and the tag is lowercased, so `en_US` and
/// `en-US` compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LocaleId(String);

impl LocaleId {
    /// Create a locale identifier from a tag.
    pub fn new(tag: &str) -> Self {
        Self(tag.trim().replace('_', "-").to_ascii_lowercase())
    }

    /// Normalized tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the identifier is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Language subtag.
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or("")
    }

    /// BCP-47 casing: `en-US`, `zh-Hant-TW`.
    pub fn to_bcp47(&self) -> String {
        self.0
            .split('-')
            .enumerate()
            .map(|(i, sub)| match (i, sub.len()) {
                (0, _) => sub.to_string(),
                (_, 2) => sub.to_ascii_uppercase(),
                (_, 4) => {
                    let mut chars = sub.chars();
                    match chars.next() {
                        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                        None => String::new(),
                    }
                }
                _ => sub.to_string(),
            })
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl From<&str> for LocaleId {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for LocaleId {
    fn from(tag: String) -> Self {
        Self::new(&tag)
    }
}

impl From<LocaleId> for String {
    fn from(locale: LocaleId) -> Self {
        locale.0
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(LocaleId::new("en_US"), LocaleId::new("en-us"));
        assert_eq!(LocaleId::new("fr-CA").language(), "fr");
    }

    #[test]
    fn test_bcp47() {
        assert_eq!(LocaleId::new("en_us").to_bcp47(), "en-US");
        assert_eq!(LocaleId::new("zh-hant-tw").to_bcp47(), "zh-Hant-TW");
        assert_eq!(LocaleId::new("de").to_bcp47(), "de");
    }
}
