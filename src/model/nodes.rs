//! Auxiliary nodes of a text unit: notes, matches, metadata and glossary.

use serde::{Deserialize, Serialize};

use super::extension::{ExtAttributes, ExtElement};
use super::fragment::Fragment;

/// Which content a note or metadata group applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliesTo {
    /// The source
    Source,
    /// The target
    Target,
}

impl AppliesTo {
    /// Name used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppliesTo::Source => "source",
            AppliesTo::Target => "target",
        }
    }
}

/// A comment for translators or reviewers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Note identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Note text
    pub text: String,
    /// Content the note applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<AppliesTo>,
    /// Category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Priority from 1 (highest) to 10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    /// Extension attributes
    #[serde(default, skip_serializing_if = "ExtAttributes::is_empty")]
    pub ext_attributes: ExtAttributes,
}

impl Note {
    /// Create a note.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// One entry of a metadata group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEntry {
    /// Key
    pub key: String,
    /// Value
    pub value: String,
}

/// Named key/value metadata, possibly nested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataGroup {
    /// Group identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Content the group applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<AppliesTo>,
    /// Entries in order
    #[serde(default)]
    pub entries: Vec<MetaEntry>,
    /// Nested groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<MetadataGroup>,
}

impl MetadataGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder style).
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push(MetaEntry {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Value of the first entry with the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|e| e.key == key).map(|e| e.value.as_str())
    }
}

/// A translation candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Match identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Similarity between the candidate source and the unit source (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// Quality of the candidate (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_quality: Option<f64>,
    /// Tool or resource the candidate comes from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Match type (e.g. "tm", "mt")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<String>,
    /// Reference to the segment the candidate is for (`#id`)
    pub ref_segment: String,
    /// Candidate source
    pub source: Fragment,
    /// Candidate target
    pub target: Fragment,
    /// Metadata
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataGroup>,
    /// Extension attributes
    #[serde(default, skip_serializing_if = "ExtAttributes::is_empty")]
    pub ext_attributes: ExtAttributes,
    /// Extension elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ext_elements: Vec<ExtElement>,
}

impl Match {
    /// Create a candidate for a segment.
    pub fn new(ref_segment: impl Into<String>, source: Fragment, target: Fragment) -> Self {
        Self {
            ref_segment: ref_segment.into(),
            source,
            target,
            ..Default::default()
        }
    }

    /// Set the similarity (builder style).
    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.similarity = Some(similarity);
        self
    }
}

/// A glossary entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossEntry {
    /// Entry identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Reference to the span the entry applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The term
    pub term: String,
    /// Origin of the term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_source: Option<String>,
    /// Definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    /// Translations of the term
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<String>,
    /// Extension attributes
    #[serde(default, skip_serializing_if = "ExtAttributes::is_empty")]
    pub ext_attributes: ExtAttributes,
    /// Extension elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ext_elements: Vec<ExtElement>,
}

impl GlossEntry {
    /// Create an entry for a term.
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    /// Add a translation (builder style).
    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.translations.push(translation.into());
        self
    }
}
