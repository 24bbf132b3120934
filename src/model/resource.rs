//! Resources carried by events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::annotation::{AnnotationStore, Annotations, AnnotatorsRef};
use super::container::Container;
use super::extension::{ExtAttributes, ExtElement};
use super::locale::LocaleId;
use super::nodes::{GlossEntry, Match, MetadataGroup, Note};
use crate::detect::LineBreak;
use crate::skeleton::Skeleton;

/// Named values of a resource, with optional per-locale target values.
///
/// Typical properties are localizable attribute values (`alt`, `title`) or
/// format settings (`encoding`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    source: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    targets: BTreeMap<LocaleId, BTreeMap<String, String>>,
}

impl Properties {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no property is set.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.targets.is_empty()
    }

    /// Set a source property.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.source.insert(name.into(), value.into());
    }

    /// Source value of a property.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.source.get(name).map(String::as_str)
    }

    /// Set the target value of a property.
    pub fn set_target(&mut self, locale: LocaleId, name: impl Into<String>, value: impl Into<String>) {
        self.targets.entry(locale).or_default().insert(name.into(), value.into());
    }

    /// Target value of a property.
    pub fn get_target(&self, locale: &LocaleId, name: &str) -> Option<&str> {
        self.targets
            .get(locale)
            .and_then(|t| t.get(name))
            .map(String::as_str)
    }

    /// Value for output: the target value if present, else the source value.
    pub fn resolve(&self, name: &str, locale: Option<&LocaleId>) -> Option<&str> {
        locale
            .and_then(|l| self.get_target(l, name))
            .or_else(|| self.get(name))
    }

    /// Names of the source properties.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.source.keys().map(String::as_str)
    }
}

/// Start of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartDocument {
    /// Resource id
    pub id: String,
    /// Document name (usually the input path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Source locale
    pub locale: LocaleId,
    /// Input encoding name
    pub encoding: String,
    /// Whether the input had a byte-order mark
    #[serde(default)]
    pub has_bom: bool,
    /// Line-break convention of the input
    #[serde(default)]
    pub line_break: LineBreak,
    /// Whether the input already holds translations
    #[serde(default)]
    pub multilingual: bool,
    /// MIME type of the input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Configuration id of the filter that produced the events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_id: Option<String>,
    /// Document-level annotator references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotators_ref: Option<AnnotatorsRef>,
    /// Skeleton
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
    /// Properties
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl StartDocument {
    /// Create a start-document resource.
    pub fn new(id: impl Into<String>, locale: LocaleId) -> Self {
        Self {
            id: id.into(),
            locale,
            encoding: "UTF-8".to_string(),
            ..Default::default()
        }
    }
}

/// Start of a sub-document (a file inside a container format).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartSubDocument {
    /// Resource id
    pub id: String,
    /// Sub-document name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Annotator references of this level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotators_ref: Option<AnnotatorsRef>,
    /// Skeleton
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
    /// Properties
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    /// Notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    /// Extension attributes
    #[serde(default, skip_serializing_if = "ExtAttributes::is_empty")]
    pub ext_attributes: ExtAttributes,
    /// Extension elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ext_elements: Vec<ExtElement>,
}

impl StartSubDocument {
    /// Create a start-subdocument resource.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Start of a group of resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartGroup {
    /// Resource id
    pub id: String,
    /// Group name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Group type (format specific)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<String>,
    /// Whether the group is a referent
    #[serde(default)]
    pub is_referent: bool,
    /// Skeleton
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
    /// Properties
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    /// Notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    /// Extension attributes
    #[serde(default, skip_serializing_if = "ExtAttributes::is_empty")]
    pub ext_attributes: ExtAttributes,
    /// Extension elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ext_elements: Vec<ExtElement>,
}

impl StartGroup {
    /// Create a start-group resource.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// End of a group, sub-document or document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ending {
    /// Resource id
    pub id: String,
    /// Skeleton
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
}

impl Ending {
    /// Create an ending resource.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            skeleton: None,
        }
    }

    /// Set the skeleton (builder style).
    pub fn with_skeleton(mut self, skeleton: Skeleton) -> Self {
        self.skeleton = Some(skeleton);
        self
    }
}

/// Non-translatable part of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPart {
    /// Resource id
    pub id: String,
    /// Whether the part is only output where referenced
    #[serde(default)]
    pub is_referent: bool,
    /// Skeleton
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
    /// Properties
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl DocumentPart {
    /// Create a document part with a skeleton.
    pub fn new(id: impl Into<String>, skeleton: Skeleton) -> Self {
        Self {
            id: id.into(),
            skeleton: Some(skeleton),
            ..Default::default()
        }
    }
}

/// Translatable content with its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Resource id
    pub id: String,
    /// Resource name (e.g. a key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unit type (format specific)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
    /// Whether the content is translatable
    #[serde(default = "default_true")]
    pub translatable: bool,
    /// Whether whitespace must be preserved
    #[serde(default)]
    pub preserve_ws: bool,
    /// MIME type of the content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Whether the unit is only output where referenced
    #[serde(default)]
    pub is_referent: bool,
    /// Content
    pub container: Container,
    /// Skeleton
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
    /// Properties
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    /// Notes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    /// Translation candidates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<Match>,
    /// Metadata groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataGroup>,
    /// Glossary entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glossary: Vec<GlossEntry>,
    /// Extension attributes
    #[serde(default, skip_serializing_if = "ExtAttributes::is_empty")]
    pub ext_attributes: ExtAttributes,
    /// Extension elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ext_elements: Vec<ExtElement>,
    /// Unit-level annotations
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
    /// Stand-off annotation groups of the unit
    #[serde(default, skip_serializing_if = "AnnotationStore::is_empty")]
    pub store: AnnotationStore,
}

fn default_true() -> bool {
    true
}

impl TextUnit {
    /// Create a translatable unit with the given content.
    pub fn new(id: impl Into<String>, container: Container) -> Self {
        Self {
            id: id.into(),
            translatable: true,
            container,
            ..Default::default()
        }
    }

    /// Set the skeleton (builder style).
    pub fn with_skeleton(mut self, skeleton: Skeleton) -> Self {
        self.skeleton = Some(skeleton);
        self
    }

    /// Set the name (builder style).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Check if the unit holds no content.
    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }
}
