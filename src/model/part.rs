//! Parts of a text unit: segments and ignorables.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::annotation::Annotations;
use super::extension::ExtAttributes;
use super::fragment::Fragment;
use super::locale::LocaleId;
use crate::error::Error;

/// Kind of part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    /// Translatable segment
    Segment,
    /// Content between segments (usually whitespace or inline codes)
    Ignorable,
}

/// Translation state of a segment, ordered from earliest to latest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetState {
    /// Not translated yet
    #[default]
    Initial,
    /// Translated
    Translated,
    /// Reviewed
    Reviewed,
    /// Final
    Final,
}

impl TargetState {
    /// Name used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetState::Initial => "initial",
            TargetState::Translated => "translated",
            TargetState::Reviewed => "reviewed",
            TargetState::Final => "final",
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "initial" => Ok(TargetState::Initial),
            "translated" => Ok(TargetState::Translated),
            "reviewed" => Ok(TargetState::Reviewed),
            "final" => Ok(TargetState::Final),
            _ => Err(Error::InvalidParameter(format!("unknown state: {}", s))),
        }
    }
}

/// What to use when a part has no target for the requested locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTarget {
    /// An empty fragment
    Empty,
    /// A copy of the source
    #[default]
    CopySource,
}

/// One segment or ignorable of a text unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Part kind
    pub kind: PartKind,

    /// Identifier, unique within the container
    pub id: String,

    /// Source content
    pub source: Fragment,

    /// Target content per locale
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub targets: BTreeMap<LocaleId, Fragment>,

    /// Translation state
    #[serde(default)]
    pub state: TargetState,

    /// Tool-specific sub-state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_state: Option<String>,

    /// Whether the part may be merged with its neighbours or split again
    #[serde(default = "default_true")]
    pub can_resegment: bool,

    /// Whether whitespace must be preserved
    #[serde(default)]
    pub preserve_ws: bool,

    /// Extension attributes
    #[serde(default, skip_serializing_if = "ExtAttributes::is_empty")]
    pub ext_attributes: ExtAttributes,

    /// Metadata attached to the part
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

fn default_true() -> bool {
    true
}

impl Part {
    /// Create a part.
    pub fn new(kind: PartKind, id: impl Into<String>, source: Fragment) -> Self {
        Self {
            kind,
            id: id.into(),
            source,
            targets: BTreeMap::new(),
            state: TargetState::default(),
            sub_state: None,
            can_resegment: true,
            preserve_ws: false,
            ext_attributes: ExtAttributes::new(),
            annotations: Annotations::new(),
        }
    }

    /// Create a segment.
    pub fn segment(id: impl Into<String>, source: Fragment) -> Self {
        Self::new(PartKind::Segment, id, source)
    }

    /// Create an ignorable.
    pub fn ignorable(id: impl Into<String>, source: Fragment) -> Self {
        Self::new(PartKind::Ignorable, id, source)
    }

    /// Check if this is a segment.
    pub fn is_segment(&self) -> bool {
        self.kind == PartKind::Segment
    }

    /// Target for a locale, if set.
    pub fn target(&self, locale: &LocaleId) -> Option<&Fragment> {
        self.targets.get(locale)
    }

    /// Check if a target is set for a locale.
    pub fn has_target(&self, locale: &LocaleId) -> bool {
        self.targets.contains_key(locale)
    }

    /// Target for a locale, or the fallback selected by `missing`.
    pub fn target_or(&self, locale: &LocaleId, missing: MissingTarget) -> Cow<'_, Fragment> {
        match (self.targets.get(locale), missing) {
            (Some(target), _) => Cow::Borrowed(target),
            (None, MissingTarget::CopySource) => Cow::Borrowed(&self.source),
            (None, MissingTarget::Empty) => Cow::Owned(Fragment::new()),
        }
    }

    /// Mutable target for a locale, created from the fallback if missing.
    pub fn target_mut_or_create(&mut self, locale: &LocaleId, missing: MissingTarget) -> &mut Fragment {
        let source = &self.source;
        self.targets.entry(locale.clone()).or_insert_with(|| match missing {
            MissingTarget::CopySource => source.clone(),
            MissingTarget::Empty => Fragment::new(),
        })
    }

    /// Set the target for a locale. Returns the previous one.
    pub fn set_target(&mut self, locale: LocaleId, target: Fragment) -> Option<Fragment> {
        self.targets.insert(locale, target)
    }

    /// Remove the target for a locale.
    pub fn remove_target(&mut self, locale: &LocaleId) -> Option<Fragment> {
        self.targets.remove(locale)
    }

    /// Copy of the part with the same metadata and no content.
    pub(crate) fn clone_metadata(&self) -> Part {
        Part {
            kind: self.kind,
            id: self.id.clone(),
            source: Fragment::new(),
            targets: BTreeMap::new(),
            state: self.state,
            sub_state: self.sub_state.clone(),
            can_resegment: self.can_resegment,
            preserve_ws: self.preserve_ws,
            ext_attributes: self.ext_attributes.clone(),
            annotations: self.annotations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_order() {
        assert!(TargetState::Initial < TargetState::Translated);
        assert!(TargetState::Reviewed < TargetState::Final);
        assert_eq!("Reviewed".parse::<TargetState>().unwrap(), TargetState::Reviewed);
        assert!("done".parse::<TargetState>().is_err());
    }

    #[test]
    fn test_missing_target_policy() {
        let fr = LocaleId::new("fr");
        let part = Part::segment("1", Fragment::from_text("Hello").unwrap());
        assert_eq!(part.target_or(&fr, MissingTarget::CopySource).text(), "Hello");
        assert!(part.target_or(&fr, MissingTarget::Empty).is_empty());
        assert!(!part.has_target(&fr));
    }

    #[test]
    fn test_target_mut_or_create() {
        let fr = LocaleId::new("fr");
        let mut part = Part::segment("1", Fragment::from_text("Hello").unwrap());
        part.target_mut_or_create(&fr, MissingTarget::Empty).append_text("Bonjour").unwrap();
        assert_eq!(part.target(&fr).map(|t| t.text()), Some("Bonjour".to_string()));

        let de = LocaleId::new("de");
        part.target_mut_or_create(&de, MissingTarget::CopySource);
        assert_eq!(part.target(&de).map(|t| t.text()), Some("Hello".to_string()));
    }
}
