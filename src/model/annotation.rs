//! Annotation overlay: inline metadata items and shared stand-off groups.
//!
//! Metadata attaches to a code or a part either inline ([`Annotations::set`])
//! or through a reference to a stand-off group held in an
//! [`AnnotationStore`]. Several markers may reference the same group; the
//! group lives in the store arena, so a change made through one referent is
//! seen by every other one. Groups are only removed by an explicit
//! [`AnnotationStore::remove_group`] call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Data categories accepted in an `annotatorsRef` value.
pub const DATA_CATEGORIES: &[&str] = &[
    "allowed-characters",
    "directionality",
    "domain",
    "elements-within-text",
    "external-resource",
    "id-value",
    "lang-info",
    "locale-filter",
    "localization-note",
    "localization-quality-issue",
    "localization-quality-rating",
    "mt-confidence",
    "preserve-space",
    "provenance",
    "storage-size",
    "target-pointer",
    "terminology",
    "text-analysis",
    "translate",
];

/// One metadata item, e.g. a quality issue, a term or a provenance record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationItem {
    /// Item kind (used as the lookup key)
    pub kind: String,

    /// Item fields
    #[serde(default)]
    pub fields: BTreeMap<String, String>,

    /// Annotator reference for this item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotator_ref: Option<String>,
}

impl AnnotationItem {
    /// Create an empty item of the given kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Add a field (builder style).
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set the annotator reference (builder style).
    pub fn with_annotator_ref(mut self, iri: impl Into<String>) -> Self {
        self.annotator_ref = Some(iri.into());
        self
    }

    /// Get a field value.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Set a field value, returning the previous one.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(name.into(), value.into())
    }
}

/// Handle to a stand-off group inside an [`AnnotationStore`].
///
/// A handle stays valid until its group is removed; after that it resolves to
/// nothing even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupRef {
    index: u32,
    generation: u32,
}

/// A stand-off group: metadata stored once and referenced by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandoffGroup {
    /// Group identifier (unique within its store)
    pub id: String,

    /// Items of the group, in insertion order
    #[serde(default)]
    pub items: Vec<AnnotationItem>,
}

impl StandoffGroup {
    /// Create an empty group.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            items: Vec::new(),
        }
    }

    /// Add an item (builder style).
    pub fn with_item(mut self, item: AnnotationItem) -> Self {
        self.items.push(item);
        self
    }

    /// First item of the given kind.
    pub fn item(&self, kind: &str) -> Option<&AnnotationItem> {
        self.items.iter().find(|i| i.kind == kind)
    }

    /// First item of the given kind, mutable.
    pub fn item_mut(&mut self, kind: &str) -> Option<&mut AnnotationItem> {
        self.items.iter_mut().find(|i| i.kind == kind)
    }

    /// All items of the given kind.
    pub fn items_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a AnnotationItem> + 'a {
        self.items.iter().filter(move |i| i.kind == kind)
    }
}

/// Annotations attached to one marker (a code) or one container-level node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    inline: BTreeMap<String, AnnotationItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<GroupRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotators_ref: Option<AnnotatorsRef>,
}

impl Annotations {
    /// Create empty annotations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.inline.is_empty() && self.group.is_none() && self.annotators_ref.is_none()
    }

    /// Attach an inline item, replacing any inline item of the same kind.
    pub fn set(&mut self, item: AnnotationItem) -> Option<AnnotationItem> {
        self.inline.insert(item.kind.clone(), item)
    }

    /// Inline item of the given kind.
    pub fn get(&self, kind: &str) -> Option<&AnnotationItem> {
        self.inline.get(kind)
    }

    /// Inline item of the given kind, mutable.
    pub fn get_mut(&mut self, kind: &str) -> Option<&mut AnnotationItem> {
        self.inline.get_mut(kind)
    }

    /// Remove an inline item.
    pub fn remove(&mut self, kind: &str) -> Option<AnnotationItem> {
        self.inline.remove(kind)
    }

    /// Iterate over the inline items.
    pub fn inline_items(&self) -> impl Iterator<Item = &AnnotationItem> {
        self.inline.values()
    }

    /// Referenced stand-off group, if any.
    pub fn group(&self) -> Option<GroupRef> {
        self.group
    }

    /// Reference a stand-off group. Returns the previous reference.
    ///
    /// Passing `None` only drops the reference; the group stays in its store.
    pub fn set_group(&mut self, group: Option<GroupRef>) -> Option<GroupRef> {
        std::mem::replace(&mut self.group, group)
    }

    /// Annotator references declared at this level.
    pub fn annotators_ref(&self) -> Option<&AnnotatorsRef> {
        self.annotators_ref.as_ref()
    }

    /// Set the annotator references declared at this level.
    pub fn set_annotators_ref(&mut self, value: Option<AnnotatorsRef>) {
        self.annotators_ref = value;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    group: Option<StandoffGroup>,
}

/// Arena holding the stand-off groups of one text unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationStore {
    slots: Vec<Slot>,
}

impl AnnotationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live groups.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.group.is_some()).count()
    }

    /// Check if the store holds no group.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a group and return its handle.
    ///
    /// If a live group already has the same id, the new group replaces its
    /// content and the existing handle is returned.
    pub fn add_group(&mut self, group: StandoffGroup) -> GroupRef {
        if let Some(existing) = self.find(&group.id) {
            if let Some(slot) = self.slots.get_mut(existing.index as usize) {
                slot.group = Some(group);
            }
            return existing;
        }
        if let Some((index, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.group.is_none())
        {
            slot.generation += 1;
            slot.group = Some(group);
            return GroupRef {
                index: index as u32,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            group: Some(group),
        });
        GroupRef {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Resolve a handle.
    pub fn get(&self, group: GroupRef) -> Option<&StandoffGroup> {
        self.slots
            .get(group.index as usize)
            .filter(|s| s.generation == group.generation)
            .and_then(|s| s.group.as_ref())
    }

    /// Resolve a handle for mutation.
    pub fn get_mut(&mut self, group: GroupRef) -> Option<&mut StandoffGroup> {
        self.slots
            .get_mut(group.index as usize)
            .filter(|s| s.generation == group.generation)
            .and_then(|s| s.group.as_mut())
    }

    /// Find a live group by its id.
    pub fn find(&self, id: &str) -> Option<GroupRef> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            slot.group
                .as_ref()
                .filter(|g| g.id == id)
                .map(|_| GroupRef {
                    index: index as u32,
                    generation: slot.generation,
                })
        })
    }

    /// Remove a group. Handles to it resolve to nothing afterwards.
    pub fn remove_group(&mut self, group: GroupRef) -> Option<StandoffGroup> {
        let slot = self.slots.get_mut(group.index as usize)?;
        if slot.generation != group.generation {
            return None;
        }
        slot.group.take()
    }

    /// Iterate over the live groups.
    pub fn iter(&self) -> impl Iterator<Item = (GroupRef, &StandoffGroup)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.group.as_ref().map(|g| {
                (
                    GroupRef {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    g,
                )
            })
        })
    }

    /// Look up an item for a marker: inline first, then the referenced group.
    pub fn resolve<'a>(&'a self, annotations: &'a Annotations, kind: &str) -> Option<&'a AnnotationItem> {
        if let Some(item) = annotations.get(kind) {
            return Some(item);
        }
        annotations
            .group()
            .and_then(|g| self.get(g))
            .and_then(|g| g.item(kind))
    }

    /// Mutable lookup with the same precedence as [`resolve`](Self::resolve).
    ///
    /// When the item comes from the group, the change is visible to every
    /// other marker referencing that group.
    pub fn resolve_mut<'a>(
        &'a mut self,
        annotations: &'a mut Annotations,
        kind: &str,
    ) -> Option<&'a mut AnnotationItem> {
        if annotations.inline.contains_key(kind) {
            return annotations.inline.get_mut(kind);
        }
        let group = annotations.group()?;
        self.get_mut(group).and_then(|g| g.item_mut(kind))
    }
}

/// Annotator references: one IRI per data category.
///
/// Values cascade from the document down to the markers; the most specific
/// level that declares a category wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatorsRef {
    map: BTreeMap<String, String>,
}

impl AnnotatorsRef {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a value of the form `"category|iri category|iri"`.
    pub fn parse(data: &str) -> Result<Self> {
        let mut result = Self::new();
        for entry in data.split_whitespace() {
            let (category, iri) = entry
                .split_once('|')
                .ok_or_else(|| Error::InvalidAnnotatorsRef(entry.to_string()))?;
            if !DATA_CATEGORIES.contains(&category) || iri.is_empty() || iri.contains(char::is_whitespace) {
                return Err(Error::InvalidAnnotatorsRef(entry.to_string()));
            }
            result.map.insert(category.to_string(), iri.to_string());
        }
        Ok(result)
    }

    /// Set the IRI for a data category.
    pub fn set(&mut self, category: impl Into<String>, iri: impl Into<String>) {
        self.map.insert(category.into(), iri.into());
    }

    /// IRI for a data category.
    pub fn get(&self, category: &str) -> Option<&str> {
        self.map.get(category).map(String::as_str)
    }

    /// Check if no category is set.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Serialized value (without the attribute name).
    pub fn print(&self) -> String {
        self.map
            .iter()
            .map(|(dc, iri)| format!("{}|{}", dc, iri))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Serialized value holding only entries that differ from `parent`.
    ///
    /// Returns `None` when there is nothing to output.
    pub fn print_differences(&self, parent: Option<&AnnotatorsRef>) -> Option<String> {
        let parts: Vec<String> = self
            .map
            .iter()
            .filter(|(dc, iri)| parent.and_then(|p| p.get(dc)) != Some(iri.as_str()))
            .map(|(dc, iri)| format!("{}|{}", dc, iri))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Merge levels ordered from least to most specific.
    pub fn cascade<'a>(levels: impl IntoIterator<Item = Option<&'a AnnotatorsRef>>) -> AnnotatorsRef {
        let mut merged = AnnotatorsRef::new();
        for level in levels.into_iter().flatten() {
            for (dc, iri) in &level.map {
                merged.map.insert(dc.clone(), iri.clone());
            }
        }
        merged
    }

    /// Effective IRI for one category across levels ordered from least to
    /// most specific.
    pub fn resolve<'a>(
        levels: impl IntoIterator<Item = Option<&'a AnnotatorsRef>>,
        category: &str,
    ) -> Option<&'a str> {
        levels
            .into_iter()
            .flatten()
            .filter_map(|level| level.get(category))
            .last()
    }
}
