//! Events produced by extraction and consumed by writers.

use serde::{Deserialize, Serialize};

use super::resource::{DocumentPart, Ending, StartDocument, StartGroup, StartSubDocument, TextUnit};
use crate::skeleton::Skeleton;

/// Kind of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Start of a document
    StartDocument,
    /// Start of a sub-document
    StartSubDocument,
    /// Start of a group
    StartGroup,
    /// Translatable content
    TextUnit,
    /// Non-translatable content
    DocumentPart,
    /// End of a group
    EndGroup,
    /// End of a sub-document
    EndSubDocument,
    /// End of a document
    EndDocument,
}

/// One step of the extraction stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "resource", rename_all = "snake_case")]
pub enum Event {
    /// Start of a document
    StartDocument(StartDocument),
    /// Start of a sub-document
    StartSubDocument(StartSubDocument),
    /// Start of a group
    StartGroup(StartGroup),
    /// Translatable content
    TextUnit(Box<TextUnit>),
    /// Non-translatable content
    DocumentPart(DocumentPart),
    /// End of a group
    EndGroup(Ending),
    /// End of a sub-document
    EndSubDocument(Ending),
    /// End of a document
    EndDocument(Ending),
}

impl Event {
    /// Kind of the event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StartDocument(_) => EventKind::StartDocument,
            Event::StartSubDocument(_) => EventKind::StartSubDocument,
            Event::StartGroup(_) => EventKind::StartGroup,
            Event::TextUnit(_) => EventKind::TextUnit,
            Event::DocumentPart(_) => EventKind::DocumentPart,
            Event::EndGroup(_) => EventKind::EndGroup,
            Event::EndSubDocument(_) => EventKind::EndSubDocument,
            Event::EndDocument(_) => EventKind::EndDocument,
        }
    }

    /// Id of the resource.
    pub fn id(&self) -> &str {
        match self {
            Event::StartDocument(r) => &r.id,
            Event::StartSubDocument(r) => &r.id,
            Event::StartGroup(r) => &r.id,
            Event::TextUnit(r) => &r.id,
            Event::DocumentPart(r) => &r.id,
            Event::EndGroup(r) | Event::EndSubDocument(r) | Event::EndDocument(r) => &r.id,
        }
    }

    /// Skeleton of the resource.
    pub fn skeleton(&self) -> Option<&Skeleton> {
        match self {
            Event::StartDocument(r) => r.skeleton.as_ref(),
            Event::StartSubDocument(r) => r.skeleton.as_ref(),
            Event::StartGroup(r) => r.skeleton.as_ref(),
            Event::TextUnit(r) => r.skeleton.as_ref(),
            Event::DocumentPart(r) => r.skeleton.as_ref(),
            Event::EndGroup(r) | Event::EndSubDocument(r) | Event::EndDocument(r) => r.skeleton.as_ref(),
        }
    }

    /// Check if this event carries translatable content.
    pub fn has_content(&self) -> bool {
        matches!(self, Event::TextUnit(tu) if !tu.is_empty())
    }

    /// Check if this is a document boundary event.
    pub fn is_document_boundary(&self) -> bool {
        matches!(self, Event::StartDocument(_) | Event::EndDocument(_))
    }

    /// Check if this event opens a level.
    pub fn is_start(&self) -> bool {
        matches!(
            self,
            Event::StartDocument(_) | Event::StartSubDocument(_) | Event::StartGroup(_)
        )
    }

    /// Check if this event closes a level.
    pub fn is_end(&self) -> bool {
        matches!(
            self,
            Event::EndDocument(_) | Event::EndSubDocument(_) | Event::EndGroup(_)
        )
    }

    /// The text unit, if this is a text-unit event.
    pub fn as_text_unit(&self) -> Option<&TextUnit> {
        match self {
            Event::TextUnit(tu) => Some(tu),
            _ => None,
        }
    }

    /// The text unit, mutable.
    pub fn as_text_unit_mut(&mut self) -> Option<&mut TextUnit> {
        match self {
            Event::TextUnit(tu) => Some(tu),
            _ => None,
        }
    }

    /// Check if the resource is only output where referenced.
    pub fn is_referent(&self) -> bool {
        match self {
            Event::TextUnit(tu) => tu.is_referent,
            Event::DocumentPart(dp) => dp.is_referent,
            Event::StartGroup(g) => g.is_referent,
            _ => false,
        }
    }
}

impl From<TextUnit> for Event {
    fn from(tu: TextUnit) -> Self {
        Event::TextUnit(Box::new(tu))
    }
}

impl From<DocumentPart> for Event {
    fn from(dp: DocumentPart) -> Self {
        Event::DocumentPart(dp)
    }
}
